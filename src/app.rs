use std::sync::Arc;

use cgmath::{Vector3, Zero};
use log::{error, info, warn};
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::{DeviceEvent, DeviceId, ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes, WindowId},
};

use crate::config::SceneConfig;
use crate::error::SceneError;
use crate::gfx::{
    camera::{CameraController, CameraManager, OrbitCamera},
    geometry::typeface::{FontLoader, PendingFont},
    RenderEngine,
};
use crate::scene::{FrameClock, SceneState};
use crate::ui::{parameter_panel, UiManager};

/// The windowed demo: scene state, camera, renderer and control panel
pub struct TypescapeApp {
    event_loop: Option<EventLoop<()>>,
    app_state: AppState,
}

struct AppState {
    config: SceneConfig,
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    ui_manager: Option<UiManager>,
    cameras: CameraManager,
    scene: SceneState,
    font: Option<PendingFont>,
    clock: FrameClock,
    fatal: Option<SceneError>,
}

impl TypescapeApp {
    pub fn new(config: SceneConfig) -> Result<Self, SceneError> {
        let event_loop = EventLoop::new()?;

        let aspect = config.window.width.max(1) as f32 / config.window.height.max(1) as f32;
        let mut camera = OrbitCamera::new(config.camera.distance, 0.0, 0.0, Vector3::zero(), aspect);
        camera.set_fov(config.camera.fov_degrees);
        let controller =
            CameraController::new(0.005, 0.1).with_damping(config.camera.damping_factor);

        let scene = config.scene_builder().build();

        Ok(Self {
            event_loop: Some(event_loop),
            app_state: AppState {
                config,
                window: None,
                render_engine: None,
                ui_manager: None,
                cameras: CameraManager::new(camera, controller),
                scene,
                font: None,
                clock: FrameClock::new(),
                fatal: None,
            },
        })
    }

    /// Runs until the window closes; setup failures surface here
    pub fn run(mut self) -> Result<(), SceneError> {
        let Some(event_loop) = self.event_loop.take() else {
            return Ok(());
        };
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop.run_app(&mut self.app_state)?;

        match self.app_state.fatal.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl AppState {
    fn fail(&mut self, event_loop: &ActiveEventLoop, err: SceneError) {
        error!("{err}");
        self.fatal = Some(err);
        event_loop.exit();
    }

    fn poll_font(&mut self) {
        let Some(pending) = self.font.as_mut() else {
            return;
        };
        if let Some(result) = pending.poll() {
            self.scene.font_loaded(result);
            self.font = None;
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attributes = WindowAttributes::default()
            .with_title(self.config.window.title.clone())
            .with_inner_size(LogicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ))
            .with_transparent(true);
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, e.into()),
        };

        let PhysicalSize { width, height } = window.inner_size();
        let renderer = match pollster::block_on(RenderEngine::new(window.clone(), width, height))
        {
            Ok(renderer) => renderer,
            Err(e) => return self.fail(event_loop, e.into()),
        };

        self.cameras.resize(width, height);
        self.ui_manager = Some(UiManager::new(
            renderer.device(),
            renderer.queue(),
            renderer.surface_format(),
            &window,
        ));
        self.render_engine = Some(renderer);
        self.window = Some(window);

        // Shapes appear right away; text follows once the typeface arrives
        self.scene.populate();
        info!("Loading typeface from {}", self.config.font.path.display());
        self.font = Some(FontLoader::load(self.config.font.path.clone()));
        self.scene.start();

        let intro = &self.config.camera.intro;
        if intro.enabled {
            self.cameras
                .start_intro(intro.offset(), intro.duration(), intro.easing);
        }
        self.clock = FrameClock::new();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let (Some(render_engine), Some(window)) = (self.render_engine.as_mut(), self.window.as_ref())
        else {
            return;
        };

        if let Some(ui_manager) = self.ui_manager.as_mut() {
            if ui_manager.handle_window_event(window, window_id, &event) {
                window.request_redraw();
                return;
            }
        }

        match event {
            WindowEvent::KeyboardInput { event: key_event, .. } => {
                if let KeyEvent {
                    physical_key: PhysicalKey::Code(KeyCode::Escape),
                    state: ElementState::Pressed,
                    ..
                } = key_event
                {
                    event_loop.exit();
                    return;
                }
                self.cameras.process_keyboard_event(&key_event);
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                self.cameras.resize(width, height);
                render_engine.resize(width, height);
                if let Some(ui_manager) = self.ui_manager.as_mut() {
                    ui_manager.update_display_size(width, height);
                }
            }
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                let window = window.clone();
                self.poll_font();

                let frame = self.clock.tick();
                self.cameras.update(frame.delta);
                let Some(render_engine) = self.render_engine.as_mut() else {
                    return;
                };
                render_engine.update(self.cameras.uniform());
                self.scene.tick(frame.elapsed);

                let result = match self.ui_manager.as_mut() {
                    Some(ui_manager) => {
                        // Widgets edit the scene before the graph is drawn
                        let scene = &mut self.scene;
                        ui_manager.build_frame(&window, |ui| parameter_panel(ui, scene));
                        render_engine.render_frame_with_ui(
                            self.scene.graph(),
                            |device, queue, encoder, target| {
                                ui_manager.render_overlay(device, queue, encoder, target);
                            },
                        )
                    }
                    None => render_engine.render_frame_simple(self.scene.graph()),
                };
                if let Err(e) = result {
                    self.fail(event_loop, e.into());
                }
            }
            _ => (),
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        if self.window.is_none() {
            return;
        }
        if let Some(ui_manager) = self.ui_manager.as_ref() {
            if ui_manager.captures_pointer() {
                return;
            }
        }
        self.cameras.process_event(&event);
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(pending) = &self.font {
            if !pending.is_delivered() {
                warn!("Exiting before the typeface finished loading");
            }
        }
        info!("Shutting down");
    }
}
