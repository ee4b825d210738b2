//! Dear ImGui integration over winit and wgpu

use std::time::Instant;

use imgui::{Context, FontConfig, FontSource, MouseCursor};
use imgui_wgpu::{Renderer, RendererConfig};
use imgui_winit_support::{HiDpiMode, WinitPlatform};
use log::{debug, warn};
use wgpu::{CommandEncoder, Device, Queue, TextureFormat, TextureView};
use winit::{
    event::{Event, WindowEvent},
    window::{Window, WindowId},
};

const FONT_SIZE_PIXELS: f32 = 18.0;

/// Owns the imgui context and its platform and renderer backends
pub struct UiManager {
    context: Context,
    platform: WinitPlatform,
    renderer: Renderer,
    last_frame: Instant,
    last_cursor: Option<MouseCursor>,
    frame_built: bool,
}

fn create_context(window: &Window) -> (Context, WinitPlatform) {
    let mut context = Context::create();
    // Panel layout is not persisted between runs
    context.set_ini_filename(None);

    let mut platform = WinitPlatform::new(&mut context);
    platform.attach_window(context.io_mut(), window, HiDpiMode::Locked(1.0));

    context.fonts().add_font(&[FontSource::DefaultFontData {
        config: Some(FontConfig {
            oversample_h: 1,
            pixel_snap_h: true,
            size_pixels: FONT_SIZE_PIXELS,
            ..Default::default()
        }),
    }]);
    (context, platform)
}

impl UiManager {
    /// DPI is locked to 1.0 and the display size tracks the window in
    /// physical pixels.
    pub fn new(device: &Device, queue: &Queue, surface_format: TextureFormat, window: &Window) -> Self {
        let (mut context, platform) = create_context(window);
        let renderer = Renderer::new(
            &mut context,
            device,
            queue,
            RendererConfig {
                texture_format: surface_format,
                ..Default::default()
            },
        );

        let size = window.inner_size();
        let mut manager = Self {
            context,
            platform,
            renderer,
            last_frame: Instant::now(),
            last_cursor: None,
            frame_built: false,
        };
        manager.update_display_size(size.width, size.height);
        debug!("UI attached at {}x{}", size.width, size.height);
        manager
    }

    pub fn update_display_size(&mut self, width: u32, height: u32) {
        self.context.io_mut().display_size = [width as f32, height as f32];
    }

    /// Mouse is over a widget or dragging one
    pub fn captures_pointer(&self) -> bool {
        self.context.io().want_capture_mouse
    }

    /// Feeds a window event to imgui; true if the panel consumed it
    pub fn handle_window_event(
        &mut self,
        window: &Window,
        window_id: WindowId,
        event: &WindowEvent,
    ) -> bool {
        let forwarded = matches!(
            event,
            WindowEvent::CursorMoved { .. }
                | WindowEvent::MouseInput { .. }
                | WindowEvent::MouseWheel { .. }
                | WindowEvent::KeyboardInput { .. }
                | WindowEvent::ModifiersChanged(_)
                | WindowEvent::Focused(_)
        );
        if !forwarded {
            return false;
        }

        let wrapped: Event<()> = Event::WindowEvent {
            window_id,
            event: event.clone(),
        };
        self.platform
            .handle_event(self.context.io_mut(), window, &wrapped);

        match event {
            WindowEvent::KeyboardInput { .. } => self.context.io().want_capture_keyboard,
            WindowEvent::ModifiersChanged(_) | WindowEvent::Focused(_) => false,
            _ => self.captures_pointer(),
        }
    }

    /// Runs `build` against a fresh imgui frame
    ///
    /// Widgets may mutate application state here; drawing happens later in
    /// [`render_overlay`](Self::render_overlay).
    pub fn build_frame<F>(&mut self, window: &Window, build: F)
    where
        F: FnOnce(&imgui::Ui),
    {
        if self.frame_built {
            // The renderer skipped last frame; close it before starting another
            self.context.render();
            self.frame_built = false;
        }

        let now = Instant::now();
        self.context
            .io_mut()
            .update_delta_time(now - self.last_frame);
        self.last_frame = now;

        if let Err(e) = self.platform.prepare_frame(self.context.io_mut(), window) {
            warn!("Skipping UI frame: {e}");
            self.frame_built = false;
            return;
        }

        let ui = self.context.frame();
        build(ui);

        let cursor = ui.mouse_cursor();
        if self.last_cursor != cursor {
            self.last_cursor = cursor;
            self.platform.prepare_render(ui, window);
        }
        self.frame_built = true;
    }

    /// Draws the last built frame over `target` without clearing it
    pub fn render_overlay(
        &mut self,
        device: &Device,
        queue: &Queue,
        encoder: &mut CommandEncoder,
        target: &TextureView,
    ) {
        if !self.frame_built {
            return;
        }
        self.frame_built = false;

        let draw_data = self.context.render();
        if draw_data.display_size[0] <= 0.0 || draw_data.display_size[1] <= 0.0 {
            return;
        }

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Panel Overlay"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        if let Err(e) = self.renderer.render(draw_data, queue, device, &mut pass) {
            warn!("Panel render failed: {e}");
        }
    }
}
