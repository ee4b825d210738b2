//! The scene control panel

use log::warn;

use crate::params::{ParamId, ParamKind, ParamSpec, ParamValue};
use crate::scene::{FontStatus, SceneState, ShapeFamily};

const PENDING_COLOR: [f32; 4] = [0.9, 0.8, 0.3, 1.0];
const LOADED_COLOR: [f32; 4] = [0.4, 0.9, 0.5, 1.0];
const FAILED_COLOR: [f32; 4] = [0.95, 0.4, 0.4, 1.0];

/// Folders in first-appearance order of their controls
fn folders() -> Vec<&'static str> {
    let mut folders: Vec<&'static str> = Vec::new();
    for id in ParamId::ALL {
        let folder = id.spec().folder;
        if !folders.contains(&folder) {
            folders.push(folder);
        }
    }
    folders
}

/// Draws the panel and commits any edits made this frame
pub fn parameter_panel(ui: &imgui::Ui, state: &mut SceneState) {
    let display_size = ui.io().display_size;
    if display_size[0] <= 0.0 || display_size[1] <= 0.0 {
        return;
    }

    ui.window("Controls")
        .size([360.0, display_size[1] * 0.7], imgui::Condition::FirstUseEver)
        .position(
            [display_size[0] - 380.0, 20.0],
            imgui::Condition::FirstUseEver,
        )
        .resizable(true)
        .collapsible(true)
        .build(|| {
            for folder in folders() {
                if !ui.collapsing_header(folder, imgui::TreeNodeFlags::DEFAULT_OPEN) {
                    continue;
                }
                for id in ParamId::ALL {
                    let spec = id.spec();
                    if spec.folder != folder {
                        continue;
                    }
                    if let Some(value) = control(ui, spec, state.params().get(id)) {
                        if let Err(e) = state.set_param(id, value) {
                            warn!("Edit of {id} not fully applied: {e}");
                        }
                    }
                }
            }

            ui.separator();
            if ui.button("Reset") {
                if let Err(e) = state.reset() {
                    warn!("Reset left text unchanged: {e}");
                }
            }

            ui.separator();
            render_status(ui, state);
        });
}

/// Draws one control; returns the new value if it was edited
fn control(ui: &imgui::Ui, spec: &ParamSpec, current: &ParamValue) -> Option<ParamValue> {
    let label = format!("{}##{}", spec.label, spec.key);
    match (spec.kind, current) {
        (ParamKind::Float { min, max, .. }, ParamValue::Float(value)) => {
            let mut value = *value;
            ui.slider(&label, min, max, &mut value)
                .then_some(ParamValue::Float(value))
        }
        (ParamKind::Int { min, max, .. }, ParamValue::Int(value)) => {
            let mut value = *value;
            ui.slider(&label, min, max, &mut value)
                .then_some(ParamValue::Int(value))
        }
        (ParamKind::Bool, ParamValue::Bool(value)) => {
            let mut value = *value;
            ui.checkbox(&label, &mut value)
                .then_some(ParamValue::Bool(value))
        }
        (ParamKind::Text, ParamValue::Text(value)) => {
            let mut value = value.clone();
            ui.input_text_multiline(&label, &mut value, [-1.0, 80.0])
                .build()
                .then_some(ParamValue::Text(value))
        }
        // The store only ever holds the declared kind
        _ => None,
    }
}

fn render_status(ui: &imgui::Ui, state: &SceneState) {
    for family in ShapeFamily::ALL {
        ui.text(format!("{}: {}", family.label(), state.shape_count(family)));
    }

    match state.font_status() {
        FontStatus::Pending => ui.text_colored(PENDING_COLOR, "Text: loading typeface..."),
        FontStatus::Loaded { family } if state.text_pending() => {
            ui.text_colored(PENDING_COLOR, format!("Text: pending ({family})"))
        }
        FontStatus::Loaded { family } => {
            ui.text_colored(LOADED_COLOR, format!("Text: loaded ({family})"))
        }
        FontStatus::Failed(reason) => ui.text_colored(FAILED_COLOR, format!("Text: failed, {reason}")),
    }

    let stats = state.graph().statistics();
    ui.text(format!(
        "{} nodes, {} triangles",
        stats.visible_nodes, stats.triangles
    ));
    ui.text(format!("{:.0} fps", ui.io().framerate));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folders_follow_panel_order() {
        assert_eq!(folders(), vec!["Text", "Cubes", "Triangles", "Donuts"]);
    }
}
