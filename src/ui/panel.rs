//! Controls panel
//!
//! Shows which scene is up, the progress of a pending load and the last load
//! failure, and exposes the two map control toggles.

use crate::{
    gfx::camera::CameraController,
    viewer::{StatusBoard, ViewerState},
};

/// Draws the "Controls" window
///
/// # Arguments
/// * `ui` - ImGui UI context
/// * `controller` - Map controls whose toggles the panel edits
/// * `state` - Current walkthrough state
/// * `status` - Pending load and last error
pub fn controls_panel(
    ui: &imgui::Ui,
    controller: &mut CameraController,
    state: ViewerState,
    status: &StatusBoard,
) {
    let display_size = ui.io().display_size;
    if display_size[0] <= 0.0 || display_size[1] <= 0.0 {
        return;
    }

    ui.window("Controls")
        .size([300.0, 0.0], imgui::Condition::FirstUseEver)
        .position([20.0, 20.0], imgui::Condition::FirstUseEver)
        .always_auto_resize(true)
        .collapsible(true)
        .build(|| {
            ui.checkbox("Zoom to cursor", &mut controller.zoom_to_cursor);
            ui.checkbox("Screen space panning", &mut controller.screen_space_panning);
            ui.separator();

            for line in status_lines(state, status) {
                ui.text_wrapped(line);
            }
            if let Some(fraction) = status.loading.as_ref().and_then(|l| l.fraction()) {
                imgui::ProgressBar::new(fraction).build(ui);
            }
        });
}

/// Text shown under the toggles
pub fn status_lines(state: ViewerState, status: &StatusBoard) -> Vec<String> {
    let mut lines = vec![format!("Scene: {}", state.scene())];
    if let Some(loading) = &status.loading {
        let progress = match loading.fraction() {
            Some(fraction) => format!("{:.0}%", fraction * 100.0),
            None if loading.loaded > 0 => format!("{} bytes", loading.loaded),
            None => "waiting".to_string(),
        };
        lines.push(format!("Loading {}: {}", loading.url, progress));
    }
    if let Some(error) = &status.last_error {
        lines.push(format!("Last error: {}", error));
    }
    lines
}
