//! Status and diagnostics overlay.

/// Status line and FPS readout spawning and refresh systems.
pub mod status;

use bevy::prelude::*;

pub struct StatusUiPlugin;

impl Plugin for StatusUiPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, status::spawn_ui).add_systems(
            Update,
            (status::update_status_text, status::fps_text_update_system),
        );
    }
}
