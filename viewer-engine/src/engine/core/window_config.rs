use bevy::prelude::*;
use bevy::window::PresentMode;

pub fn create_window_config() -> Window {
    Window {
        title: "World Viewer".to_string(),
        present_mode: PresentMode::AutoVsync,
        ..default()
    }
}
