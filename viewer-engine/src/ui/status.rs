use bevy::diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;
use world_client::short_id;

use crate::engine::core::app_state::ViewerStatus;

#[derive(Component)]
pub struct StatusText;

#[derive(Component)]
pub struct FpsText;

pub fn spawn_ui(mut commands: Commands) {
    commands
        .spawn(Node {
            width: Val::Percent(100.0),
            height: Val::Percent(100.0),
            ..default()
        })
        .with_children(|parent| {
            parent.spawn((
                Text::new("Status: Idle."),
                TextFont {
                    font_size: 15.0,
                    ..default()
                },
                TextColor(Color::srgb(0.8, 0.85, 0.9)),
                Node {
                    position_type: PositionType::Absolute,
                    bottom: Val::Px(12.0),
                    left: Val::Px(12.0),
                    ..default()
                },
                StatusText,
            ));
            parent.spawn((
                Text::new("FPS: "),
                TextFont {
                    font_size: 14.0,
                    ..default()
                },
                TextColor(Color::srgb(0.5, 0.55, 0.6)),
                Node {
                    position_type: PositionType::Absolute,
                    bottom: Val::Px(12.0),
                    right: Val::Px(12.0),
                    ..default()
                },
                FpsText,
            ));
        });
}

pub fn update_status_text(
    status: Res<ViewerStatus>,
    mut query: Query<(&mut Text, &mut TextColor), With<StatusText>>,
) {
    if !status.is_changed() {
        return;
    }
    for (mut text, mut color) in &mut query {
        text.0 = status_line(&status);
        color.0 = if status.is_error {
            Color::srgb(1.0, 0.35, 0.35)
        } else {
            Color::srgb(0.8, 0.85, 0.9)
        };
    }
}

/// Status line with the shortened world-id pill when one is known.
/// `short_id` keeps the truncation on char boundaries; world ids are
/// provider-controlled text.
fn status_line(status: &ViewerStatus) -> String {
    match &status.world_id {
        Some(id) => format!("Status: {}  |  World: {}…", status.message, short_id(id)),
        None => format!("Status: {}", status.message),
    }
}

pub fn fps_text_update_system(
    diagnostics: Res<DiagnosticsStore>,
    mut query: Query<&mut Text, With<FpsText>>,
) {
    for mut text in &mut query {
        if let Some(fps) = diagnostics.get(&FrameTimeDiagnosticsPlugin::FPS) {
            if let Some(value) = fps.smoothed() {
                text.0 = format!("FPS: {value:.1}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_with_world(id: &str) -> ViewerStatus {
        let mut status = ViewerStatus::default();
        status.set("Ready.");
        status.world_id = Some(id.to_string());
        status
    }

    #[test]
    fn world_pill_shows_a_shortened_id() {
        let line = status_line(&status_with_world("0123456789abcdef"));
        assert_eq!(line, "Status: Ready.  |  World: 01234567…");
    }

    #[test]
    fn multibyte_world_ids_truncate_on_char_boundaries() {
        let line = status_line(&status_with_world("1234567é9xyz"));
        assert_eq!(line, "Status: Ready.  |  World: 1234567é…");
    }

    #[test]
    fn no_world_means_no_pill() {
        assert_eq!(status_line(&ViewerStatus::default()), "Status: Idle.");
    }
}
