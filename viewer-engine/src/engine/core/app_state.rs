use bevy::prelude::*;

use crate::engine::loading::world_assets::{ColliderRoot, WorldSplat};

/// User-facing status line, mirrored into the UI overlay.
///
/// Every state transition of the generation flow and the asset
/// loading pipeline writes here; errors flip `is_error` so the
/// overlay can restyle the text.
#[derive(Resource)]
pub struct ViewerStatus {
    pub message: String,
    pub is_error: bool,
    /// Id of the most recently fetched world, for the UI pill.
    pub world_id: Option<String>,
}

impl Default for ViewerStatus {
    fn default() -> Self {
        Self {
            message: "Idle.".to_string(),
            is_error: false,
            world_id: None,
        }
    }
}

impl ViewerStatus {
    pub fn set(&mut self, message: impl Into<String>) {
        self.message = message.into();
        self.is_error = false;
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.message = message.into();
        self.is_error = true;
    }
}

/// Teardown latch. Once set, in-flight loading and generation systems
/// must not touch the scene again.
#[derive(Resource, Default)]
pub struct RuntimeFlags {
    pub disposed: bool,
}

/// Release world objects when the app is shutting down.
///
/// Runs in `Last` so it observes exit requests from the same frame.
/// Safe to run repeatedly: the queries are simply empty once the
/// objects are gone.
pub fn dispose_on_exit(
    mut exit_events: EventReader<AppExit>,
    mut flags: ResMut<RuntimeFlags>,
    mut commands: Commands,
    world_objects: Query<Entity, Or<(With<ColliderRoot>, With<WorldSplat>)>>,
) {
    if exit_events.is_empty() {
        return;
    }
    exit_events.clear();

    if !flags.disposed {
        flags.disposed = true;
        info!("viewer disposed, releasing world objects");
    }
    for entity in &world_objects {
        commands.entity(entity).despawn();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::RunSystemOnce;

    fn world_object_count(app: &mut App) -> usize {
        let mut query = app
            .world_mut()
            .query_filtered::<Entity, Or<(With<ColliderRoot>, With<WorldSplat>)>>();
        query.iter(app.world()).count()
    }

    #[test]
    fn exit_despawns_world_objects_and_latches_the_flag() {
        let mut app = App::new();
        app.init_resource::<RuntimeFlags>().add_event::<AppExit>();
        app.world_mut().spawn(ColliderRoot);
        app.world_mut().spawn(WorldSplat);

        app.world_mut().send_event(AppExit::Success);
        app.world_mut().run_system_once(dispose_on_exit).unwrap();
        assert!(app.world().resource::<RuntimeFlags>().disposed);
        assert_eq!(world_object_count(&mut app), 0);

        // Running again after teardown is a no-op.
        app.world_mut().send_event(AppExit::Success);
        app.world_mut().run_system_once(dispose_on_exit).unwrap();
        assert!(app.world().resource::<RuntimeFlags>().disposed);
        assert_eq!(world_object_count(&mut app), 0);
    }
}
