//! Bridge between the worker-thread generation flow and the frame
//! loop. Status updates cross over a crossbeam channel and are drained
//! once per frame into the viewer status resource.

use bevy::prelude::*;
use crossbeam_channel::{unbounded, Receiver};
use world_client::{
    spawn_generation, spawn_world_fetch, GenerateRequest, GenerationEvent, HttpWorldsApi,
};

use crate::engine::core::app_state::{RuntimeFlags, ViewerStatus};
use crate::engine::loading::world_assets::WorldReady;

/// What the viewer should do once booted: generate a new world from a
/// prompt, enter an existing one by id, or idle.
#[derive(Resource, Default)]
pub struct GenerationSettings {
    pub request: Option<GenerateRequest>,
    pub world_id: Option<String>,
    pub api_base: String,
}

/// Receiver half of the worker-thread status channel. Present only
/// while a flow is (or was) in flight; a single flow runs per session.
#[derive(Resource)]
pub struct ActiveGeneration {
    receiver: Receiver<GenerationEvent>,
}

pub struct GenerationPlugin;

impl Plugin for GenerationPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, start_requested_flow)
            .add_systems(Update, drain_generation_events);
    }
}

/// Spawn the generation (or fetch) worker for whatever the CLI asked
/// for. Credential problems surface on the status channel instead of
/// crashing the viewer.
fn start_requested_flow(
    mut commands: Commands,
    settings: Res<GenerationSettings>,
    mut status: ResMut<ViewerStatus>,
) {
    if settings.request.is_none() && settings.world_id.is_none() {
        status.set("Idle. Relaunch with --prompt to generate a world.");
        return;
    }

    let api = match HttpWorldsApi::from_env(settings.api_base.clone()) {
        Ok(api) => api,
        Err(error) => {
            status.set_error(error.to_string());
            return;
        }
    };

    // A fresh flow invalidates any previously advertised world id.
    status.world_id = None;

    let (sender, receiver) = unbounded();
    if let Some(request) = settings.request.clone() {
        spawn_generation(api, request, sender);
    } else if let Some(world_id) = settings.world_id.clone() {
        spawn_world_fetch(api, world_id, sender);
    }
    commands.insert_resource(ActiveGeneration { receiver });
}

/// Drain worker updates into the status resource; a completed flow
/// hands its world to the loading pipeline.
fn drain_generation_events(
    generation: Option<Res<ActiveGeneration>>,
    flags: Res<RuntimeFlags>,
    mut status: ResMut<ViewerStatus>,
    mut world_ready: EventWriter<WorldReady>,
) {
    let Some(generation) = generation else {
        return;
    };
    if flags.disposed {
        return;
    }

    for event in generation.receiver.try_iter() {
        match event {
            GenerationEvent::Status { message, .. } => status.set(message),
            GenerationEvent::Ready(world) => {
                status.world_id = Some(world.world_id.clone());
                world_ready.write(WorldReady(*world));
            }
            GenerationEvent::Failed(message) => {
                // The pill must not advertise a world next to an error
                // from a different attempt.
                status.world_id = None;
                status.set_error(message);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::RunSystemOnce;
    use world_client::World;

    fn test_app(events: Vec<GenerationEvent>) -> App {
        let mut app = App::new();
        app.init_resource::<ViewerStatus>()
            .init_resource::<RuntimeFlags>()
            .add_event::<WorldReady>();
        let (sender, receiver) = unbounded();
        for event in events {
            sender.send(event).unwrap();
        }
        app.insert_resource(ActiveGeneration { receiver });
        app
    }

    #[test]
    fn ready_event_sets_the_pill_and_hands_off_the_world() {
        let world = World {
            world_id: "w-123".to_string(),
            display_name: None,
            world_marble_url: None,
            assets: None,
        };
        let mut app = test_app(vec![GenerationEvent::Ready(Box::new(world))]);
        app.world_mut()
            .run_system_once(drain_generation_events)
            .unwrap();
        let status = app.world().resource::<ViewerStatus>();
        assert_eq!(status.world_id.as_deref(), Some("w-123"));
        assert_eq!(app.world().resource::<Events<WorldReady>>().len(), 1);
    }

    #[test]
    fn failed_event_clears_the_pill_from_an_earlier_world() {
        let mut app = test_app(vec![GenerationEvent::Failed("quota exceeded".to_string())]);
        app.world_mut().resource_mut::<ViewerStatus>().world_id = Some("w-old".to_string());
        app.world_mut()
            .run_system_once(drain_generation_events)
            .unwrap();
        let status = app.world().resource::<ViewerStatus>();
        assert!(status.is_error);
        assert_eq!(status.message, "quota exceeded");
        assert_eq!(status.world_id, None);
    }
}
