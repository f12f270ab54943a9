//! World asset loading pipeline.
//!
//! Turns a fetched world description into live scene objects through a
//! staged Update pipeline with strict ordering: background panorama,
//! then collider mesh, then splat cloud, then rig settling.

/// Load stage tracking resource for the in-flight world.
pub mod progress;

/// Stage systems: asset requests, replacement of previous world
/// objects, collider surface preparation, and the initial grounding
/// pass.
pub mod world_assets;

use bevy::prelude::*;

use progress::WorldLoadProgress;
use world_assets::WorldReady;

pub struct WorldLoadingPlugin;

impl Plugin for WorldLoadingPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<WorldLoadProgress>()
            .add_event::<WorldReady>()
            .add_systems(
                Update,
                (
                    world_assets::begin_world_load,
                    world_assets::advance_world_load,
                    world_assets::settle_rig_after_load,
                )
                    .chain(),
            );
    }
}
