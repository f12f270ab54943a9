//! Static scene setup: viewer rig, lighting, reference geometry, and
//! the panorama dome that receives world background imagery.

/// Viewer rig construction and spawn constants.
pub mod rig;

/// Lighting, reference grid/floor, and the panorama dome.
pub mod environment;

use bevy::prelude::*;

pub struct ScenePlugin;

impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, (rig::spawn_rig, environment::spawn_environment));
    }
}
