//! Per-frame locomotion and grounding for the viewer rig.
//!
//! Movement runs before grounding, chained, so the grounding cast
//! always sees the current frame's locomotion result.

/// Thumbstick/keyboard movement in the camera's ground plane.
pub mod movement;

/// Downward ray casting against collider surfaces.
pub mod grounding;

use bevy::prelude::*;

pub struct LocomotionPlugin;

impl Plugin for LocomotionPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (movement::rig_locomotion, grounding::ground_rig).chain(),
        );
    }
}
