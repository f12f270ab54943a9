use bevy::picking::mesh_picking::ray_cast::{MeshRayCast, MeshRayCastSettings, RayCastVisibility};
use bevy::prelude::*;

use crate::engine::loading::world_assets::ColliderSurface;
use crate::engine::scene::rig::ViewerRig;

/// Height above the rig the downward probe starts from, metres.
pub const GROUND_PROBE_HEIGHT: f32 = 3.0;

/// Maximum probe distance. Hits beyond this are ignored.
pub const GROUND_PROBE_RANGE: f32 = 20.0;

/// Pin the rig's height to the collider surface beneath it.
pub fn ground_rig(
    mut ray_cast: MeshRayCast,
    surfaces: Query<(), With<ColliderSurface>>,
    mut rigs: Query<&mut Transform, With<ViewerRig>>,
) {
    let Ok(mut rig) = rigs.single_mut() else {
        return;
    };
    snap_rig_to_ground(&mut rig, &mut ray_cast, &surfaces);
}

/// One grounding pass. With no collider surfaces the rig free-floats;
/// with no hit beneath it the height stays where locomotion left it.
///
/// The cast must accept invisible geometry: collider surfaces render
/// fully transparent and would never pass a visibility check.
pub fn snap_rig_to_ground(
    rig: &mut Transform,
    ray_cast: &mut MeshRayCast,
    surfaces: &Query<(), With<ColliderSurface>>,
) {
    if surfaces.is_empty() {
        return;
    }

    let origin = rig.translation + Vec3::Y * GROUND_PROBE_HEIGHT;
    let ray = Ray3d::new(origin, Dir3::NEG_Y);
    let filter = |entity: Entity| surfaces.contains(entity);
    let settings = MeshRayCastSettings::default()
        .with_visibility(RayCastVisibility::Any)
        .with_filter(&filter);

    if let Some((_, hit)) = ray_cast.cast_ray(ray, &settings).first() {
        if hit.distance <= GROUND_PROBE_RANGE {
            rig.translation.y = hit.point.y;
        }
    }
}
