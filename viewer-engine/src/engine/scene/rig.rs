use bevy::prelude::*;
use bevy_gaussian_splatting::GaussianCamera;

/// Movable anchor carrying the camera through the scene. Locomotion
/// translates it; grounding pins its height to the collider surface.
#[derive(Component)]
pub struct ViewerRig;

/// Camera height above the rig anchor, metres. Grounding sets the rig
/// to the surface height and relies on this offset for eye level.
pub const EYE_HEIGHT: f32 = 1.6;

/// Spawn position behind the scene origin so the viewer does not
/// start inside the splat cloud.
pub const SPAWN_OFFSET: Vec3 = Vec3::new(0.0, 0.0, 2.5);

pub fn spawn_rig(mut commands: Commands) {
    commands
        .spawn((
            ViewerRig,
            Transform::from_translation(SPAWN_OFFSET),
            Visibility::default(),
        ))
        .with_children(|rig| {
            rig.spawn((
                Camera3d::default(),
                Projection::from(PerspectiveProjection {
                    fov: 65.0_f32.to_radians(),
                    near: 0.05,
                    far: 2000.0,
                    ..default()
                }),
                Transform::from_xyz(0.0, EYE_HEIGHT, 0.0),
                GaussianCamera::default(),
            ));
        });
}
