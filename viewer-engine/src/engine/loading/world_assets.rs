use bevy::asset::LoadState;
use bevy::gltf::GltfAssetLabel;
use bevy::prelude::*;
use bevy::render::view::NoFrustumCulling;
use bevy::scene::SceneInstance;
use bevy_gaussian_splatting::{CloudSettings, PlanarGaussian3d, PlanarGaussian3dHandle};
use world_client::{select_splat_asset, World};

use crate::engine::core::app_state::{RuntimeFlags, ViewerStatus};
use crate::engine::loading::progress::{LoadStage, WorldLoadProgress};
use crate::engine::locomotion::grounding::snap_rig_to_ground;
use crate::engine::scene::environment::{install_panorama, PanoDomeMaterial};
use crate::engine::scene::rig::{ViewerRig, SPAWN_OFFSET};

/// Root entity of the currently attached collider scene.
#[derive(Component)]
pub struct ColliderRoot;

/// A hit-testable surface inside the collider scene. Grounding casts
/// against exactly this set.
#[derive(Component)]
pub struct ColliderSurface;

/// The active splat cloud entity.
#[derive(Component)]
pub struct WorldSplat;

/// A fully resolved world is ready to be loaded into the scene.
#[derive(Event)]
pub struct WorldReady(pub World);

/// Kick off a world load when a generation completes.
pub fn begin_world_load(
    mut ready_events: EventReader<WorldReady>,
    flags: Res<RuntimeFlags>,
    mut progress: ResMut<WorldLoadProgress>,
    mut status: ResMut<ViewerStatus>,
    asset_server: Res<AssetServer>,
) {
    let Some(WorldReady(world)) = ready_events.read().last() else {
        return;
    };
    if flags.disposed {
        return;
    }
    if progress.is_busy() {
        warn!("world load already in flight, replacing it");
    }

    info!(world_id = %world.world_id, "loading world assets");
    status.set("Loading assets into the viewer…");
    progress.begin(world.clone());

    if let Some(pano_url) = world.pano_url() {
        progress.background = Some(asset_server.load(pano_url.to_string()));
    }
}

/// Drive the staged load: background → collider → splat.
///
/// Each arm waits for its asset before advancing, so the ordering
/// guarantee holds even though everything runs on the frame loop.
pub fn advance_world_load(
    mut commands: Commands,
    flags: Res<RuntimeFlags>,
    mut progress: ResMut<WorldLoadProgress>,
    mut status: ResMut<ViewerStatus>,
    asset_server: Res<AssetServer>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    dome_material: Res<PanoDomeMaterial>,
    scene_spawner: Res<SceneSpawner>,
    collider_roots: Query<(Entity, Option<&SceneInstance>), With<ColliderRoot>>,
    splats: Query<Entity, With<WorldSplat>>,
    children: Query<&Children>,
    mesh_surfaces: Query<(), With<Mesh3d>>,
) {
    if flags.disposed {
        return;
    }

    match progress.stage {
        LoadStage::Idle | LoadStage::Settle | LoadStage::Done | LoadStage::Failed => {}

        LoadStage::Background => {
            let Some(handle) = progress.background.clone() else {
                enter_collider_stage(&mut progress, &asset_server);
                return;
            };
            match asset_server.get_load_state(&handle) {
                Some(LoadState::Loaded) => {
                    install_panorama(&mut materials, &dome_material.0, handle);
                    info!("panorama installed");
                    enter_collider_stage(&mut progress, &asset_server);
                }
                Some(LoadState::Failed(error)) => {
                    // Aborts the whole load; the panorama is awaited
                    // before the mesh and splat steps.
                    fail(&mut progress, &mut status, format!("Failed to load panorama: {error}"));
                }
                _ => {}
            }
        }

        LoadStage::Collider => {
            let Some(handle) = progress.collider_scene.clone() else {
                progress.stage = LoadStage::Splat;
                return;
            };
            match asset_server.get_load_state(&handle) {
                Some(LoadState::Loaded) => {
                    attach_collider_scene(&mut commands, &collider_roots, handle);
                    progress.stage = LoadStage::ColliderPrep;
                }
                Some(LoadState::Failed(error)) => {
                    fail(&mut progress, &mut status, format!("Failed to load collider mesh: {error}"));
                }
                _ => {}
            }
        }

        LoadStage::ColliderPrep => {
            // Wait until the glTF scene has actually spawned, then make
            // every mesh invisible but hit-testable.
            let mut ready_root = None;
            for (entity, instance) in &collider_roots {
                if let Some(instance) = instance {
                    if scene_spawner.instance_is_ready(**instance) {
                        ready_root = Some(entity);
                    }
                }
            }
            let Some(root) = ready_root else {
                return;
            };

            let surface_material = materials.add(StandardMaterial {
                base_color: Color::NONE,
                alpha_mode: AlphaMode::Blend,
                unlit: true,
                ..default()
            });
            let mut surfaces = 0;
            for descendant in children.iter_descendants(root) {
                if mesh_surfaces.contains(descendant) {
                    commands.entity(descendant).insert((
                        MeshMaterial3d(surface_material.clone()),
                        NoFrustumCulling,
                        ColliderSurface,
                    ));
                    surfaces += 1;
                }
            }
            info!(surfaces, "collider attached");
            progress.stage = LoadStage::Splat;
        }

        LoadStage::Splat => {
            let choice = progress
                .world
                .as_ref()
                .and_then(|world| world.spz_urls())
                .and_then(select_splat_asset);
            let Some(choice) = choice else {
                fail(
                    &mut progress,
                    &mut status,
                    "World has no renderable splat asset.".to_string(),
                );
                return;
            };

            info!(label = %choice.label, "spawning splat cloud");
            attach_splat_cloud(&mut commands, &splats, asset_server.load(choice.url.clone()));
            progress.splat_choice = Some(choice);
            progress.stage = LoadStage::Settle;
        }
    }
}

/// Final step: put the rig at the spawn offset and ground it once
/// immediately instead of waiting for the next frame's grounding.
pub fn settle_rig_after_load(
    flags: Res<RuntimeFlags>,
    mut progress: ResMut<WorldLoadProgress>,
    mut status: ResMut<ViewerStatus>,
    mut ray_cast: bevy::picking::mesh_picking::ray_cast::MeshRayCast,
    surfaces: Query<(), With<ColliderSurface>>,
    mut rigs: Query<&mut Transform, With<ViewerRig>>,
) {
    if flags.disposed || progress.stage != LoadStage::Settle {
        return;
    }
    let Ok(mut rig) = rigs.single_mut() else {
        return;
    };

    rig.translation = SPAWN_OFFSET;
    snap_rig_to_ground(&mut rig, &mut ray_cast, &surfaces);

    progress.stage = LoadStage::Done;
    status.set("Ready. Enter the world.");
    info!("world load complete");
}

/// Attach a freshly loaded collider scene. Replace, never accumulate:
/// the previous world's root goes away before the new one attaches.
fn attach_collider_scene(
    commands: &mut Commands,
    previous: &Query<(Entity, Option<&SceneInstance>), With<ColliderRoot>>,
    handle: Handle<Scene>,
) {
    for (entity, _) in previous {
        commands.entity(entity).despawn();
    }
    commands.spawn((
        SceneRoot(handle),
        ColliderRoot,
        Transform::IDENTITY,
        Visibility::default(),
    ));
}

/// Attach the resolved splat cloud, despawning the previous world's
/// cloud first.
fn attach_splat_cloud(
    commands: &mut Commands,
    previous: &Query<Entity, With<WorldSplat>>,
    handle: Handle<PlanarGaussian3d>,
) {
    for entity in previous {
        commands.entity(entity).despawn();
    }
    commands.spawn((
        PlanarGaussian3dHandle(handle),
        CloudSettings::default(),
        Transform::IDENTITY,
        Visibility::default(),
        WorldSplat,
    ));
}

fn enter_collider_stage(progress: &mut WorldLoadProgress, asset_server: &AssetServer) {
    progress.stage = LoadStage::Collider;
    let url = progress
        .world
        .as_ref()
        .and_then(|world| world.collider_mesh_url())
        .map(str::to_string);
    if let Some(url) = url {
        progress.collider_scene = Some(asset_server.load(GltfAssetLabel::Scene(0).from_asset(url)));
    }
}

fn fail(progress: &mut WorldLoadProgress, status: &mut ViewerStatus, message: String) {
    error!("{message}");
    status.set_error(message);
    progress.fail();
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::asset::AssetPlugin;
    use bevy::ecs::system::RunSystemOnce;
    use std::collections::BTreeMap;
    use world_client::types::{SplatAssets, WorldAssets};

    fn test_app() -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, AssetPlugin::default()))
            .init_asset::<StandardMaterial>()
            .init_resource::<WorldLoadProgress>()
            .init_resource::<ViewerStatus>()
            .init_resource::<RuntimeFlags>()
            .init_resource::<SceneSpawner>()
            .insert_resource(PanoDomeMaterial(Handle::default()))
            .add_event::<WorldReady>();
        app
    }

    fn bare_world(id: &str) -> World {
        World {
            world_id: id.to_string(),
            display_name: None,
            world_marble_url: None,
            assets: None,
        }
    }

    fn world_with_splats(id: &str) -> World {
        let mut spz_urls = BTreeMap::new();
        spz_urls.insert("5m".to_string(), "worlds/5m.spz".to_string());
        World {
            assets: Some(WorldAssets {
                splats: Some(SplatAssets {
                    spz_urls: Some(spz_urls),
                }),
                ..WorldAssets::default()
            }),
            ..bare_world(id)
        }
    }

    fn active_colliders(app: &mut App) -> usize {
        let mut query = app
            .world_mut()
            .query_filtered::<Entity, With<ColliderRoot>>();
        query.iter(app.world()).count()
    }

    fn active_splats(app: &mut App) -> usize {
        let mut query = app.world_mut().query_filtered::<Entity, With<WorldSplat>>();
        query.iter(app.world()).count()
    }

    #[test]
    fn attaching_a_collider_never_accumulates_roots() {
        let mut app = test_app();
        app.world_mut().spawn(ColliderRoot);
        app.world_mut().spawn(ColliderRoot);
        app.world_mut()
            .run_system_once(
                |mut commands: Commands,
                 roots: Query<(Entity, Option<&SceneInstance>), With<ColliderRoot>>| {
                    attach_collider_scene(&mut commands, &roots, Handle::default());
                },
            )
            .unwrap();
        assert_eq!(active_colliders(&mut app), 1);
    }

    #[test]
    fn attaching_a_splat_never_accumulates_clouds() {
        let mut app = test_app();
        app.world_mut().spawn(WorldSplat);
        app.world_mut().spawn(WorldSplat);
        app.world_mut()
            .run_system_once(
                |mut commands: Commands, splats: Query<Entity, With<WorldSplat>>| {
                    attach_splat_cloud(&mut commands, &splats, Handle::default());
                },
            )
            .unwrap();
        assert_eq!(active_splats(&mut app), 1);
    }

    #[test]
    fn ready_world_starts_the_load_pipeline() {
        let mut app = test_app();
        app.world_mut().send_event(WorldReady(bare_world("w1")));
        app.world_mut().run_system_once(begin_world_load).unwrap();
        let progress = app.world().resource::<WorldLoadProgress>();
        assert_eq!(progress.stage, LoadStage::Background);
        assert!(progress.background.is_none());
    }

    #[test]
    fn disposed_viewer_skips_ready_worlds() {
        let mut app = test_app();
        app.world_mut().resource_mut::<RuntimeFlags>().disposed = true;
        app.world_mut().send_event(WorldReady(bare_world("w1")));
        app.world_mut().run_system_once(begin_world_load).unwrap();
        assert_eq!(
            app.world().resource::<WorldLoadProgress>().stage,
            LoadStage::Idle
        );
    }

    #[test]
    fn disposed_viewer_skips_in_flight_stages() {
        let mut app = test_app();
        {
            let mut progress = app.world_mut().resource_mut::<WorldLoadProgress>();
            progress.stage = LoadStage::Splat;
            progress.world = Some(world_with_splats("w1"));
        }
        app.world_mut().resource_mut::<RuntimeFlags>().disposed = true;
        app.world_mut().run_system_once(advance_world_load).unwrap();
        assert_eq!(active_splats(&mut app), 0);
        let progress = app.world().resource::<WorldLoadProgress>();
        assert_eq!(progress.stage, LoadStage::Splat);
        assert!(progress.splat_choice.is_none());
    }
}
