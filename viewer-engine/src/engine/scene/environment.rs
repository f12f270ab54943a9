use bevy::asset::RenderAssetUsages;
use bevy::prelude::*;
use bevy::render::mesh::PrimitiveTopology;
use bevy::render::view::NoFrustumCulling;

/// Inward-facing sphere that displays the world panorama.
#[derive(Component)]
pub struct PanoDome;

/// Handle to the dome material so a loaded panorama can be installed
/// without respawning the dome.
#[derive(Resource)]
pub struct PanoDomeMaterial(pub Handle<StandardMaterial>);

#[derive(Component)]
pub struct ReferenceGrid;

#[derive(Component)]
pub struct ReferenceFloor;

/// Dome radius in metres. Large enough to sit behind any walkable
/// collider but inside the camera far plane.
pub const PANO_DOME_RADIUS: f32 = 400.0;

const GRID_EXTENT: f32 = 12.0;
const GRID_DIVISIONS: u32 = 24;

/// Spawn lighting, reference geometry, and the panorama dome.
pub fn spawn_environment(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.insert_resource(AmbientLight {
        color: Color::WHITE,
        brightness: 300.0,
        ..default()
    });
    commands.spawn((
        DirectionalLight {
            illuminance: 5500.0,
            shadows_enabled: false,
            ..default()
        },
        Transform::from_xyz(3.0, 6.0, 2.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    // Dark fallback floor, slightly below the origin so grounded
    // collider surfaces at y = 0 win the depth test.
    commands.spawn((
        Mesh3d(meshes.add(Plane3d::default().mesh().size(200.0, 200.0))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.043, 0.059, 0.09),
            metallic: 0.0,
            perceptual_roughness: 1.0,
            ..default()
        })),
        Transform::from_xyz(0.0, -0.01, 0.0),
        ReferenceFloor,
    ));

    let grid_material = materials.add(StandardMaterial {
        base_color: Color::srgba(0.2, 0.27, 0.33, 0.25),
        alpha_mode: AlphaMode::Blend,
        unlit: true,
        ..default()
    });
    commands.spawn((
        Mesh3d(meshes.add(create_reference_grid_mesh(GRID_EXTENT, GRID_DIVISIONS))),
        MeshMaterial3d(grid_material),
        NoFrustumCulling,
        Transform::IDENTITY,
        ReferenceGrid,
    ));

    // The dome starts dark; a loaded panorama swaps in via the
    // material handle.
    let dome_material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.02, 0.025, 0.04),
        unlit: true,
        cull_mode: None,
        double_sided: true,
        ..default()
    });
    commands.insert_resource(PanoDomeMaterial(dome_material.clone()));
    commands.spawn((
        Mesh3d(meshes.add(Sphere::new(PANO_DOME_RADIUS).mesh().uv(64, 32))),
        MeshMaterial3d(dome_material),
        NoFrustumCulling,
        PanoDome,
        Transform::IDENTITY,
    ));
}

/// Install a loaded panorama texture on the dome material.
pub fn install_panorama(
    materials: &mut Assets<StandardMaterial>,
    dome_material: &Handle<StandardMaterial>,
    texture: Handle<Image>,
) {
    if let Some(material) = materials.get_mut(dome_material) {
        material.base_color = Color::WHITE;
        material.base_color_texture = Some(texture);
    }
}

/// Flat reference grid centred on the origin, as a line-list mesh.
fn create_reference_grid_mesh(extent: f32, divisions: u32) -> Mesh {
    let mut vertices: Vec<[f32; 3]> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();

    let half = extent * 0.5;
    let spacing = extent / divisions as f32;

    for i in 0..=divisions {
        let offset = -half + i as f32 * spacing;

        // Line running along Z at fixed X.
        let start = vertices.len() as u32;
        vertices.push([offset, 0.0, -half]);
        vertices.push([offset, 0.0, half]);
        indices.extend_from_slice(&[start, start + 1]);

        // Line running along X at fixed Z.
        let start = vertices.len() as u32;
        vertices.push([-half, 0.0, offset]);
        vertices.push([half, 0.0, offset]);
        indices.extend_from_slice(&[start, start + 1]);
    }

    let mut mesh = Mesh::new(PrimitiveTopology::LineList, RenderAssetUsages::RENDER_WORLD);
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, vertices);
    mesh.insert_indices(bevy::render::mesh::Indices::U32(indices));
    mesh
}
