//! Engine-side building blocks: runtime state, the world loading
//! pipeline, rig locomotion, and static scene setup.

/// Viewer status, teardown latch, and window configuration.
pub mod core;

/// Staged loading of world assets into the scene.
pub mod loading;

/// Rig movement and grounding against collider surfaces.
pub mod locomotion;

/// Viewer rig, lighting, reference geometry, and the panorama dome.
pub mod scene;
