//! Client library for the remote world-generation service.
//!
//! Covers the full submit → poll → fetch flow: wire types mirroring the
//! provider schema, a blocking HTTP client behind the [`api::WorldsApi`]
//! seam, the generation state machine with status reporting, and the
//! splat variant resolver used by the viewer when entering a world.

/// Wire types for worlds, operations, and generation requests.
///
/// Mirrors the provider JSON exactly; everything the client does not
/// strictly need is optional and treated as best-effort.
pub mod types;

/// HTTP client for the world-generation API.
///
/// Defines the `WorldsApi` trait seam plus the `ureq`-backed
/// implementation with credential lookup and error-envelope decoding.
pub mod api;

/// Generation state machine: submit, poll until terminal, fetch world.
///
/// Runs synchronously through a status sink, or on a worker thread
/// feeding a crossbeam channel for frame-loop consumption.
pub mod generation;

/// Splat asset variant selection across provider quality tiers.
pub mod resolver;

pub use api::{ApiError, HttpWorldsApi, WorldsApi, WORLDS_API_BASE};
pub use generation::{
    short_id, spawn_generation, spawn_world_fetch, GenerationDriver, GenerationError,
    GenerationEvent, GenerationPhase,
};
pub use resolver::{select_splat_asset, SplatChoice};
pub use types::{GenerateRequest, Operation, World, WorldAssets, WorldModel};
