//! Core runtime state and window configuration.

/// Viewer status channel and the teardown latch checked by every
/// system that mutates shared scene state.
pub mod app_state;

/// Primary window configuration for the render surface.
pub mod window_config;
