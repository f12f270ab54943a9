use bevy::prelude::*;
use world_client::{SplatChoice, World};

/// Ordered stages of a world load. Each stage completes fully before
/// the next begins, so later stages may assume earlier attachments
/// exist (the settle pass sees the collider surfaces).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadStage {
    #[default]
    Idle,
    Background,
    Collider,
    ColliderPrep,
    Splat,
    Settle,
    Done,
    Failed,
}

/// Progress of the in-flight world load plus the asset handles
/// requested so far.
#[derive(Resource, Default)]
pub struct WorldLoadProgress {
    pub stage: LoadStage,
    pub world: Option<World>,
    pub background: Option<Handle<Image>>,
    pub collider_scene: Option<Handle<Scene>>,
    pub splat_choice: Option<SplatChoice>,
}

impl WorldLoadProgress {
    /// Start a fresh load, dropping any handles from a previous one.
    pub fn begin(&mut self, world: World) {
        *self = Self {
            stage: LoadStage::Background,
            world: Some(world),
            ..Self::default()
        };
    }

    pub fn fail(&mut self) {
        self.stage = LoadStage::Failed;
        self.background = None;
        self.collider_scene = None;
    }

    pub fn is_busy(&self) -> bool {
        !matches!(self.stage, LoadStage::Idle | LoadStage::Done | LoadStage::Failed)
    }
}
