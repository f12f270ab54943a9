use bevy::asset::AssetMetaCheck;
use bevy::diagnostic::FrameTimeDiagnosticsPlugin;
use bevy::prelude::*;
use bevy_gaussian_splatting::GaussianSplattingPlugin;
use bevy_web_asset::WebAssetPlugin;
use clap::Parser;
use world_client::{GenerateRequest, WorldModel, WORLDS_API_BASE};

mod engine;
mod generation;
mod ui;

use engine::core::app_state::{dispose_on_exit, RuntimeFlags, ViewerStatus};
use engine::core::window_config::create_window_config;
use engine::loading::WorldLoadingPlugin;
use engine::locomotion::LocomotionPlugin;
use engine::scene::ScenePlugin;
use generation::{GenerationPlugin, GenerationSettings};
use ui::StatusUiPlugin;

/// Immersive viewer for generated splat worlds.
#[derive(Parser, Debug)]
#[command(name = "viewer-engine")]
struct Args {
    /// Text prompt describing the world to generate.
    #[arg(long, conflicts_with = "world")]
    prompt: Option<String>,

    /// Enter an existing world by id instead of generating one.
    #[arg(long)]
    world: Option<String>,

    /// Model tier used for generation.
    #[arg(long, value_enum, default_value_t = ModelTier::Plus)]
    model: ModelTier,

    /// Generation seed for reproducible worlds.
    #[arg(long)]
    seed: Option<u64>,

    /// Display name attached to the generated world.
    #[arg(long)]
    display_name: Option<String>,

    /// Tags attached to the generated world.
    #[arg(long)]
    tag: Vec<String>,

    /// Make the generated world publicly readable.
    #[arg(long)]
    public: bool,

    /// Base URL of the world-generation API.
    #[arg(long, default_value = WORLDS_API_BASE)]
    api_base: String,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum ModelTier {
    /// Faster, lower-fidelity tier.
    Mini,
    /// Default high-fidelity tier.
    Plus,
}

impl From<ModelTier> for WorldModel {
    fn from(tier: ModelTier) -> Self {
        match tier {
            ModelTier::Mini => WorldModel::Mini,
            ModelTier::Plus => WorldModel::Plus,
        }
    }
}

fn main() {
    let args = Args::parse();
    create_app(generation_settings(args)).run();
}

fn create_app(settings: GenerationSettings) -> App {
    let mut app = App::new();

    app.add_plugins(WebAssetPlugin::default())
        .add_plugins(create_default_plugins())
        .add_plugins(FrameTimeDiagnosticsPlugin::default())
        .add_plugins(GaussianSplattingPlugin)
        .add_plugins((
            ScenePlugin,
            LocomotionPlugin,
            WorldLoadingPlugin,
            StatusUiPlugin,
            GenerationPlugin,
        ))
        .insert_resource(settings)
        .init_resource::<ViewerStatus>()
        .init_resource::<RuntimeFlags>()
        .add_systems(Last, dispose_on_exit);

    app
}

fn create_default_plugins() -> impl PluginGroup {
    let window_config = WindowPlugin {
        primary_window: Some(create_window_config()),
        ..default()
    };

    // Remote asset URLs have no sidecar meta files.
    let asset_config = AssetPlugin {
        meta_check: AssetMetaCheck::Never,
        ..default()
    };

    DefaultPlugins.set(window_config).set(asset_config)
}

fn generation_settings(args: Args) -> GenerationSettings {
    let request = args.prompt.map(|prompt| {
        let mut request = GenerateRequest::new(prompt);
        request.model = args.model.into();
        request.seed = args.seed;
        request.display_name = args.display_name.clone();
        if !args.tag.is_empty() {
            request.tags = Some(args.tag.clone());
        }
        request.public = args.public;
        request
    });
    GenerationSettings {
        request,
        world_id: args.world,
        api_base: args.api_base,
    }
}
