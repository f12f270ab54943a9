use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Generated world snapshot returned by the service.
///
/// Only `world_id` is required; the asset bundle shape is
/// provider-controlled, so every sub-record stays optional and is
/// presence-checked at the point of use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    pub world_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub world_marble_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assets: Option<WorldAssets>,
}

impl World {
    /// Panorama URL, when the world ships background imagery.
    pub fn pano_url(&self) -> Option<&str> {
        self.assets
            .as_ref()?
            .imagery
            .as_ref()?
            .pano_url
            .as_deref()
            .filter(|url| !url.is_empty())
    }

    /// Collider mesh URL, when the world ships a walkable proxy.
    pub fn collider_mesh_url(&self) -> Option<&str> {
        self.assets
            .as_ref()?
            .mesh
            .as_ref()?
            .collider_mesh_url
            .as_deref()
            .filter(|url| !url.is_empty())
    }

    /// Splat variant map, possibly empty.
    pub fn spz_urls(&self) -> Option<&BTreeMap<String, String>> {
        self.assets.as_ref()?.splats.as_ref()?.spz_urls.as_ref()
    }
}

/// Optional asset bundle attached to a world.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorldAssets {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imagery: Option<ImageryAssets>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mesh: Option<MeshAssets>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub splats: Option<SplatAssets>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

/// Background imagery for the scene environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageryAssets {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pano_url: Option<String>,
}

/// Invisible collision proxy for rig grounding.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeshAssets {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collider_mesh_url: Option<String>,
}

/// Point-cloud splat variants keyed by quality-tier label.
///
/// A BTreeMap keeps iteration deterministic, which pins down the
/// resolver's last-resort "first entry" fallback.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SplatAssets {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spz_urls: Option<BTreeMap<String, String>>,
}

/// Asynchronous generation operation.
///
/// Providers may report a terminal error payload before flipping
/// `done`, so both must be inspected on every poll.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Operation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(default)]
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<OperationMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<OperationError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<World>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperationMetadata {
    /// Completion fraction in [0, 1] when the provider reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
}

/// Error payload embedded in an operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperationError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl OperationError {
    pub fn message_or_default(&self) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| "generation reported an unspecified error".to_string())
    }
}

/// Model tier selector for generation requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorldModel {
    /// Faster, lower-fidelity tier.
    Mini,
    /// Default high-fidelity tier.
    #[default]
    Plus,
}

impl WorldModel {
    /// Provider-facing model label.
    pub fn as_str(&self) -> &'static str {
        match self {
            WorldModel::Mini => "Marble 0.1-mini",
            WorldModel::Plus => "Marble 0.1-plus",
        }
    }
}

/// Parameters for a world-generation request.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub text: String,
    pub display_name: Option<String>,
    pub model: WorldModel,
    pub seed: Option<u64>,
    pub tags: Option<Vec<String>>,
    pub public: bool,
}

impl GenerateRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            display_name: None,
            model: WorldModel::default(),
            seed: None,
            tags: None,
            public: false,
        }
    }

    /// Structured request body in the provider's wire shape.
    pub fn to_body(&self) -> serde_json::Value {
        serde_json::json!({
            "world_prompt": {
                "disable_recaption": true,
                "text_prompt": self.text,
                "type": "text",
            },
            "display_name": self.display_name,
            "model": self.model.as_str(),
            "permission": {
                "allowed_readers": [],
                "allowed_writers": [],
                "public": self.public,
            },
            "seed": self.seed,
            "tags": self.tags,
        })
    }
}
