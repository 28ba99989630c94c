use super::pipeline::Pipeline;
use super::remote::RemotePipeline;
use crate::{Error, Result, config::ModelConfig};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

const MANIFEST_FILE: &str = "pipeline.json";

/// Where the weights are loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelLocation {
    Local(PathBuf),
    Registry(String),
}

impl fmt::Display for ModelLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(path) => write!(f, "{}", path.display()),
            Self::Registry(id) => f.write_str(id),
        }
    }
}

/// The `pipeline.json` shipped next to the weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineManifest {
    pub name: String,
    #[serde(default)]
    pub args: serde_json::Value,
}

impl PipelineManifest {
    pub fn read(model_dir: &Path) -> Result<Self> {
        let path = model_dir.join(MANIFEST_FILE);
        let raw = std::fs::read_to_string(&path).map_err(|e| {
            Error::initialization(format!("cannot read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            Error::initialization(format!("invalid {}: {}", path.display(), e))
        })
    }
}

/// Pick the weights location.
///
/// Order: explicit `path`, then the managed-platform variable, then the first
/// existing volume root. A missing directory falls back to `registry_id`
/// when one is configured and is fatal otherwise.
pub fn resolve_location<F>(config: &ModelConfig, env: F) -> Result<ModelLocation>
where
    F: Fn(&str) -> Option<String>,
{
    let candidate = if let Some(path) = &config.path {
        path.clone()
    } else if let Some(dir) = env(&config.platform_env) {
        PathBuf::from(dir).join(&config.platform_subdir)
    } else {
        let root = config
            .volume_roots
            .iter()
            .find(|root| root.exists())
            .or_else(|| config.volume_roots.last())
            .ok_or_else(|| Error::initialization("no model volume roots configured"))?;
        root.join(&config.dir_name)
    };

    if candidate.is_dir() {
        return Ok(ModelLocation::Local(candidate));
    }

    match &config.registry_id {
        Some(id) => {
            warn!(
                "Model path {} not found, falling back to registry id {}",
                candidate.display(),
                id
            );
            Ok(ModelLocation::Registry(id.clone()))
        }
        None => Err(Error::initialization(format!(
            "Model path not found or is not a directory: {}",
            candidate.display()
        ))),
    }
}

/// The loaded pipeline, bound to one device for the life of the process.
///
/// Built once at startup and shared read-only by every job.
#[derive(Clone)]
pub struct ModelHandle {
    pipeline: Arc<dyn Pipeline>,
    location: ModelLocation,
    device: String,
}

impl ModelHandle {
    pub async fn initialize<F>(config: &ModelConfig, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let location = resolve_location(config, env)?;
        info!("Attempting to load model from: {}", location);

        if let ModelLocation::Local(dir) = &location {
            let manifest = PipelineManifest::read(dir)?;
            info!("Found pipeline manifest: {}", manifest.name);
        }

        let pipeline = RemotePipeline::connect(config, &location).await?;
        info!("Model initialized successfully on {}", config.device);

        Ok(Self::from_pipeline(
            Arc::new(pipeline),
            location,
            config.device.clone(),
        ))
    }

    pub fn from_pipeline(
        pipeline: Arc<dyn Pipeline>,
        location: ModelLocation,
        device: impl Into<String>,
    ) -> Self {
        Self {
            pipeline,
            location,
            device: device.into(),
        }
    }

    pub fn pipeline(&self) -> &dyn Pipeline {
        self.pipeline.as_ref()
    }

    pub fn location(&self) -> &ModelLocation {
        &self.location
    }

    pub fn device(&self) -> &str {
        &self.device
    }
}
