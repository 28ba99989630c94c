//! Per-job orchestration: decode, infer, export, encode.

mod decoder;
mod dispatcher;
mod envelope;
mod postprocess;

pub use decoder::{EMPTY_IMAGES, GenerationRequest, MALFORMED_IMAGES, decode};
pub use dispatcher::infer;
pub use envelope::{GLB_CONTENT_TYPE, ResponseEnvelope, SUCCESS_MESSAGE, SUCCESS_STATUS};
pub use postprocess::{Asset, SIMPLIFY_RATIO, TEXTURE_SIZE, to_asset};

use crate::export::Exporter;
use crate::model::{ModelHandle, SamplerConfig};
use crate::{Error, Result};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};

/// Runs jobs against one model handle. Holds no per-job state.
pub struct Worker {
    model: Option<ModelHandle>,
    exporter: Arc<dyn Exporter>,
    sampler: SamplerConfig,
}

impl Worker {
    pub fn new(model: ModelHandle, exporter: Arc<dyn Exporter>) -> Self {
        Self {
            model: Some(model),
            exporter,
            sampler: SamplerConfig::default(),
        }
    }

    /// A worker whose model never loaded. Every job fails.
    pub fn uninitialized(exporter: Arc<dyn Exporter>) -> Self {
        Self {
            model: None,
            exporter,
            sampler: SamplerConfig::default(),
        }
    }

    pub fn model(&self) -> Option<&ModelHandle> {
        self.model.as_ref()
    }

    pub fn is_ready(&self) -> bool {
        self.model.is_some()
    }

    /// Run one job and wrap the outcome in an envelope.
    pub async fn handle(&self, job_id: &str, input: &Value) -> ResponseEnvelope {
        ResponseEnvelope::from(&self.process(job_id, input).await)
    }

    /// Run one job, returning the asset or the typed error that stopped it.
    pub async fn process(&self, job_id: &str, input: &Value) -> Result<Asset> {
        info!("Processing job {}", job_id);

        let result = self.run_stages(input).await;
        match &result {
            Ok(asset) => info!(
                "Job {} completed successfully ({} bytes)",
                job_id,
                asset.as_bytes().len()
            ),
            Err(e) => error!("An error occurred during job {}: {}", job_id, e),
        }
        result
    }

    async fn run_stages(&self, input: &Value) -> Result<Asset> {
        let model = self.model.as_ref().ok_or(Error::NotInitialized)?;

        let request = decode(input)?;
        info!("Successfully decoded {} image(s)", request.images.len());

        let output = infer(model.pipeline(), &request.images, &request.seed, &self.sampler).await?;

        let exporter = Arc::clone(&self.exporter);
        tokio::task::spawn_blocking(move || to_asset(exporter.as_ref(), &output))
            .await
            .map_err(|e| Error::postprocess(format!("post-processing task failed: {}", e)))?
    }
}
