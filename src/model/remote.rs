use super::handle::ModelLocation;
use super::pipeline::Pipeline;
use super::types::{InferenceOutput, SamplerConfig, SamplerParams, Seed};
use crate::{Error, Result, config::ModelConfig};
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::{DynamicImage, ImageFormat};
use serde::Serialize;
use std::io::Cursor;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Serialize)]
struct LoadRequest<'a> {
    model: String,
    device: &'a str,
    attn_backend: &'a str,
    spconv_algo: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
enum RunMode {
    Single,
    Multi,
}

#[derive(Debug, Serialize)]
struct RunRequest<'a> {
    mode: RunMode,
    images: Vec<String>,
    seed: &'a Seed,
    sparse_structure_sampler_params: SamplerParams,
    slat_sampler_params: SamplerParams,
}

/// Pipeline hosted by a separate inference runtime reached over HTTP.
///
/// The runtime owns the device; this side only ships images and sampler
/// settings and reads back the raw Gaussian and mesh batches.
pub struct RemotePipeline {
    client: reqwest::Client,
    base_url: String,
}

impl RemotePipeline {
    /// Ask the runtime to load `location` onto the configured device.
    pub async fn connect(config: &ModelConfig, location: &ModelLocation) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.backend.timeout_secs))
            .build()
            .map_err(|e| Error::initialization(format!("failed to build HTTP client: {}", e)))?;
        let base_url = config.backend.base_url.trim_end_matches('/').to_string();

        let request = LoadRequest {
            model: location.to_string(),
            device: &config.device,
            attn_backend: &config.attn_backend,
            spconv_algo: &config.spconv_algo,
        };

        info!(
            "Loading pipeline from {} on {} (attn_backend={}, spconv_algo={})",
            request.model, request.device, request.attn_backend, request.spconv_algo
        );

        let response = client
            .post(format!("{}/load", base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::initialization(format!("inference runtime unreachable: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let message = error_message(response).await;
            return Err(Error::initialization(format!(
                "inference runtime refused to load model ({}): {}",
                status, message
            )));
        }

        Ok(Self { client, base_url })
    }

    async fn generate(
        &self,
        mode: RunMode,
        images: &[DynamicImage],
        seed: &Seed,
        sampler: &SamplerConfig,
    ) -> Result<InferenceOutput> {
        let images = images
            .iter()
            .map(encode_png)
            .collect::<Result<Vec<_>>>()?;

        debug!("Submitting {:?} generation with {} image(s)", mode, images.len());

        let request = RunRequest {
            mode,
            images,
            seed,
            sparse_structure_sampler_params: sampler.sparse_structure,
            slat_sampler_params: sampler.slat,
        };

        let response = self
            .client
            .post(format!("{}/run", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::inference(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::inference(error_message(response).await));
        }

        let output: InferenceOutput = response
            .json()
            .await
            .map_err(|e| Error::inference(format!("malformed pipeline output: {}", e)))?;

        for gaussian in &output.gaussian {
            gaussian.validate()?;
        }
        for mesh in &output.mesh {
            mesh.validate()?;
        }

        Ok(output)
    }
}

#[async_trait]
impl Pipeline for RemotePipeline {
    async fn run(
        &self,
        image: &DynamicImage,
        seed: &Seed,
        sampler: &SamplerConfig,
    ) -> Result<InferenceOutput> {
        self.generate(RunMode::Single, std::slice::from_ref(image), seed, sampler)
            .await
    }

    async fn run_multi(
        &self,
        images: &[DynamicImage],
        seed: &Seed,
        sampler: &SamplerConfig,
    ) -> Result<InferenceOutput> {
        self.generate(RunMode::Multi, images, seed, sampler).await
    }
}

fn encode_png(image: &DynamicImage) -> Result<String> {
    let mut buffer = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|e| Error::inference(format!("failed to encode image for runtime: {}", e)))?;
    Ok(STANDARD.encode(buffer))
}

/// Prefer the runtime's `{"error": ...}` message, fall back to the raw body.
async fn error_message(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| {
            if body.is_empty() {
                format!("inference runtime returned {}", status)
            } else {
                body
            }
        })
}
