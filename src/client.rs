//! Client side of the worker: builds a job from local image files and saves
//! the returned GLB.

use crate::model::Seed;
use crate::worker::{ResponseEnvelope, SUCCESS_STATUS};
use crate::{Error, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub endpoint_url: String,
    pub api_key: String,
    #[serde(default)]
    pub images: Vec<PathBuf>,
    #[serde(default)]
    pub seed: Option<Seed>,
    #[serde(default = "default_output_filename")]
    pub output_filename: PathBuf,
}

fn default_output_filename() -> PathBuf {
    PathBuf::from("output.glb")
}

impl ClientConfig {
    pub async fn load(path: &Path) -> Result<Self> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(Error::config(format!("`{}` not found.", path.display())));
        }
        let raw = tokio::fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// Base64-encode every readable image, skipping the ones that cannot be read.
pub async fn encode_images(paths: &[PathBuf]) -> Result<Vec<String>> {
    let mut encoded = Vec::with_capacity(paths.len());
    for path in paths {
        match tokio::fs::read(path).await {
            Ok(bytes) => encoded.push(STANDARD.encode(bytes)),
            Err(e) => warn!("image `{}` unreadable ({}); skipping.", path.display(), e),
        }
    }

    if encoded.is_empty() {
        return Err(Error::validation("No valid images were encoded."));
    }
    Ok(encoded)
}

/// Send the job, then write the decoded asset to `output_filename`.
pub async fn submit(config: &ClientConfig) -> Result<PathBuf> {
    let payload = json!({
        "input": {
            "images": encode_images(&config.images).await?,
            "seed": config.seed,
        }
    });

    info!("Sending request to: {}", config.endpoint_url);
    let response = reqwest::Client::new()
        .post(&config.endpoint_url)
        .bearer_auth(&config.api_key)
        .json(&payload)
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(Error::endpoint(format!("Request failed: {} {}", status, body)));
    }

    let glb_data = match serde_json::from_str::<ResponseEnvelope>(&body) {
        Ok(ResponseEnvelope::Success {
            status, glb_data, ..
        }) if status == SUCCESS_STATUS => glb_data,
        _ => return Err(Error::endpoint(format!("Unexpected response: {}", body))),
    };

    let glb_bytes = STANDARD
        .decode(glb_data)
        .map_err(|e| Error::endpoint(format!("glb_data is not valid base64: {}", e)))?;
    tokio::fs::write(&config.output_filename, glb_bytes).await?;

    info!("Saved model to `{}`", config.output_filename.display());
    Ok(config.output_filename.clone())
}
