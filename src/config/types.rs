use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub logs: LogsConfig,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Where the weights live and how the inference runtime should load them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Explicit weights directory; skips every lookup convention.
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default = "default_volume_roots")]
    pub volume_roots: Vec<PathBuf>,
    #[serde(default = "default_dir_name")]
    pub dir_name: String,
    #[serde(default = "default_platform_env")]
    pub platform_env: String,
    #[serde(default = "default_platform_subdir")]
    pub platform_subdir: String,
    /// Hub identifier used only when no local weights directory exists.
    #[serde(default)]
    pub registry_id: Option<String>,
    #[serde(default = "default_device")]
    pub device: String,
    #[serde(default = "default_attn_backend")]
    pub attn_backend: String,
    #[serde(default = "default_spconv_algo")]
    pub spconv_algo: String,
    #[serde(default)]
    pub backend: BackendConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_backend_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            logs: LogsConfig::default(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: None,
            volume_roots: default_volume_roots(),
            dir_name: default_dir_name(),
            platform_env: default_platform_env(),
            platform_subdir: default_platform_subdir(),
            registry_id: None,
            device: default_device(),
            attn_backend: default_attn_backend(),
            spconv_algo: default_spconv_algo(),
            backend: BackendConfig::default(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_body_bytes() -> usize {
    64 * 1024 * 1024
}

fn default_volume_roots() -> Vec<PathBuf> {
    vec![PathBuf::from("/runpod-volume"), PathBuf::from("/workspace")]
}

fn default_dir_name() -> String {
    "TRELLIS-image-large".to_string()
}

fn default_platform_env() -> String {
    "AZUREML_MODEL_DIR".to_string()
}

fn default_platform_subdir() -> String {
    "image_to_3d_model".to_string()
}

fn default_device() -> String {
    "cuda".to_string()
}

fn default_attn_backend() -> String {
    "xformers".to_string()
}

fn default_spconv_algo() -> String {
    "native".to_string()
}

fn default_backend_url() -> String {
    "http://127.0.0.1:9000".to_string()
}

fn default_timeout_secs() -> u64 {
    600
}
