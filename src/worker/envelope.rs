use super::postprocess::Asset;
use crate::{Error, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

pub const SUCCESS_STATUS: &str = "success";
pub const SUCCESS_MESSAGE: &str = "Model generated successfully.";
pub const GLB_CONTENT_TYPE: &str = "model/gltf-binary";

/// The body returned for every job, success or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseEnvelope {
    Success {
        status: String,
        message: String,
        #[serde(rename = "contentType")]
        content_type: String,
        glb_data: String,
    },
    Failure {
        error: String,
    },
}

impl ResponseEnvelope {
    pub fn success(asset: &Asset) -> Self {
        Self::Success {
            status: SUCCESS_STATUS.to_string(),
            message: SUCCESS_MESSAGE.to_string(),
            content_type: GLB_CONTENT_TYPE.to_string(),
            glb_data: STANDARD.encode(asset.as_bytes()),
        }
    }

    pub fn failure(error: &Error) -> Self {
        Self::Failure {
            error: error.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

impl From<&Result<Asset>> for ResponseEnvelope {
    fn from(result: &Result<Asset>) -> Self {
        match result {
            Ok(asset) => Self::success(asset),
            Err(e) => Self::failure(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_failure_shape() {
        let envelope = ResponseEnvelope::failure(&Error::inference("CUDA out of memory"));
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({"error": "CUDA out of memory"})
        );
        assert!(!envelope.is_success());
    }

    #[test]
    fn test_envelope_parses_back() {
        let body = json!({
            "status": "success",
            "message": "Model generated successfully.",
            "contentType": "model/gltf-binary",
            "glb_data": "Z2xURg=="
        });
        let envelope: ResponseEnvelope = serde_json::from_value(body).unwrap();
        assert!(envelope.is_success());

        let envelope: ResponseEnvelope =
            serde_json::from_value(json!({"error": "boom"})).unwrap();
        assert_eq!(
            envelope,
            ResponseEnvelope::Failure {
                error: "boom".to_string()
            }
        );
    }
}
