use crate::model::Seed;
use crate::{Error, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::DynamicImage;
use serde_json::Value;

pub const MALFORMED_IMAGES: &str =
    "Input must contain a JSON array of base64 strings called 'images'.";
pub const EMPTY_IMAGES: &str = "The 'images' array cannot be empty.";

/// A validated job: decoded images in caller order plus the sampler seed.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub images: Vec<DynamicImage>,
    pub seed: Seed,
}

/// Validate a job input and decode every image.
///
/// Decoding is all-or-nothing: the first blob that is not base64 or not an
/// image aborts the whole request.
pub fn decode(input: &Value) -> Result<GenerationRequest> {
    let blobs = input
        .get("images")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::validation(MALFORMED_IMAGES))?;

    let images = blobs
        .iter()
        .enumerate()
        .map(|(i, blob)| decode_image(i, blob))
        .collect::<Result<Vec<_>>>()?;

    if images.is_empty() {
        return Err(Error::validation(EMPTY_IMAGES));
    }

    let seed = match input.get("seed") {
        None | Some(Value::Null) => Seed::default(),
        Some(Value::Number(n)) => Seed::from_number(n.clone())
            .ok_or_else(|| Error::validation("'seed' must be an integer."))?,
        Some(_) => return Err(Error::validation("'seed' must be an integer.")),
    };

    Ok(GenerationRequest { images, seed })
}

fn decode_image(index: usize, blob: &Value) -> Result<DynamicImage> {
    let encoded = blob
        .as_str()
        .ok_or_else(|| Error::decode(format!("image {} is not a base64 string", index)))?;
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| Error::decode(format!("image {}: invalid base64: {}", index, e)))?;
    image::load_from_memory(&bytes)
        .map_err(|e| Error::decode(format!("image {}: {}", index, e)))
}
