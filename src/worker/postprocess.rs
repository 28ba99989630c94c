use crate::export::Exporter;
use crate::model::InferenceOutput;
use crate::{Error, Result};
use tracing::info;

/// Fraction of triangles removed before export.
pub const SIMPLIFY_RATIO: f32 = 0.95;
/// Edge length of the baked texture.
pub const TEXTURE_SIZE: u32 = 2048;

/// A finished binary scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset(Vec<u8>);

impl Asset {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

/// Export the first Gaussian/mesh pair of `output` into memory.
pub fn to_asset(exporter: &dyn Exporter, output: &InferenceOutput) -> Result<Asset> {
    let (gaussian, mesh) = output.first()?;

    info!("Converting model output to GLB format...");
    let exportable = exporter
        .to_binary_asset(gaussian, mesh, SIMPLIFY_RATIO, TEXTURE_SIZE)
        .map_err(into_postprocess)?;

    let mut bytes = Vec::new();
    exportable.export(&mut bytes).map_err(into_postprocess)?;

    if bytes.is_empty() {
        return Err(Error::postprocess("exporter produced an empty asset"));
    }
    Ok(Asset(bytes))
}

fn into_postprocess(e: Error) -> Error {
    match e {
        Error::Postprocess(_) => e,
        other => Error::postprocess(other.to_string()),
    }
}
