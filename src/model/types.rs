use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Parameters for one diffusion stage of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplerParams {
    pub steps: u32,
    pub cfg_strength: f32,
}

/// Fixed sampler settings for the sparse-structure and structured-latent stages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplerConfig {
    pub sparse_structure: SamplerParams,
    pub slat: SamplerParams,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            sparse_structure: SamplerParams {
                steps: 30,
                cfg_strength: 7.5,
            },
            slat: SamplerParams {
                steps: 30,
                cfg_strength: 3.0,
            },
        }
    }
}

/// Sampler seed, kept exactly as the caller sent it.
///
/// Any JSON integer is accepted, negative and out-of-`i64` values included;
/// the inference runtime decides whether it can use it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "serde_json::Number", into = "serde_json::Number")]
pub struct Seed(serde_json::Number);

impl Seed {
    pub fn from_number(number: serde_json::Number) -> Option<Self> {
        if number.is_i64() || number.is_u64() {
            Some(Self(number))
        } else {
            None
        }
    }

    pub fn as_number(&self) -> &serde_json::Number {
        &self.0
    }
}

impl Default for Seed {
    fn default() -> Self {
        Self(1.into())
    }
}

impl From<i64> for Seed {
    fn from(value: i64) -> Self {
        Self(value.into())
    }
}

impl From<u64> for Seed {
    fn from(value: u64) -> Self {
        Self(value.into())
    }
}

impl TryFrom<serde_json::Number> for Seed {
    type Error = String;

    fn try_from(number: serde_json::Number) -> std::result::Result<Self, Self::Error> {
        Self::from_number(number.clone()).ok_or_else(|| format!("seed {} is not an integer", number))
    }
}

impl From<Seed> for serde_json::Number {
    fn from(seed: Seed) -> Self {
        seed.0
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Gaussian-splat output: one rendering primitive per index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GaussianSplat {
    pub positions: Vec<[f32; 3]>,
    /// Linear RGB in `[0, 1]`.
    pub colors: Vec<[f32; 3]>,
    pub opacities: Vec<f32>,
    pub scales: Vec<[f32; 3]>,
}

impl GaussianSplat {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        let n = self.positions.len();
        if self.colors.len() != n || self.opacities.len() != n || self.scales.len() != n {
            return Err(Error::inference(format!(
                "gaussian attribute lengths disagree: {} positions, {} colors, {} opacities, {} scales",
                n,
                self.colors.len(),
                self.opacities.len(),
                self.scales.len()
            )));
        }
        Ok(())
    }
}

/// Triangle mesh output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshData {
    pub vertices: Vec<[f32; 3]>,
    pub faces: Vec<[u32; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertex_colors: Option<Vec<[f32; 3]>>,
}

impl MeshData {
    pub fn validate(&self) -> Result<()> {
        let n = self.vertices.len();
        if let Some(colors) = &self.vertex_colors {
            if colors.len() != n {
                return Err(Error::inference(format!(
                    "mesh has {} vertices but {} vertex colors",
                    n,
                    colors.len()
                )));
            }
        }
        if let Some(face) = self.faces.iter().find(|f| f.iter().any(|&i| i as usize >= n)) {
            return Err(Error::inference(format!(
                "mesh face {:?} references a vertex outside 0..{}",
                face, n
            )));
        }
        Ok(())
    }
}

/// Raw pipeline output. Both collections are batches; consumers take element 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InferenceOutput {
    pub gaussian: Vec<GaussianSplat>,
    pub mesh: Vec<MeshData>,
}

impl InferenceOutput {
    /// The first Gaussian and mesh of the batch.
    pub fn first(&self) -> Result<(&GaussianSplat, &MeshData)> {
        let gaussian = self
            .gaussian
            .first()
            .ok_or_else(|| Error::postprocess("pipeline returned no gaussian output"))?;
        let mesh = self
            .mesh
            .first()
            .ok_or_else(|| Error::postprocess("pipeline returned no mesh output"))?;
        Ok((gaussian, mesh))
    }
}
