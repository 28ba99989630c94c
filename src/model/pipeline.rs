use super::types::{InferenceOutput, SamplerConfig, Seed};
use crate::Result;
use async_trait::async_trait;
use image::DynamicImage;

/// The image-to-3D generative pipeline.
///
/// Implementations are not expected to tolerate concurrent calls; the host
/// delivers one job at a time to each process.
#[async_trait]
pub trait Pipeline: Send + Sync {
    /// Generate from a single conditioning image.
    async fn run(
        &self,
        image: &DynamicImage,
        seed: &Seed,
        sampler: &SamplerConfig,
    ) -> Result<InferenceOutput>;

    /// Generate from several views of the same object, fused in order.
    async fn run_multi(
        &self,
        images: &[DynamicImage],
        seed: &Seed,
        sampler: &SamplerConfig,
    ) -> Result<InferenceOutput>;
}
