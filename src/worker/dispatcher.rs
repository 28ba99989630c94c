use crate::model::{InferenceOutput, Pipeline, SamplerConfig, Seed};
use crate::{Error, Result};
use image::DynamicImage;
use tracing::info;

use super::decoder::EMPTY_IMAGES;

/// Route to the single- or multi-image entry point.
///
/// One image goes to `run`, several go to `run_multi` in their original order.
/// Pipeline failures come back as `Error::Inference` and are never retried.
pub async fn infer(
    pipeline: &dyn Pipeline,
    images: &[DynamicImage],
    seed: &Seed,
    sampler: &SamplerConfig,
) -> Result<InferenceOutput> {
    let result = match images {
        [] => return Err(Error::validation(EMPTY_IMAGES)),
        [image] => {
            info!("Running single-image inference (seed={})", seed);
            pipeline.run(image, seed, sampler).await
        }
        many => {
            info!(
                "Running multi-image inference over {} images (seed={})",
                many.len(),
                seed
            );
            pipeline.run_multi(many, seed, sampler).await
        }
    };

    let output = result.map_err(|e| match e {
        Error::Inference(_) => e,
        other => Error::inference(other.to_string()),
    })?;

    info!(
        "Model inference completed ({} gaussian, {} mesh)",
        output.gaussian.len(),
        output.mesh.len()
    );
    Ok(output)
}
