mod handle;
mod pipeline;
mod remote;
mod types;

pub use handle::{ModelHandle, ModelLocation, PipelineManifest, resolve_location};
pub use pipeline::Pipeline;
pub use remote::RemotePipeline;
pub use types::*;
