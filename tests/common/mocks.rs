use async_trait::async_trait;
use image::DynamicImage;
use std::sync::{Arc, Mutex};
use trellis_worker::{
    Error, Result,
    export::{Exportable, Exporter},
    model::{GaussianSplat, InferenceOutput, MeshData, Pipeline, SamplerConfig, Seed},
};

/// One recorded pipeline invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineCall {
    Single {
        width: u32,
        seed: Seed,
        sampler: SamplerConfig,
    },
    Multi {
        widths: Vec<u32>,
        seed: Seed,
        sampler: SamplerConfig,
    },
}

/// Mock pipeline that records calls and returns output derived from the seed.
#[derive(Debug, Clone, Default)]
pub struct MockPipeline {
    pub calls: Arc<Mutex<Vec<PipelineCall>>>,
    pub error: Option<String>,
    pub empty_output: bool,
}

impl MockPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_error(mut self, error: &str) -> Self {
        self.error = Some(error.to_string());
        self
    }

    pub fn with_empty_output(mut self) -> Self {
        self.empty_output = true;
        self
    }

    pub fn get_calls(&self) -> Vec<PipelineCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn single_calls(&self) -> usize {
        self.get_calls()
            .iter()
            .filter(|c| matches!(c, PipelineCall::Single { .. }))
            .count()
    }

    pub fn multi_calls(&self) -> usize {
        self.get_calls()
            .iter()
            .filter(|c| matches!(c, PipelineCall::Multi { .. }))
            .count()
    }

    fn respond(&self, seed: &Seed) -> Result<InferenceOutput> {
        if let Some(ref error) = self.error {
            return Err(Error::inference(error.clone()));
        }
        if self.empty_output {
            return Ok(InferenceOutput::default());
        }
        Ok(create_mock_output(seed))
    }
}

#[async_trait]
impl Pipeline for MockPipeline {
    async fn run(
        &self,
        image: &DynamicImage,
        seed: &Seed,
        sampler: &SamplerConfig,
    ) -> Result<InferenceOutput> {
        self.calls.lock().unwrap().push(PipelineCall::Single {
            width: image.width(),
            seed: seed.clone(),
            sampler: *sampler,
        });
        self.respond(seed)
    }

    async fn run_multi(
        &self,
        images: &[DynamicImage],
        seed: &Seed,
        sampler: &SamplerConfig,
    ) -> Result<InferenceOutput> {
        self.calls.lock().unwrap().push(PipelineCall::Multi {
            widths: images.iter().map(|i| i.width()).collect(),
            seed: seed.clone(),
            sampler: *sampler,
        });
        self.respond(seed)
    }
}

/// Exporter whose output is always the same bytes.
#[derive(Debug, Clone)]
pub struct FixedExporter {
    pub bytes: Vec<u8>,
    pub error: Option<String>,
    pub calls: Arc<Mutex<Vec<(f32, u32)>>>,
}

impl FixedExporter {
    pub fn new(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
            error: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_error(mut self, error: &str) -> Self {
        self.error = Some(error.to_string());
        self
    }
}

struct BytesExportable(Vec<u8>);

impl Exportable for BytesExportable {
    fn export(&self, destination: &mut dyn std::io::Write) -> Result<()> {
        destination.write_all(&self.0)?;
        Ok(())
    }
}

impl Exporter for FixedExporter {
    fn to_binary_asset(
        &self,
        _gaussian: &GaussianSplat,
        _mesh: &MeshData,
        simplify: f32,
        texture_size: u32,
    ) -> Result<Box<dyn Exportable>> {
        self.calls.lock().unwrap().push((simplify, texture_size));
        if let Some(ref error) = self.error {
            return Err(Error::postprocess(error.clone()));
        }
        Ok(Box::new(BytesExportable(self.bytes.clone())))
    }
}

/// Exporter that serializes its input, so the asset reflects what the
/// pipeline produced.
#[derive(Debug, Clone, Default)]
pub struct EchoExporter;

impl Exporter for EchoExporter {
    fn to_binary_asset(
        &self,
        gaussian: &GaussianSplat,
        mesh: &MeshData,
        _simplify: f32,
        _texture_size: u32,
    ) -> Result<Box<dyn Exportable>> {
        let bytes = serde_json::to_vec(&(gaussian, mesh))?;
        Ok(Box::new(BytesExportable(bytes)))
    }
}

/// A tetrahedron and one Gaussian whose colour encodes the seed.
pub fn create_mock_output(seed: &Seed) -> InferenceOutput {
    let shade = (seed.as_number().as_i64().unwrap_or(0).rem_euclid(256)) as f32 / 255.0;
    InferenceOutput {
        gaussian: vec![GaussianSplat {
            positions: vec![[0.25, 0.25, 0.25]],
            colors: vec![[shade, 0.5, 1.0 - shade]],
            opacities: vec![1.0],
            scales: vec![[0.05; 3]],
        }],
        mesh: vec![MeshData {
            vertices: vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [0.0, 0.0, 1.0],
            ],
            faces: vec![[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]],
            vertex_colors: None,
        }],
    }
}
