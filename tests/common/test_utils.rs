use super::MockPipeline;
use axum::Router;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;
use trellis_worker::{
    export::Exporter,
    model::{ModelHandle, ModelLocation},
    server,
    worker::Worker,
};

pub const TEST_BODY_LIMIT: usize = 16 * 1024 * 1024;

/// Base64 PNG of the given width; widths let tests tell images apart.
pub fn png_b64(width: u32) -> String {
    let img = RgbaImage::from_pixel(width, 1, Rgba([200, 100, 50, 255]));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .expect("Failed to encode test PNG");
    STANDARD.encode(buf)
}

/// The 1x1 PNG used by the canonical request.
pub fn tiny_png_b64() -> String {
    png_b64(1)
}

pub fn create_test_handle(pipeline: MockPipeline) -> ModelHandle {
    ModelHandle::from_pipeline(
        Arc::new(pipeline),
        ModelLocation::Local(PathBuf::from("/workspace/TRELLIS-image-large")),
        "cuda",
    )
}

pub fn create_test_worker(pipeline: MockPipeline, exporter: impl Exporter + 'static) -> Worker {
    Worker::new(create_test_handle(pipeline), Arc::new(exporter))
}

pub fn create_test_app(worker: Worker) -> Router {
    server::router(Arc::new(worker), TEST_BODY_LIMIT)
}

/// Decode `glb_data` from a success envelope body.
pub fn decode_glb(body: &serde_json::Value) -> Vec<u8> {
    let glb = body["glb_data"]
        .as_str()
        .expect("glb_data missing from response");
    STANDARD.decode(glb).expect("glb_data is not base64")
}
