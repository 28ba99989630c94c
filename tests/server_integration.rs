use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`
use trellis_worker::worker::Worker;

mod common;
use common::{
    FixedExporter, MockPipeline, create_test_app, create_test_worker, decode_glb, tiny_png_b64,
};

const FIXED_GLB: &[u8] = b"glTF-server-test";

fn create_mock_app() -> (Router, MockPipeline) {
    let pipeline = MockPipeline::new();
    let worker = create_test_worker(pipeline.clone(), FixedExporter::new(FIXED_GLB));
    (create_test_app(worker), pipeline)
}

fn post_json(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_run_endpoint_success() {
    let (app, pipeline) = create_mock_app();
    let body = json!({"id": "job-42", "input": {"images": [tiny_png_b64()], "seed": 42}});

    let (status, body) = send(app, post_json("/run", body.to_string())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "Model generated successfully.");
    assert_eq!(body["contentType"], "model/gltf-binary");
    assert_eq!(decode_glb(&body), FIXED_GLB);
    assert_eq!(pipeline.single_calls(), 1);
}

#[tokio::test]
async fn test_runsync_alias() {
    let (app, _) = create_mock_app();
    let body = json!({"input": {"images": [tiny_png_b64()]}});

    let (status, body) = send(app, post_json("/runsync", body.to_string())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
}

#[tokio::test]
async fn test_score_endpoint_takes_bare_input() {
    let (app, pipeline) = create_mock_app();
    let body = json!({"images": [tiny_png_b64(), tiny_png_b64()]});

    let (status, body) = send(app, post_json("/score", body.to_string())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(decode_glb(&body), FIXED_GLB);
    assert_eq!(pipeline.multi_calls(), 1);
}

#[tokio::test]
async fn test_missing_input_is_bad_request_envelope() {
    let (app, pipeline) = create_mock_app();

    let (status, body) = send(app, post_json("/run", json!({"id": "x"}).to_string())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"error": "Input must contain a JSON array of base64 strings called 'images'."})
    );
    assert!(pipeline.get_calls().is_empty());
}

#[tokio::test]
async fn test_empty_images_is_bad_request_envelope() {
    let (app, _) = create_mock_app();
    let body = json!({"input": {"images": []}});

    let (status, body) = send(app, post_json("/run", body.to_string())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "The 'images' array cannot be empty."}));
}

#[tokio::test]
async fn test_invalid_json_still_returns_envelope() {
    let (app, pipeline) = create_mock_app();

    let (status, body) = send(app, post_json("/run", "invalid json")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Invalid JSON body"));
    assert!(pipeline.get_calls().is_empty());
}

#[tokio::test]
async fn test_inference_failure_is_server_error() {
    let pipeline = MockPipeline::new().with_error("sampler diverged");
    let app = create_test_app(create_test_worker(pipeline, FixedExporter::new(FIXED_GLB)));
    let body = json!({"input": {"images": [tiny_png_b64()]}});

    let (status, body) = send(app, post_json("/run", body.to_string())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("sampler diverged"));
    assert!(body.get("glb_data").is_none());
}

#[tokio::test]
async fn test_health_ready() {
    let (app, _) = create_mock_app();
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["device"], "cuda");
}

#[tokio::test]
async fn test_uninitialized_worker() {
    let worker = Worker::uninitialized(Arc::new(FixedExporter::new(FIXED_GLB)));
    let app = create_test_app(worker);

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(app.clone(), request).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "not_initialized");

    let job = json!({"input": {"images": [tiny_png_b64()]}});
    let (status, body) = send(app, post_json("/run", job.to_string())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({"error": "Model is not initialized. Worker is in a failed state."})
    );
}
