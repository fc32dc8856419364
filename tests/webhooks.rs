use axum::{
    Json, Router,
    body::Bytes,
    http::{StatusCode, header},
    response::IntoResponse,
    routing::post,
};
use dashboard::Config;
use dashboard::normalizer::normalize_payload;
use dashboard::webhooks::{ImageUpload, WebhookClient, WebhookError};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

/// Fake automation server; every request body is recorded per route.
#[derive(Clone, Default)]
struct Recorder {
    bodies: Arc<Mutex<Vec<(String, Value)>>>,
}

impl Recorder {
    fn push(&self, route: &str, body: &[u8]) {
        let value = serde_json::from_slice(body).unwrap_or(Value::Null);
        self.bodies.lock().unwrap().push((route.to_string(), value));
    }

    fn last(&self, route: &str) -> Option<Value> {
        self.bodies
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(r, _)| r == route)
            .map(|(_, v)| v.clone())
    }
}

async fn spawn_fake_n8n(recorder: Recorder) -> String {
    let json_rec = recorder.clone();
    let text_rec = recorder.clone();
    let image_rec = recorder.clone();
    let describe_rec = recorder.clone();

    let router = Router::new()
        .route(
            "/dataset/json",
            post(move |body: Bytes| async move {
                json_rec.push("dataset/json", &body);
                Json(json!({"data": [{"Month": "Jan", "Sales": 10}, {"Month": "Feb", "Sales": 20}]}))
            }),
        )
        .route(
            "/dataset/text",
            post(move |body: Bytes| async move {
                text_rec.push("dataset/text", &body);
                "Revenue grew from 120 to 180 this quarter"
            }),
        )
        .route(
            "/dataset/broken",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        )
        .route(
            "/image",
            post(move |body: Bytes| async move {
                image_rec.push("image", &body);
                ([(header::CONTENT_TYPE, "image/jpeg")], vec![0xffu8, 0xd8, 0xff, 0xe0]).into_response()
            }),
        )
        .route(
            "/describe",
            post(move |body: Bytes| async move {
                describe_rec.push("describe", &body);
                "A cat sitting on a windowsill"
            }),
        );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
    format!("http://{}", addr)
}

fn client(base: &str, dataset_route: &str) -> WebhookClient {
    let config = Config {
        dataset_url: Some(format!("{}/{}", base, dataset_route)),
        image_url: Some(format!("{}/image", base)),
        describe_url: Some(format!("{}/describe", base)),
        ..Config::default()
    };
    WebhookClient::new(&config).unwrap()
}

#[tokio::test]
async fn dataset_json_is_posted_empty_and_parsed() {
    let recorder = Recorder::default();
    let base = spawn_fake_n8n(recorder.clone()).await;

    let payload = client(&base, "dataset/json").fetch_dataset().await.unwrap();
    assert_eq!(recorder.last("dataset/json"), Some(json!({})));

    let records = normalize_payload(&payload);
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].name, "Feb");
    assert_eq!(records[1].get("Sales"), Some(20.0));
}

#[tokio::test]
async fn dataset_text_falls_back_to_a_string() {
    let base = spawn_fake_n8n(Recorder::default()).await;

    let payload = client(&base, "dataset/text").fetch_dataset().await.unwrap();
    assert_eq!(payload, json!("Revenue grew from 120 to 180 this quarter"));

    let records = normalize_payload(&payload);
    let values: Vec<f64> = records.iter().map(|r| r.value_or_zero("value")).collect();
    assert_eq!(values, vec![120.0, 180.0]);
}

#[tokio::test]
async fn non_success_status_becomes_an_error() {
    let base = spawn_fake_n8n(Recorder::default()).await;

    let err = client(&base, "dataset/broken")
        .fetch_dataset()
        .await
        .unwrap_err();
    assert!(matches!(err, WebhookError::Status { status: 500, .. }));
    assert_eq!(
        err.to_string(),
        "Webhook responded with 500 Internal Server Error"
    );
}

#[tokio::test]
async fn generated_image_keeps_bytes_and_content_type() {
    let recorder = Recorder::default();
    let base = spawn_fake_n8n(recorder.clone()).await;

    let image = client(&base, "dataset/json")
        .generate_image("  a red fox  ")
        .await
        .unwrap();
    assert_eq!(recorder.last("image"), Some(json!({"prompt": "a red fox"})));
    assert_eq!(image.content_type, "image/jpeg");
    assert_eq!(image.bytes, vec![0xff, 0xd8, 0xff, 0xe0]);
}

#[tokio::test]
async fn description_request_carries_base64_image() {
    let recorder = Recorder::default();
    let base = spawn_fake_n8n(recorder.clone()).await;
    let upload = ImageUpload {
        filename: "cat.png".to_string(),
        mime_type: "image/png".to_string(),
        bytes: vec![1, 2, 3],
    };

    let description = client(&base, "dataset/json")
        .describe_image(&upload)
        .await
        .unwrap();
    assert_eq!(description, "A cat sitting on a windowsill");
    assert_eq!(
        recorder.last("describe"),
        Some(json!({"image": "AQID", "filename": "cat.png", "mimeType": "image/png"}))
    );
}
