use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use claimsight::config::GatewayConfig;
use claimsight::gateway::{AppState, DescriptionCache, REQUEST_ID_HEADER, router};
use claimsight::providers::{ImageDescriber, ImageUpload, ProviderResponse, TextStream};

use super::claim_harness::{Harness, ScriptedProvider};

const BOUNDARY: &str = "claimsight-gateway-boundary";

struct ChunkedDescriber;

#[async_trait]
impl ImageDescriber for ChunkedDescriber {
    async fn describe_image(
        &self,
        image: &ImageUpload,
        _prompt: &str,
        model: &str,
        _temperature: f64,
    ) -> anyhow::Result<TextStream> {
        let chunks = vec![
            Ok(format!("[{model}] ")),
            Ok(format!("{} bytes: ", image.bytes.len())),
            Ok("sedan struck from behind at a traffic light".to_string()),
        ];
        Ok(Box::pin(futures_util::stream::iter(chunks)))
    }
}

fn multipart_body(content_type: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"crash.png\"\r\n\
         Content-Type: {content_type}\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn serve(harness: &Harness, responses: Vec<ProviderResponse>, config: &GatewayConfig) -> String {
    let provider = Arc::new(ScriptedProvider::new(responses));
    let state = AppState {
        describer: Arc::new(ChunkedDescriber),
        agent: Arc::new(harness.agent(provider)),
        store: harness.store.clone(),
        cache: Arc::new(DescriptionCache::default()),
        vision_model: "vision-test".into(),
        temperature: 0.0,
    };
    let app = router(state, config);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn upload(client: &reqwest::Client, base: &str, content_type: &str, bytes: &[u8]) -> reqwest::Response {
    client
        .post(format!("{base}/imageDescriptor"))
        .header(
            reqwest::header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(multipart_body(content_type, bytes))
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn upload_description_then_run_agent() {
    let harness = Harness::seeded().await;
    let base = serve(
        &harness,
        vec![
            ProviderResponse::tool_call(
                "toolu_1",
                "fetch_guidelines",
                json!({"query": "struck from behind"}),
            ),
            ProviderResponse::tool_call(
                "toolu_2",
                "persist_data",
                json!({"data": {
                    "description": "rear-end",
                    "priority": 3,
                    "recommendation": "• Photograph bumper • Request police report",
                    "claim_handler": "Unit 7"
                }}),
            ),
            ProviderResponse::text_only("FINAL ANSWER: persisted"),
        ],
        &GatewayConfig::default(),
    )
    .await;
    let client = reqwest::Client::new();

    let root: Value = client.get(&base).send().await.unwrap().json().await.unwrap();
    assert_eq!(root["message"], "Server is running");

    let response = upload(&client, &base, "image/png", b"\x89PNG fake").await;
    assert_eq!(response.status(), 200);
    assert!(
        response.headers()[reqwest::header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain")
    );
    let request_id = response.headers()[REQUEST_ID_HEADER].to_str().unwrap().to_string();
    let text = response.text().await.unwrap();
    assert_eq!(text, "[vision-test] 9 bytes: sedan struck from behind at a traffic light");

    let health: Value = client
        .get(format!("{base}/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["cached_descriptions"], 1);

    let response = client
        .post(format!("{base}/runAgent"))
        .json(&json!({"request_id": request_id}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let document: Value = response.json().await.unwrap();
    assert_eq!(document["priority"], "High");
    assert_eq!(document["claim_handler"], "Unit 7");
    assert_eq!(
        document["recommendation"]["immediate_actions"],
        json!(["Photograph bumper", "Request police report"])
    );
    assert_eq!(document["recommendation"]["approval_guidance"], json!({}));
    assert_eq!(harness.recommendation_count().await, 1);
}

#[tokio::test]
async fn model_id_query_overrides_the_configured_vision_model() {
    let harness = Harness::seeded().await;
    let base = serve(&harness, Vec::new(), &GatewayConfig::default()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/imageDescriptor?model_id=other-vision"))
        .header(
            reqwest::header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(multipart_body("image/jpeg", b"jpg"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert!(response.text().await.unwrap().starts_with("[other-vision] "));
}

#[tokio::test]
async fn rejected_requests_carry_a_detail_message() {
    let harness = Harness::seeded().await;
    let base = serve(&harness, Vec::new(), &GatewayConfig::default()).await;
    let client = reqwest::Client::new();

    let response = upload(&client, &base, "application/pdf", b"%PDF").await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["detail"], "File must be an image");

    let response = client
        .post(format!("{base}/runAgent?request_id=never-uploaded"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["detail"], "Image description not yet available");
    assert_eq!(harness.recommendation_count().await, 0);
}

#[tokio::test]
async fn oversized_uploads_are_refused() {
    let harness = Harness::seeded().await;
    let config = GatewayConfig {
        max_upload_bytes: 64,
        ..GatewayConfig::default()
    };
    let base = serve(&harness, Vec::new(), &config).await;
    let client = reqwest::Client::new();

    let response = upload(&client, &base, "image/png", &[0_u8; 1024]).await;

    assert_eq!(response.status(), 413);
}
