use std::sync::Arc;

use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use claimsight::app::seed::seed_policies;
use claimsight::claims::PolicyRecord;
use claimsight::retrieval::{EmbeddingProvider, GuidelineRetriever, OpenAiEmbedding};
use claimsight::store::{DocumentStore, Filter, SqliteDocumentStore};

use super::claim_harness::{DIMS, Harness, INDEX, keyword_vector, policy_documents};

/// Embeds each input the way the keyword test embedder does, returning the
/// items in reverse order with their indices.
struct KeywordResponder;

impl Respond for KeywordResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).unwrap_or_default();
        let inputs: Vec<String> = body["input"]
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(ToString::to_string))
                    .collect()
            })
            .unwrap_or_default();
        let data: Vec<Value> = inputs
            .iter()
            .enumerate()
            .rev()
            .map(|(index, text)| json!({"index": index, "embedding": keyword_vector(text)}))
            .collect();
        ResponseTemplate::new(200).set_body_json(json!({"data": data}))
    }
}

async fn remote_embedder(server: &MockServer) -> Arc<OpenAiEmbedding> {
    Arc::new(OpenAiEmbedding::new(
        &server.uri(),
        Some("sk-test"),
        "text-embedding-3-small",
        DIMS,
    ))
}

#[tokio::test]
async fn seeded_policies_are_found_through_remote_embeddings() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(KeywordResponder)
        .mount(&server)
        .await;

    let store = Arc::new(SqliteDocumentStore::connect("sqlite::memory:").await.unwrap());
    let embedder = remote_embedder(&server).await;
    let report = seed_policies(
        store.as_ref(),
        embedder.as_ref(),
        &Harness::policies(),
        INDEX,
        DIMS,
        policy_documents(),
    )
    .await
    .unwrap();
    assert_eq!(report.inserted, 3);
    assert_eq!(report.embedded, 3);

    let retriever = GuidelineRetriever::new(store.clone(), embedder, Harness::policies(), INDEX);

    let bus = retriever
        .fetch("school bus accident with children on board", 1)
        .await;
    assert_eq!(bus.name, "School Bus Incident");
    assert_eq!(bus.policy_type, "commercial");

    let flood = retriever.fetch("car submerged in flood water", 3).await;
    assert_eq!(flood.name, "Flood Damage");
    assert_eq!(flood.documentation_required, vec!["Water line photos".to_string()]);
}

#[tokio::test]
async fn embedding_outage_falls_back_to_the_default_policy() {
    let harness = Harness::seeded().await;
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let embedder = remote_embedder(&server).await;
    assert!(embedder.embed_one("bumper").await.is_err());

    let retriever = GuidelineRetriever::new(
        harness.store.clone(),
        embedder,
        Harness::policies(),
        INDEX,
    );
    assert_eq!(retriever.fetch("rear-end collision", 1).await, PolicyRecord::fallback());

    // Seeded policies are untouched by the failed lookup.
    let count = harness
        .store
        .count(&Harness::policies(), &Filter::All)
        .await
        .unwrap();
    assert_eq!(count, 3);
}

#[tokio::test]
async fn harness_retriever_matches_local_embeddings() {
    let harness = Harness::seeded().await;
    let record = harness
        .retriever()
        .fetch("vehicle struck from behind at a traffic light", 1)
        .await;
    assert_eq!(record.name, "Rear-End Collision");
    assert_eq!(
        record.handler_actions.within_24_hours,
        vec!["Obtain police report".to_string()]
    );
}
