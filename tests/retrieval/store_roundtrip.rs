use serde_json::json;

use claimsight::claims::normalize_document;
use claimsight::store::{DocumentStore, RecordId, SqliteDocumentStore};

use super::claim_harness::Harness;

#[tokio::test]
async fn persisted_recommendation_reads_back_field_for_field() {
    let dir = tempfile::tempdir().unwrap();
    let uri = format!("sqlite://{}", dir.path().join("claims.db").display());
    let document = json!({
        "description": "Hail dented the roof",
        "priority": 1,
        "recommendation": {
            "immediate_actions": ["Photograph roof"],
            "short_term_actions": ["Schedule PDR estimate"],
            "approval_guidance": {"tier": "adjuster"},
            "reserve_recommendations": {"amount": 1200}
        },
        "nested": {"list": [1, 2.5, null, true]}
    });

    let id = {
        let store = SqliteDocumentStore::connect(&uri).await.unwrap();
        store
            .insert(&Harness::recommendations(), document.clone())
            .await
            .unwrap()
    };

    // Reopen to read from disk rather than a live pool.
    let store = SqliteDocumentStore::connect(&uri).await.unwrap();
    let stored = store
        .find_by_id(&Harness::recommendations(), &id)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(stored["_id"], id.as_str());
    for key in ["description", "priority", "recommendation", "nested"] {
        assert_eq!(stored[key], document[key], "field {key} differs");
    }

    let normalized = normalize_document(stored.clone());
    assert_eq!(normalized["priority"], "Low");
    assert_eq!(normalized["recommendation"], document["recommendation"]);
    assert_eq!(normalize_document(normalized.clone()), normalized);
}

#[tokio::test]
async fn unknown_ids_read_back_as_none() {
    let harness = Harness::empty().await;
    let missing = RecordId::generate();
    assert!(
        harness
            .store
            .find_by_id(&Harness::recommendations(), &missing)
            .await
            .unwrap()
            .is_none()
    );
}
