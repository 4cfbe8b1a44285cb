use std::sync::Arc;
use std::sync::atomic::AtomicU32;

use serde_json::{Value, json};

use claimsight::claims::normalize_document;
use claimsight::error::AgentError;
use claimsight::providers::{ContentBlock, ProviderMessage, ProviderResponse};
use claimsight::store::{DocumentStore, Filter};

use super::claim_harness::{AlwaysToolProvider, Harness, ScriptedProvider};

const DESCRIPTION: &str = "A sedan was struck from behind at a traffic light. Rear bumper crushed.";

fn tool_results(messages: &[ProviderMessage]) -> Vec<(String, bool)> {
    messages
        .iter()
        .flat_map(|m| m.content.iter())
        .filter_map(|block| match block {
            ContentBlock::ToolResult {
                content, is_error, ..
            } => Some((content.clone(), *is_error)),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn agent_fetches_policy_and_persists_recommendation() {
    let harness = Harness::seeded().await;
    let recommendation = json!({
        "description": DESCRIPTION,
        "policy": "Rear-End Collision",
        "priority": 2,
        "recommendation": "Check occupants\nObtain police report"
    });
    let provider = Arc::new(ScriptedProvider::new(vec![
        ProviderResponse::tool_call(
            "toolu_1",
            "fetch_guidelines",
            json!({"query": "struck from behind at a traffic light"}),
        ),
        ProviderResponse::tool_call(
            "toolu_2",
            "persist_data",
            json!({"data": recommendation}),
        ),
        ProviderResponse::text_only(format!("FINAL ANSWER: {recommendation}")),
    ]));

    let run = harness.agent(provider.clone()).run(DESCRIPTION).await.unwrap();

    assert_eq!(provider.call_count(), 3);
    assert_eq!(run.rounds, 3);
    assert!(!run.self_persisted);
    assert!(!run.final_answer.starts_with("FINAL ANSWER"));
    assert_eq!(harness.recommendation_count().await, 1);

    // The policy fed back to the generator is the nearest seeded guideline.
    let transcripts = provider.transcripts.lock().unwrap().clone();
    let results = tool_results(transcripts.last().unwrap());
    assert_eq!(results.len(), 2);
    let policy: Value = serde_json::from_str(&results[0].0).unwrap();
    assert_eq!(policy["name"], "Rear-End Collision");
    assert!(!results[0].1);

    let stored = harness
        .store
        .find_by_id(&Harness::recommendations(), &run.object_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored["policy"], "Rear-End Collision");

    let normalized = normalize_document(stored);
    assert_eq!(normalized["priority"], "Medium");
    assert_eq!(
        normalized["recommendation"]["immediate_actions"],
        json!(["Check occupants", "Obtain police report"])
    );
    assert_eq!(normalized["_id"], run.object_id.as_str());
}

#[tokio::test]
async fn system_prompt_names_every_tool_and_the_marker() {
    let harness = Harness::seeded().await;
    let provider = Arc::new(ScriptedProvider::new(vec![ProviderResponse::text_only(
        "FINAL ANSWER: {\"priority\": 1, \"recommendation\": {}}",
    )]));

    harness.agent(provider.clone()).run(DESCRIPTION).await.unwrap();

    let prompt = provider.system_prompts.lock().unwrap()[0].clone();
    for name in ["clean_chat_history", "fetch_guidelines", "persist_data"] {
        assert!(prompt.contains(name), "prompt lacks {name}");
    }
    assert!(prompt.contains("FINAL ANSWER"));

    let first = provider.transcripts.lock().unwrap()[0].clone();
    let opening = first[0].text().unwrap();
    assert!(opening.starts_with("This is the description of the accident: "));
    assert!(opening.ends_with(DESCRIPTION));
}

#[tokio::test]
async fn json_in_final_answer_is_persisted_when_generator_skips_the_tool() {
    let harness = Harness::seeded().await;
    let provider = Arc::new(ScriptedProvider::new(vec![ProviderResponse::text_only(
        "FINAL ANSWER: Here you go {\"policy\": \"Rear-End Collision\", \"priority\": 4}",
    )]));

    let run = harness.agent(provider).run(DESCRIPTION).await.unwrap();

    assert!(run.self_persisted);
    let stored = harness
        .store
        .find_by_id(&Harness::recommendations(), &run.object_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored["policy"], "Rear-End Collision");
    let normalized = normalize_document(stored);
    assert_eq!(normalized["priority"], "Critical");
    assert_eq!(normalized["recommendation"]["immediate_actions"], json!([]));
}

#[tokio::test]
async fn plain_text_final_answer_is_wrapped_and_persisted() {
    let harness = Harness::seeded().await;
    let provider = Arc::new(ScriptedProvider::new(vec![ProviderResponse::text_only(
        "Send an adjuster to inspect the bumper.",
    )]));

    let run = harness.agent(provider).run(DESCRIPTION).await.unwrap();

    assert!(run.self_persisted);
    assert_eq!(run.final_answer, "Send an adjuster to inspect the bumper.");
    let stored = harness
        .store
        .find_by_id(&Harness::recommendations(), &run.object_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored["description"], DESCRIPTION);
    let normalized = normalize_document(stored);
    assert_eq!(normalized["priority"], "Standard");
    assert_eq!(
        normalized["recommendation"]["immediate_actions"],
        json!(["Send an adjuster to inspect the bumper."])
    );
}

#[tokio::test]
async fn failed_tool_call_is_reported_back_and_the_run_continues() {
    let harness = Harness::seeded().await;
    let provider = Arc::new(ScriptedProvider::new(vec![
        ProviderResponse::tool_call("toolu_1", "persist_data", json!({"data": [1, 2, 3]})),
        ProviderResponse::tool_call("toolu_2", "no_such_tool", json!({})),
        ProviderResponse::text_only("FINAL ANSWER: nothing to add"),
    ]));

    let run = harness.agent(provider.clone()).run(DESCRIPTION).await.unwrap();

    let transcripts = provider.transcripts.lock().unwrap().clone();
    let results = tool_results(transcripts.last().unwrap());
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|(content, is_error)| *is_error && content.starts_with("[ERROR]")));
    assert!(results[1].0.contains("no_such_tool"));
    assert!(run.self_persisted);
    assert_eq!(harness.recommendation_count().await, 1);
}

#[tokio::test]
async fn runs_leave_no_chat_history_behind() {
    let harness = Harness::seeded().await;
    let history = harness.history();
    history
        .append("unrelated-run", &ProviderMessage::user("kept"))
        .await
        .unwrap();

    let cleaned = Arc::new(ScriptedProvider::new(vec![
        ProviderResponse::tool_call(
            "toolu_1",
            "persist_data",
            json!({"data": {"description": "rear-end", "priority": 1}}),
        ),
        ProviderResponse::tool_call("toolu_2", "clean_chat_history", json!({})),
        ProviderResponse::text_only("FINAL ANSWER: {\"recommendation\": {}}"),
    ]));
    let cleaned_run = harness.agent(cleaned).run(DESCRIPTION).await.unwrap();
    assert!(history.messages(&cleaned_run.run_id).await.unwrap().is_empty());

    let uncleaned = Arc::new(ScriptedProvider::new(vec![ProviderResponse::text_only(
        "FINAL ANSWER: {\"recommendation\": {}}",
    )]));
    let uncleaned_run = harness.agent(uncleaned).run(DESCRIPTION).await.unwrap();
    assert!(history.messages(&uncleaned_run.run_id).await.unwrap().is_empty());

    let endless = Arc::new(AlwaysToolProvider {
        calls: AtomicU32::new(0),
    });
    let err = harness.agent(endless).run(DESCRIPTION).await.unwrap_err();
    assert!(matches!(err, AgentError::BudgetExceeded { .. }));

    let total = harness
        .store
        .count(&Harness::history_namespace(), &Filter::All)
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(history.messages("unrelated-run").await.unwrap().len(), 1);
}

#[tokio::test]
async fn fetch_on_an_empty_index_returns_the_fallback_policy() {
    let harness = Harness::empty().await;
    let provider = Arc::new(ScriptedProvider::new(vec![
        ProviderResponse::tool_call("toolu_1", "fetch_guidelines", json!({"query": "hail"})),
        ProviderResponse::text_only("FINAL ANSWER: {\"recommendation\": {}}"),
    ]));

    harness.agent(provider.clone()).run("Hail dented the roof").await.unwrap();

    let transcripts = provider.transcripts.lock().unwrap().clone();
    let results = tool_results(transcripts.last().unwrap());
    let policy: Value = serde_json::from_str(&results[0].0).unwrap();
    assert_eq!(policy["name"], "General Auto Collision Coverage");
    assert!(!results[0].1);
}
