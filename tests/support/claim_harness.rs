#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};

use claimsight::agent::ClaimAgent;
use claimsight::app::seed::seed_policies;
use claimsight::providers::{Provider, ProviderMessage, ProviderResponse};
use claimsight::retrieval::{EmbeddingProvider, GuidelineRetriever};
use claimsight::store::{ChatHistory, DocumentStore, Namespace, SqliteDocumentStore};
use claimsight::tools::{ToolRegistry, ToolSpec, claim_tools};

pub const DIMS: usize = 32;
pub const INDEX: &str = "description_index";
pub const DATABASE: &str = "insurance_claims";

/// Hashed bag of words: texts sharing words land close under cosine.
pub struct KeywordEmbedding;

fn bucket(word: &str) -> usize {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in word.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    usize::try_from(hash % DIMS as u64).unwrap_or(0)
}

pub fn keyword_vector(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0_f32; DIMS];
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 2)
    {
        vector[bucket(&word.to_lowercase())] += 1.0;
    }
    vector
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedding {
    fn name(&self) -> &str {
        "keyword_test"
    }

    fn dimensions(&self) -> usize {
        DIMS
    }

    async fn embed(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| keyword_vector(text)).collect())
    }
}

/// Replays queued responses; answers "done" once the queue is empty.
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<ProviderResponse>>,
    pub calls: AtomicU32,
    pub transcripts: Mutex<Vec<Vec<ProviderMessage>>>,
    pub system_prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicU32::new(0),
            transcripts: Mutex::new(Vec::new()),
            system_prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    async fn chat_with_tools(
        &self,
        system_prompt: Option<&str>,
        messages: &[ProviderMessage],
        _tools: &[ToolSpec],
        _model: &str,
        _temperature: f64,
    ) -> anyhow::Result<ProviderResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.transcripts.lock().unwrap().push(messages.to_vec());
        self.system_prompts
            .lock()
            .unwrap()
            .push(system_prompt.unwrap_or_default().to_string());
        Ok(self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| ProviderResponse::text_only("done")))
    }
}

/// Requests `fetch_guidelines` on every turn.
pub struct AlwaysToolProvider {
    pub calls: AtomicU32,
}

#[async_trait]
impl Provider for AlwaysToolProvider {
    async fn chat_with_tools(
        &self,
        _system_prompt: Option<&str>,
        _messages: &[ProviderMessage],
        _tools: &[ToolSpec],
        _model: &str,
        _temperature: f64,
    ) -> anyhow::Result<ProviderResponse> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ProviderResponse::tool_call(
            format!("toolu_{n}"),
            "fetch_guidelines",
            json!({"query": "rear-end collision"}),
        ))
    }
}

pub fn policy_documents() -> Vec<Value> {
    vec![
        json!({
            "name": "Rear-End Collision",
            "type": "auto",
            "description": "Rear-end collision where a vehicle is struck from behind at a traffic light",
            "handlerActions": {
                "immediate": ["Check occupants for whiplash"],
                "within24Hours": ["Obtain police report"],
                "within72Hours": ["Assign liability to the following driver"]
            },
            "approvalThresholds": {"adjuster": {"maxAmount": 5000, "conditions": ["No injuries"]}},
            "documentationRequired": ["Photos", "Police report"]
        }),
        json!({
            "name": "School Bus Incident",
            "type": "commercial",
            "description": "School bus accident with passenger vehicle and children on board",
            "handlerActions": {"immediate": ["Escalate to claims manager"]},
            "documentationRequired": ["Passenger manifest"]
        }),
        json!({
            "name": "Flood Damage",
            "type": "auto",
            "description": "Vehicle submerged in flood water with engine damage",
            "documentationRequired": ["Water line photos"]
        }),
    ]
}

/// In-memory store seeded with three policies, plus the collaborators the
/// agent needs.
pub struct Harness {
    pub store: Arc<SqliteDocumentStore>,
    pub embedder: Arc<KeywordEmbedding>,
}

impl Harness {
    pub async fn seeded() -> Self {
        let harness = Self::empty().await;
        seed_policies(
            harness.store.as_ref(),
            harness.embedder.as_ref(),
            &Self::policies(),
            INDEX,
            DIMS,
            policy_documents(),
        )
        .await
        .unwrap();
        harness
    }

    pub async fn empty() -> Self {
        Self {
            store: Arc::new(SqliteDocumentStore::connect("sqlite::memory:").await.unwrap()),
            embedder: Arc::new(KeywordEmbedding),
        }
    }

    pub fn policies() -> Namespace {
        Namespace::new(DATABASE, "policy_documents")
    }

    pub fn recommendations() -> Namespace {
        Namespace::new(DATABASE, "recommendations")
    }

    pub fn history_namespace() -> Namespace {
        Namespace::new(DATABASE, "chat_history")
    }

    pub fn retriever(&self) -> GuidelineRetriever {
        GuidelineRetriever::new(
            self.store.clone(),
            self.embedder.clone(),
            Self::policies(),
            INDEX,
        )
    }

    pub fn history(&self) -> ChatHistory {
        ChatHistory::new(self.store.clone(), Self::history_namespace())
    }

    pub fn tools(&self) -> ToolRegistry {
        claim_tools(
            self.retriever(),
            self.store.clone(),
            Self::recommendations(),
            self.history(),
        )
    }

    pub fn agent(&self, provider: Arc<dyn Provider>) -> ClaimAgent {
        ClaimAgent::new(
            provider,
            Arc::new(self.tools()),
            self.store.clone(),
            Self::recommendations(),
            "test-model",
            0.0,
        )
        .with_history(self.history())
    }

    pub async fn recommendation_count(&self) -> u64 {
        self.store
            .count(&Self::recommendations(), &claimsight::store::Filter::All)
            .await
            .unwrap()
    }
}
