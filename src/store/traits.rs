use super::record_id::RecordId;
use crate::error::StoreError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use strum::{Display, EnumString};

/// `database.collection` pair addressing one set of documents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Namespace {
    pub database: String,
    pub collection: String,
}

impl Namespace {
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}

/// Document selector over top-level JSON fields.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    All,
    Eq(String, Value),
    Prefix(String, String),
    Exists(String),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq(field.into(), value.into())
    }

    pub fn prefix(field: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self::Prefix(field.into(), prefix.into())
    }

    pub fn exists(field: impl Into<String>) -> Self {
        Self::Exists(field.into())
    }

    /// In-memory evaluation, matching what the SQL rendition selects.
    pub fn matches(&self, document: &Value) -> bool {
        match self {
            Self::All => true,
            Self::Eq(field, expected) => document
                .get(field)
                .map_or(expected.is_null(), |actual| actual == expected),
            Self::Prefix(field, prefix) => document
                .get(field)
                .and_then(Value::as_str)
                .is_some_and(|text| text.starts_with(prefix.as_str())),
            Self::Exists(field) => document.get(field).is_some(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum Similarity {
    #[default]
    Cosine,
    DotProduct,
    Euclidean,
}

/// Named nearest-neighbour index over one vector field of a namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorIndexDefinition {
    pub name: String,
    pub namespace: Namespace,
    /// Top-level field holding the embedding array
    pub path: String,
    pub dimensions: usize,
    pub similarity: Similarity,
}

#[derive(Debug, Clone)]
pub struct VectorHit {
    pub id: RecordId,
    pub score: f32,
    pub document: Value,
}

/// JSON document store with named vector indexes.
///
/// Documents returned by reads carry their id under `_id` as a string.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a new document; never upserts. Any `_id` in `document` is
    /// replaced by a freshly generated id.
    async fn insert(&self, namespace: &Namespace, document: Value)
    -> Result<RecordId, StoreError>;

    async fn find_by_id(
        &self,
        namespace: &Namespace,
        id: &RecordId,
    ) -> Result<Option<Value>, StoreError>;

    /// Matching documents in insertion order.
    async fn find(
        &self,
        namespace: &Namespace,
        filter: &Filter,
        limit: Option<usize>,
    ) -> Result<Vec<Value>, StoreError>;

    async fn find_one(
        &self,
        namespace: &Namespace,
        filter: &Filter,
    ) -> Result<Option<Value>, StoreError> {
        Ok(self.find(namespace, filter, Some(1)).await?.into_iter().next())
    }

    async fn delete_many(&self, namespace: &Namespace, filter: &Filter)
    -> Result<u64, StoreError>;

    async fn count(&self, namespace: &Namespace, filter: &Filter) -> Result<u64, StoreError>;

    /// Create or replace an index definition.
    async fn define_vector_index(&self, definition: &VectorIndexDefinition)
    -> Result<(), StoreError>;

    async fn vector_index(&self, name: &str) -> Result<Option<VectorIndexDefinition>, StoreError>;

    /// Top-`k` documents of the index's namespace by similarity to `query`,
    /// best first. Documents whose vector is missing or has the wrong
    /// length are skipped.
    async fn vector_search(
        &self,
        index: &str,
        query: &[f32],
        k: usize,
        filter: Option<&Filter>,
    ) -> Result<Vec<VectorHit>, StoreError>;
}
