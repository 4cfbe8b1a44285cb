use crate::claims::policy::{DESCRIPTION_FIELD, EMBEDDING_FIELD};
use crate::retrieval::EmbeddingProvider;
use crate::store::vector::vector_to_json;
use crate::store::{DocumentStore, Namespace, Similarity, VectorIndexDefinition};
use anyhow::{Context, bail};
use serde_json::Value;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub inserted: usize,
    pub embedded: usize,
}

/// Read a JSON array of policy records.
pub fn load_policy_file(path: &Path) -> anyhow::Result<Vec<Value>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    match serde_json::from_str::<Value>(&raw)
        .with_context(|| format!("{} is not valid JSON", path.display()))?
    {
        Value::Array(records) => Ok(records),
        _ => bail!("{} must hold a JSON array of policy records", path.display()),
    }
}

/// Insert policy records, embedding `description` into
/// `descriptionEmbedding` where the vector is absent, then register the
/// cosine vector index over that field.
pub async fn seed_policies(
    store: &dyn DocumentStore,
    embedder: &dyn EmbeddingProvider,
    policies: &Namespace,
    index_name: &str,
    dimensions: usize,
    mut records: Vec<Value>,
) -> anyhow::Result<SeedReport> {
    let mut pending = Vec::new();
    for (i, record) in records.iter().enumerate() {
        let Some(object) = record.as_object() else {
            bail!("policy record #{i} is not a JSON object");
        };
        if object.contains_key(EMBEDDING_FIELD) {
            continue;
        }
        if let Some(description) = object.get(DESCRIPTION_FIELD).and_then(Value::as_str)
            && !description.trim().is_empty()
        {
            pending.push((i, description.to_string()));
        }
    }

    if !pending.is_empty() {
        let texts: Vec<&str> = pending.iter().map(|(_, text)| text.as_str()).collect();
        let vectors = embedder
            .embed(&texts)
            .await
            .context("embedding policy descriptions failed")?;
        if vectors.len() != pending.len() {
            bail!(
                "embedding provider '{}' returned {} vectors for {} descriptions",
                embedder.name(),
                vectors.len(),
                pending.len()
            );
        }
        for ((i, _), vector) in pending.iter().zip(vectors) {
            if vector.len() != dimensions {
                bail!(
                    "embedding has {} dimensions, expected {dimensions}",
                    vector.len()
                );
            }
            if let Some(object) = records[*i].as_object_mut() {
                object.insert(EMBEDDING_FIELD.to_string(), vector_to_json(&vector));
            }
        }
    }

    let inserted = records.len();
    for record in records {
        store.insert(policies, record).await?;
    }

    store
        .define_vector_index(&VectorIndexDefinition {
            name: index_name.to_string(),
            namespace: policies.clone(),
            path: EMBEDDING_FIELD.to_string(),
            dimensions,
            similarity: Similarity::Cosine,
        })
        .await?;

    tracing::info!(
        inserted,
        embedded = pending.len(),
        index = index_name,
        "policies seeded"
    );
    Ok(SeedReport {
        inserted,
        embedded: pending.len(),
    })
}
