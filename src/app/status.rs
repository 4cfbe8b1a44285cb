use super::context::AppContext;
use crate::claims::policy::{DESCRIPTION_FIELD, EMBEDDING_FIELD};
use crate::store::Filter;

/// Human-readable report of the store: collection sizes, policy readiness
/// for retrieval, and the vector index definition.
pub async fn render_status(ctx: &AppContext) -> anyhow::Result<String> {
    let store = ctx.store.as_ref();
    let policies = ctx.policies();

    let policy_count = store.count(&policies, &Filter::All).await?;
    let described = store
        .count(&policies, &Filter::exists(DESCRIPTION_FIELD))
        .await?;
    let embedded = store
        .count(&policies, &Filter::exists(EMBEDDING_FIELD))
        .await?;
    let recommendations = store.count(&ctx.recommendations(), &Filter::All).await?;
    let history = store.count(&ctx.history_namespace(), &Filter::All).await?;

    let mut lines = vec![
        format!("◆ claimsight {}", env!("CARGO_PKG_VERSION")),
        String::new(),
        format!("config          {}", ctx.config.config_path.display()),
        format!("database        {} ({})", ctx.storage.database, ctx.storage.uri),
        format!("agent model     {}", ctx.config.llm.agent_model),
        format!("vision model    {}", ctx.config.llm.vision_model),
        format!(
            "embeddings      {} ({} dims)",
            ctx.embedder.name(),
            ctx.config.embedding.dimensions
        ),
        String::new(),
        format!("{:<40} {policy_count} documents", policies.to_string()),
        format!("  with {DESCRIPTION_FIELD:<22} {described}"),
        format!("  with {EMBEDDING_FIELD:<22} {embedded}"),
        format!("{:<40} {recommendations} documents", ctx.recommendations().to_string()),
        format!("{:<40} {history} documents", ctx.history_namespace().to_string()),
        String::new(),
    ];

    match store.vector_index(&ctx.storage.vector_index).await? {
        Some(index) => lines.push(format!(
            "vector index    {} on {}.{} ({} dims, {})",
            index.name, index.namespace, index.path, index.dimensions, index.similarity
        )),
        None => lines.push(format!(
            "vector index    {} is not defined (run `claimsight seed`)",
            ctx.storage.vector_index
        )),
    }

    if embedded < policy_count {
        lines.push(format!(
            "! {} policies have no embedding and cannot be retrieved",
            policy_count - embedded
        ));
    }

    Ok(lines.join("\n"))
}
