use super::context::AppContext;
use super::seed::{load_policy_file, seed_policies};
use super::status::render_status;
use crate::claims::normalize_document;
use crate::cli::Commands;
use crate::config::Config;
use crate::gateway;
use anyhow::Result;
use std::path::Path;

/// Run the agent once and print the normalized recommendation document.
async fn run_once(ctx: &AppContext, description: &str) -> Result<()> {
    let agent = ctx.agent();
    let run = agent.run(description).await?;

    let Some(document) = ctx
        .store
        .find_by_id(agent.recommendations(), &run.object_id)
        .await?
    else {
        anyhow::bail!("recommendation {} was not found after the run", run.object_id);
    };

    println!("{}", serde_json::to_string_pretty(&normalize_document(document))?);
    Ok(())
}

async fn fetch(ctx: &AppContext, query: &str, n: usize) -> Result<()> {
    let record = ctx.retriever().fetch(query, n).await;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

async fn seed(ctx: &AppContext, file: &Path) -> Result<()> {
    let records = load_policy_file(file)?;
    let report = seed_policies(
        ctx.store.as_ref(),
        ctx.embedder.as_ref(),
        &ctx.policies(),
        &ctx.storage.vector_index,
        ctx.config.embedding.dimensions,
        records,
    )
    .await?;
    println!(
        "✓ {} policies imported into {} ({} embedded), index {} registered",
        report.inserted,
        ctx.policies(),
        report.embedded,
        ctx.storage.vector_index
    );
    Ok(())
}

pub async fn dispatch(command: Commands, config: Config) -> Result<()> {
    let ctx = AppContext::build(config).await?;

    match command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| ctx.config.gateway.host.clone());
            let port = port.unwrap_or(ctx.config.gateway.port);
            gateway::run_gateway(&host, port, ctx.app_state(), &ctx.config.gateway).await
        }
        Commands::Run { description } => run_once(&ctx, &description).await,
        Commands::Fetch { query, n } => fetch(&ctx, &query, n).await,
        Commands::Seed { file } => seed(&ctx, &file).await,
        Commands::Doctor => {
            println!("{}", render_status(&ctx).await?);
            Ok(())
        }
    }
}
