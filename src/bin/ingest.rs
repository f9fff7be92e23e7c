use anyhow::Context;
use log::{error, info, warn};
use std::sync::Arc;

use ragproxy_core::config::IngestConfig;
use ragproxy_core::ingest::base::{self, IngestReport};
use ragproxy_core::transformers::providers::openai::OpenAIProvider;
use ragproxy_core::vectorstore::pinecone::PineconeStore;

#[tokio::main]
async fn main() {
    let dotenv_result = dotenv::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(e) = dotenv_result {
        warn!("no .env file loaded: {}", e);
    }

    match ingest().await {
        Ok(report) => info!(
            "ingestion complete: {} chunks in {} batches",
            report.chunks, report.batches
        ),
        Err(e) => {
            error!("ingestion failed: {:#}", e);
            std::process::exit(1);
        }
    }
}

async fn ingest() -> anyhow::Result<IngestReport> {
    let cfg = IngestConfig::from_env().context("failed to load configuration")?;
    let embedder = Arc::new(OpenAIProvider::new(
        Some(cfg.store.openai_base_url.clone()),
        cfg.store.openai_api_key.clone(),
        cfg.store.embedding_request_timeout,
    ));
    let store = PineconeStore::new(&cfg.store, embedder)?;
    info!("ingesting {}", cfg.document_path);
    let report = base::run(&cfg, &store).await?;
    Ok(report)
}
