use actix_web::web;
use std::sync::Arc;

use crate::routes::{chat, health};
use ragproxy_core::cache::PromptCache;
use ragproxy_core::chat::ops::{Augmenter, PromptRenderer};
use ragproxy_core::chat::types::PromptTemplate;
use ragproxy_core::config::ProxyConfig;
use ragproxy_core::errors::RagError;
use ragproxy_core::transformers::providers::openai::OpenAIProvider;
use ragproxy_core::transformers::providers::ChatCompletionProvider;
use ragproxy_core::vectorstore::pinecone::PineconeStore;

// inbound request bodies larger than this are rejected with 413
pub const MAX_PAYLOAD_BYTES: usize = 4 * 1024 * 1024;

/// Shared by every worker of the HTTP server.
pub struct AppState {
    pub api_key: String,
    pub augmenter: Augmenter,
    pub upstream: Arc<dyn ChatCompletionProvider>,
}

impl AppState {
    /// Wires the OpenAI client, the Pinecone store and the prompt cache from config.
    /// One OpenAI client serves both embeddings and chat completions.
    pub fn from_config(cfg: &ProxyConfig) -> Result<AppState, RagError> {
        let openai = Arc::new(OpenAIProvider::new(
            Some(cfg.store.openai_base_url.clone()),
            cfg.store.openai_api_key.clone(),
            cfg.store.embedding_request_timeout,
        ));
        let store = PineconeStore::new(&cfg.store, openai.clone())?;
        let renderer = PromptRenderer::new(PromptTemplate {
            sys_prompt: cfg.system_message.clone(),
            user_prompt: cfg.rag_template.clone(),
            empty_context: cfg.empty_context_fallback.clone(),
        })?;
        let augmenter = Augmenter::new(
            Arc::new(store),
            renderer,
            PromptCache::new(cfg.prompt_cache_capacity),
            &cfg.chat_model,
            cfg.similar_document_count,
        );
        Ok(AppState {
            api_key: cfg.api_key.clone(),
            augmenter,
            upstream: openai,
        })
    }
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::PayloadConfig::new(MAX_PAYLOAD_BYTES))
        .service(chat::completions)
        .service(
            web::scope("/health")
                .service(health::ready)
                .service(health::lively),
        );
}
