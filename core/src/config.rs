use std::env;
use std::str::FromStr;

use crate::errors::RagError;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_RAG_TEMPLATE: &str = "Kontext: {{context_str}}\nNachricht: {{query_str}}";
pub const DEFAULT_EMPTY_CONTEXT: &str =
    "Leer, Nachricht kann also ohne weiteren Kontext verarbeitet werden.";
pub const DEFAULT_SYSTEM_MESSAGE: &str = "Help the user find answers to their developer-specific \
questions. Please relate your answer or recommendations to parts of the dora specification.";

/// Settings shared by the proxy and the ingestion job: where embeddings are
/// computed and where vectors live.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub embedding_model: String,
    pub pinecone_host: String,
    pub pinecone_api_key: String,
    pub pinecone_namespace: String,
    pub embedding_request_timeout: u64,
}

impl StoreConfig {
    pub fn from_env() -> Result<StoreConfig, RagError> {
        Ok(StoreConfig {
            openai_api_key: require_env("OPENAI_API_KEY")?,
            openai_base_url: from_env_default("OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL),
            embedding_model: from_env_default("OPENAI_EMBEDDING_MODEL", DEFAULT_EMBEDDING_MODEL),
            pinecone_host: require_env("PINECONE_HOST")?,
            pinecone_api_key: require_env("PINECONE_API_KEY")?,
            pinecone_namespace: from_env_default("PINECONE_NAMESPACE", ""),
            embedding_request_timeout: parse_env("EMBEDDING_REQUEST_TIMEOUT", "120")?,
        })
    }
}

#[derive(Clone, Debug)]
pub struct ProxyConfig {
    pub store: StoreConfig,
    // inbound bearer secret
    pub api_key: String,
    pub host: String,
    pub port: u16,
    pub chat_model: String,
    pub similar_document_count: usize,
    pub prompt_cache_capacity: u64,
    pub system_message: String,
    pub rag_template: String,
    pub empty_context_fallback: String,
}

impl ProxyConfig {
    pub fn from_env() -> Result<ProxyConfig, RagError> {
        Ok(ProxyConfig {
            store: StoreConfig::from_env()?,
            api_key: require_env("API_KEY")?,
            host: from_env_default("HOST", "0.0.0.0"),
            port: parse_env("PORT", "9000")?,
            chat_model: from_env_default("CHAT_MODEL", DEFAULT_CHAT_MODEL),
            similar_document_count: parse_env("SIMILAR_DOCUMENT_COUNT", "7")?,
            prompt_cache_capacity: parse_env("PROMPT_CACHE_CAPACITY", "10000")?,
            system_message: from_env_default("SYSTEM_MESSAGE", DEFAULT_SYSTEM_MESSAGE),
            rag_template: from_env_default("RAG_TEMPLATE", DEFAULT_RAG_TEMPLATE),
            empty_context_fallback: from_env_default(
                "EMPTY_CONTEXT_FALLBACK",
                DEFAULT_EMPTY_CONTEXT,
            ),
        })
    }
}

#[derive(Clone, Debug)]
pub struct IngestConfig {
    pub store: StoreConfig,
    pub document_path: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub batch_size: usize,
}

impl IngestConfig {
    pub fn from_env() -> Result<IngestConfig, RagError> {
        let cfg = IngestConfig {
            store: StoreConfig::from_env()?,
            document_path: from_env_default("DOCUMENT_PATH", "res/dora.txt"),
            chunk_size: parse_env("CHUNK_SIZE", "1000")?,
            chunk_overlap: parse_env("CHUNK_OVERLAP", "20")?,
            batch_size: parse_env("INGEST_BATCH_SIZE", "100")?,
        };
        if cfg.batch_size == 0 {
            return Err(RagError::Config(
                "INGEST_BATCH_SIZE must be greater than 0".to_string(),
            ));
        }
        if cfg.chunk_overlap >= cfg.chunk_size {
            return Err(RagError::Config(format!(
                "CHUNK_OVERLAP ({}) must be smaller than CHUNK_SIZE ({})",
                cfg.chunk_overlap, cfg.chunk_size
            )));
        }
        Ok(cfg)
    }
}

/// source a variable from environment - use default if not exists
pub fn from_env_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

pub fn require_env(key: &str) -> Result<String, RagError> {
    match env::var(key) {
        Ok(v) if !v.is_empty() => Ok(v),
        _ => Err(RagError::Config(format!("{key} not set"))),
    }
}

pub fn parse_env<T: FromStr>(key: &str, default: &str) -> Result<T, RagError> {
    let raw = from_env_default(key, default);
    raw.trim()
        .parse::<T>()
        .map_err(|_| RagError::Config(format!("invalid value for {key}: {raw}")))
}
