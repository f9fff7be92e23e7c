use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use super::VectorStore;
use crate::config::StoreConfig;
use crate::errors::RagError;
use crate::transformers::http_handler::{handle_response, merge_input_output};
use crate::transformers::providers::{prepare_generic_embedding_request, EmbeddingProvider};
use crate::transformers::types::{Inputs, PairedEmbeddings};
use crate::types::Document;

// metadata key holding the chunk text
pub const TEXT_KEY: &str = "text";
pub const PINECONE_API_VERSION: &str = "2024-07";

pub struct PineconeStore {
    host: Url,
    api_key: String,
    namespace: String,
    embedding_model: String,
    embedder: Arc<dyn EmbeddingProvider>,
    timeout: Duration,
    client: Client,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct QueryBody<'a> {
    vector: &'a [f64],
    top_k: usize,
    namespace: &'a str,
    include_metadata: bool,
    include_values: bool,
}

#[derive(Deserialize, Debug)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<Match>,
}

#[derive(Deserialize, Debug)]
struct Match {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
}

#[derive(Serialize, Debug)]
struct UpsertBody<'a> {
    vectors: Vec<Vector>,
    namespace: &'a str,
}

#[derive(Serialize, Debug)]
struct Vector {
    id: String,
    values: Vec<f64>,
    metadata: Map<String, Value>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: usize,
}

impl PineconeStore {
    pub fn new(cfg: &StoreConfig, embedder: Arc<dyn EmbeddingProvider>) -> Result<Self, RagError> {
        Ok(PineconeStore {
            host: parse_host(&cfg.pinecone_host)?,
            api_key: cfg.pinecone_api_key.clone(),
            namespace: cfg.pinecone_namespace.clone(),
            embedding_model: cfg.embedding_model.clone(),
            embedder,
            timeout: Duration::from_secs(cfg.embedding_request_timeout),
            client: Client::new(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.host.as_str().trim_end_matches('/'), path)
    }

    async fn post<B: Serialize, T: for<'de> Deserialize<'de>>(
        &self,
        path: &'static str,
        body: &B,
    ) -> Result<T, RagError> {
        let response = self
            .client
            .post(self.endpoint(path))
            .timeout(self.timeout)
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", PINECONE_API_VERSION)
            .json(body)
            .send()
            .await?;
        handle_response::<T>(response, path).await
    }
}

#[async_trait]
impl VectorStore for PineconeStore {
    async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<Document>, RagError> {
        let request =
            prepare_generic_embedding_request(&self.embedding_model, &[Inputs::new("query", query)]);
        let embedded = self.embedder.generate_embedding(&request).await?;
        let vector = embedded
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| RagError::Embedding("no embedding returned for query".to_string()))?;

        let body = QueryBody {
            vector: &vector,
            top_k: k,
            namespace: &self.namespace,
            include_metadata: true,
            include_values: false,
        };
        let resp: QueryResponse = self.post("query", &body).await?;
        debug!("pinecone returned {} matches", resp.matches.len());
        Ok(matches_to_documents(resp.matches))
    }

    async fn add_documents(&self, docs: &[Document]) -> Result<Vec<String>, RagError> {
        if docs.is_empty() {
            return Ok(vec![]);
        }
        let inputs: Vec<Inputs> = docs.iter().map(Inputs::from).collect();
        let request = prepare_generic_embedding_request(&self.embedding_model, &inputs);
        let embedded = self.embedder.generate_embedding(&request).await?;
        let paired = merge_input_output(inputs, embedded.embeddings)?;

        let ids: Vec<String> = docs.iter().map(|d| d.id.clone()).collect();
        let body = UpsertBody {
            vectors: build_vectors(docs, paired),
            namespace: &self.namespace,
        };
        let resp: UpsertResponse = self.post("vectors/upsert", &body).await?;
        if resp.upserted_count != ids.len() {
            warn!(
                "pinecone reported {} vectors upserted, sent {}",
                resp.upserted_count,
                ids.len()
            );
        }
        Ok(ids)
    }
}

/// Index hosts are handed out without a scheme; https is assumed then.
pub fn parse_host(host: &str) -> Result<Url, RagError> {
    let with_scheme = if host.contains("://") {
        host.to_string()
    } else {
        format!("https://{host}")
    };
    Url::parse(&with_scheme)
        .map_err(|e| RagError::Config(format!("invalid PINECONE_HOST '{host}': {e}")))
}

fn build_vectors(docs: &[Document], paired: Vec<PairedEmbeddings>) -> Vec<Vector> {
    docs.iter()
        .zip(paired)
        .map(|(doc, pair)| {
            let mut metadata = doc.metadata.clone();
            metadata.insert(TEXT_KEY.to_string(), Value::from(doc.page_content.clone()));
            Vector {
                id: pair.primary_key,
                values: pair.embeddings,
                metadata,
            }
        })
        .collect()
}

fn matches_to_documents(matches: Vec<Match>) -> Vec<Document> {
    matches
        .into_iter()
        .filter_map(|m| {
            let mut metadata = m.metadata.unwrap_or_default();
            let text = match metadata.remove(TEXT_KEY) {
                Some(Value::String(text)) => text,
                _ => {
                    warn!("match {} carries no '{}' metadata, skipping", m.id, TEXT_KEY);
                    return None;
                }
            };
            Some(Document {
                id: m.id,
                page_content: text,
                score: m.score,
                metadata,
            })
        })
        .collect()
}
