use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{
    ChatCompletionProvider, EmbeddingProvider, GenericEmbeddingRequest, GenericEmbeddingResponse,
    UpstreamResponse,
};
use crate::config::DEFAULT_OPENAI_BASE_URL;
use crate::errors::RagError;
use crate::transformers::http_handler::handle_response;
use crate::transformers::providers;
use crate::transformers::types::Inputs;
use crate::types::ChatCompletionRequest;

pub const MAX_TOKEN_LEN: usize = 8192;
// maximum number of inputs accepted by a single embeddings call
pub const MAX_BATCH_INPUTS: usize = 2048;

pub struct OpenAIProvider {
    pub url: String,
    api_key: String,
    timeout: Duration,
    client: Client,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OpenAIEmbeddingBody {
    pub model: String,
    pub input: Vec<String>,
}

impl From<GenericEmbeddingRequest> for OpenAIEmbeddingBody {
    fn from(request: GenericEmbeddingRequest) -> Self {
        OpenAIEmbeddingBody {
            model: request.model,
            input: request.input,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OpenAIEmbeddingResponse {
    pub model: String,
    pub data: Vec<EmbeddingObject>,
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct EmbeddingObject {
    pub index: usize,
    pub embedding: Vec<f64>,
}

impl From<OpenAIEmbeddingResponse> for GenericEmbeddingResponse {
    fn from(response: OpenAIEmbeddingResponse) -> Self {
        GenericEmbeddingResponse {
            embeddings: response.data.into_iter().map(|x| x.embedding).collect(),
        }
    }
}

impl OpenAIProvider {
    pub fn new(url: Option<String>, api_key: String, timeout_secs: u64) -> Self {
        let final_url = match url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => DEFAULT_OPENAI_BASE_URL.to_string(),
        };
        OpenAIProvider {
            url: final_url,
            api_key,
            timeout: Duration::from_secs(timeout_secs),
            client: Client::new(),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIProvider {
    async fn generate_embedding<'a>(
        &self,
        request: &'a GenericEmbeddingRequest,
    ) -> Result<GenericEmbeddingResponse, RagError> {
        let req = OpenAIEmbeddingBody::from(request.clone());
        let num_inputs = request.input.len();
        let todo_requests: Vec<OpenAIEmbeddingBody> = if num_inputs > MAX_BATCH_INPUTS {
            providers::split_vector(req.input, MAX_BATCH_INPUTS)
                .into_iter()
                .map(|chunk| OpenAIEmbeddingBody {
                    input: chunk,
                    model: request.model.clone(),
                })
                .collect()
        } else {
            vec![req]
        };

        let mut all_embeddings: Vec<Vec<f64>> = Vec::with_capacity(num_inputs);

        let embeddings_url = format!("{}/embeddings", self.url);
        for request_payload in todo_requests.iter() {
            let response = self
                .client
                .post(&embeddings_url)
                .timeout(self.timeout)
                .header("Accept", "application/json")
                .header("Content-Type", "application/json")
                .header("Authorization", format!("Bearer {}", self.api_key))
                .json(request_payload)
                .send()
                .await?;

            let mut embeddings =
                handle_response::<OpenAIEmbeddingResponse>(response, "embeddings").await?;
            // the API documents no ordering guarantee for `data`
            embeddings.data.sort_by_key(|e| e.index);
            all_embeddings.extend(GenericEmbeddingResponse::from(embeddings).embeddings);
        }
        Ok(GenericEmbeddingResponse {
            embeddings: all_embeddings,
        })
    }
}

#[async_trait]
impl ChatCompletionProvider for OpenAIProvider {
    async fn chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<UpstreamResponse, RagError> {
        let chat_url = format!("{}/chat/completions", self.url);
        let response = self
            .client
            .post(&chat_url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(request)
            .send()
            .await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        Ok(UpstreamResponse {
            status: response.status().as_u16(),
            content_type,
            body: response
                .bytes_stream()
                .map(|chunk| chunk.map_err(RagError::from))
                .boxed(),
        })
    }
}

// OpenAI embedding model has a limit of 8192 tokens per input
// there can be a number of ways condense the inputs
pub fn trim_inputs(inputs: &[Inputs]) -> Vec<String> {
    inputs
        .iter()
        .map(|input| {
            if input.token_estimate as usize > MAX_TOKEN_LEN {
                // not exact token trimming, but naive way to trim input
                let tokens: Vec<&str> = input.inputs.split_whitespace().collect();
                tokens
                    .into_iter()
                    .take(MAX_TOKEN_LEN)
                    .collect::<Vec<_>>()
                    .join(" ")
            } else {
                input.inputs.clone()
            }
        })
        .collect()
}
