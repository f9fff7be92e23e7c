pub mod common {
    use async_trait::async_trait;
    use bytes::Bytes;
    use futures::stream::{self, StreamExt};
    use std::sync::{Arc, Mutex};

    use ragproxy::server::AppState;
    use ragproxy_core::cache::PromptCache;
    use ragproxy_core::chat::ops::{Augmenter, PromptRenderer};
    use ragproxy_core::chat::types::PromptTemplate;
    use ragproxy_core::config::{DEFAULT_EMPTY_CONTEXT, DEFAULT_RAG_TEMPLATE};
    use ragproxy_core::errors::RagError;
    use ragproxy_core::transformers::providers::{ChatCompletionProvider, UpstreamResponse};
    use ragproxy_core::types::{ChatCompletionRequest, Document};
    use ragproxy_core::vectorstore::VectorStore;

    pub const API_KEY: &str = "test-secret";
    pub const SYSTEM_MESSAGE: &str = "You answer questions about DORA.";
    pub const CHAT_MODEL: &str = "gpt-4o-mini";

    pub const SSE_BODY: &str = concat!(
        "data: {\"id\":\"chatcmpl-1\",\"model\":\"gpt-4o-mini\",\"choices\":[{\"delta\":{\"content\":\"Hallo\"}}],\"usage\":null}\n\n",
        "data: {\"id\":\"chatcmpl-1\",\"model\":\"gpt-4o-mini\",\"choices\":[],\"usage\":{\"prompt_tokens\":120,\"completion_tokens\":8,\"total_tokens\":128}}\n\n",
        "data: [DONE]\n\n",
    );

    #[derive(Default)]
    pub struct FakeStore {
        pub queries: Mutex<Vec<String>>,
        pub docs: Vec<Document>,
        pub fail: bool,
    }

    impl FakeStore {
        pub fn with_docs(texts: &[&str]) -> Self {
            FakeStore {
                docs: texts
                    .iter()
                    .enumerate()
                    .map(|(i, t)| Document::new(format!("dora.txt-{i}"), t.to_string()))
                    .collect(),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl VectorStore for FakeStore {
        async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<Document>, RagError> {
            self.queries.lock().unwrap().push(query.to_string());
            if self.fail {
                return Err(RagError::VectorStore("index unavailable".to_string()));
            }
            Ok(self.docs.iter().take(k).cloned().collect())
        }

        async fn add_documents(&self, docs: &[Document]) -> Result<Vec<String>, RagError> {
            Ok(docs.iter().map(|d| d.id.clone()).collect())
        }
    }

    pub struct FakeUpstream {
        pub requests: Mutex<Vec<ChatCompletionRequest>>,
        pub status: u16,
        pub content_type: Option<String>,
        pub chunks: Vec<&'static str>,
    }

    impl FakeUpstream {
        pub fn streaming() -> Self {
            // split mid-frame to exercise relaying partial reads
            let (head, tail) = SSE_BODY.split_at(40);
            FakeUpstream {
                requests: Mutex::new(vec![]),
                status: 200,
                content_type: Some("text/event-stream".to_string()),
                chunks: vec![head, tail],
            }
        }

        pub fn failing(status: u16, body: &'static str) -> Self {
            FakeUpstream {
                requests: Mutex::new(vec![]),
                status,
                content_type: None,
                chunks: vec![body],
            }
        }

        pub fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        pub fn last_request(&self) -> ChatCompletionRequest {
            self.requests
                .lock()
                .unwrap()
                .last()
                .cloned()
                .expect("upstream was never called")
        }
    }

    #[async_trait]
    impl ChatCompletionProvider for FakeUpstream {
        async fn chat_completion(
            &self,
            request: &ChatCompletionRequest,
        ) -> Result<UpstreamResponse, RagError> {
            self.requests.lock().unwrap().push(request.clone());
            let chunks: Vec<Result<Bytes, RagError>> = self
                .chunks
                .iter()
                .map(|c| Ok(Bytes::from_static(c.as_bytes())))
                .collect();
            Ok(UpstreamResponse {
                status: self.status,
                content_type: self.content_type.clone(),
                body: stream::iter(chunks).boxed(),
            })
        }
    }

    pub fn app_state(store: Arc<FakeStore>, upstream: Arc<FakeUpstream>) -> AppState {
        let renderer = PromptRenderer::new(PromptTemplate {
            sys_prompt: SYSTEM_MESSAGE.to_string(),
            user_prompt: DEFAULT_RAG_TEMPLATE.to_string(),
            empty_context: DEFAULT_EMPTY_CONTEXT.to_string(),
        })
        .expect("failed to compile template");
        AppState {
            api_key: API_KEY.to_string(),
            augmenter: Augmenter::new(store, renderer, PromptCache::new(100), CHAT_MODEL, 3),
            upstream,
        }
    }

    pub fn chat_body(messages: &[(&str, &str)]) -> String {
        let messages: Vec<serde_json::Value> = messages
            .iter()
            .map(|(role, content)| serde_json::json!({"role": role, "content": content}))
            .collect();
        serde_json::json!({
            "model": "gpt-3.5-turbo",
            "max_tokens": 512,
            "stream": true,
            "messages": messages,
        })
        .to_string()
    }
}
