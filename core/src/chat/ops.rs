use handlebars::Handlebars;
use log::debug;
use std::sync::Arc;

use crate::cache::PromptCache;
use crate::chat::types::{PromptTemplate, RenderedPrompt};
use crate::errors::RagError;
use crate::transformers::types::token_estimate;
use crate::types::{ChatCompletionRequest, ChatMessage, Document, StreamOptions};
use crate::vectorstore::VectorStore;

const USER_TEMPLATE_NAME: &str = "user_prompt";

pub struct PromptRenderer {
    handlebars: Handlebars<'static>,
    template: PromptTemplate,
}

impl PromptRenderer {
    pub fn new(template: PromptTemplate) -> Result<Self, RagError> {
        let mut handlebars = Handlebars::new();
        // prompts are plain text, not HTML
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars.register_template_string(USER_TEMPLATE_NAME, &template.user_prompt)?;
        Ok(PromptRenderer {
            handlebars,
            template,
        })
    }

    pub fn system_message(&self) -> &str {
        &self.template.sys_prompt
    }

    pub fn render_user_message(&self, context: &str, query: &str) -> Result<String, RagError> {
        let render_vals = serde_json::json!({
            "context_str": context,
            "query_str": query,
        });
        Ok(self.handlebars.render(USER_TEMPLATE_NAME, &render_vals)?)
    }

    pub fn prepared_prompt(&self, docs: &[Document], query: &str) -> Result<RenderedPrompt, RagError> {
        let context = combine_context(docs, &self.template.empty_context);
        let user_rendered = self.render_user_message(&context, query)?;
        Ok(RenderedPrompt {
            query: query.to_owned(),
            context,
            user_rendered,
        })
    }
}

/// Joins retrieved chunks with a blank line, or returns `fallback` when
/// nothing usable was retrieved.
pub fn combine_context(docs: &[Document], fallback: &str) -> String {
    let combined = docs
        .iter()
        .map(|d| d.page_content.as_str())
        .collect::<Vec<&str>>()
        .join("\n\n");
    if combined.trim().is_empty() {
        fallback.to_owned()
    } else {
        combined
    }
}

/// Rewrites inbound chat completion requests so the upstream model answers
/// with retrieved context in view.
pub struct Augmenter {
    store: Arc<dyn VectorStore>,
    renderer: PromptRenderer,
    cache: PromptCache,
    chat_model: String,
    num_context: usize,
}

impl Augmenter {
    pub fn new(
        store: Arc<dyn VectorStore>,
        renderer: PromptRenderer,
        cache: PromptCache,
        chat_model: &str,
        num_context: usize,
    ) -> Self {
        Augmenter {
            store,
            renderer,
            cache,
            chat_model: chat_model.to_owned(),
            num_context,
        }
    }

    pub fn cache(&self) -> &PromptCache {
        &self.cache
    }

    pub async fn augment(
        &self,
        mut request: ChatCompletionRequest,
        conversation: Option<&str>,
    ) -> Result<ChatCompletionRequest, RagError> {
        if request.messages.is_empty() {
            return Err(RagError::EmptyConversation);
        }

        request.model = self.chat_model.clone();
        request.max_tokens = None;
        request.stream_options = StreamOptions {
            include_usage: true,
        };
        request.messages[0] = ChatMessage::system(self.renderer.system_message());

        // read after the overwrite: a single-message conversation queries with
        // the system instruction
        let query = match request.messages.last() {
            Some(msg) => msg.content.clone(),
            None => return Err(RagError::EmptyConversation),
        };

        let docs = self.store.similarity_search(&query, self.num_context).await?;
        debug!("retrieved {} documents for query", docs.len());

        let prompt = self.renderer.prepared_prompt(&docs, &query)?;
        debug!(
            "rendered prompt, estimated {} tokens",
            token_estimate(&prompt.user_rendered)
        );
        // the system slot is never cached or rewritten, so a lone message
        // keeps the instruction and leaves no entry behind
        if request.messages.len() == 1 {
            return Ok(request);
        }
        self.cache
            .insert(conversation, &prompt.query, prompt.user_rendered.clone());

        // the current query always gets the fresh rendering, earlier turns
        // get whatever this conversation rendered for them before
        for msg in request.messages.iter_mut().skip(1) {
            if msg.content == prompt.query {
                msg.content = prompt.user_rendered.clone();
            } else if let Some(rendered) = self.cache.get(conversation, &msg.content) {
                msg.content = rendered;
            }
        }
        Ok(request)
    }
}
