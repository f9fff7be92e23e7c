pub mod pinecone;

use async_trait::async_trait;

use crate::errors::RagError;
use crate::types::Document;

/// A hosted similarity index that embeds text on the way in and out.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Returns up to `k` stored documents ranked by similarity to `query`.
    async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<Document>, RagError>;

    /// Embeds and upserts `docs`, returning the ids written.
    async fn add_documents(&self, docs: &[Document]) -> Result<Vec<String>, RagError>;
}
