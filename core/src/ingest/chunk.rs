use serde_json::Value;
use text_splitter::{ChunkConfig, TextSplitter};

use crate::errors::RagError;
use crate::types::Document;

/// Splits `text` into chunks of at most `chunk_size` characters, preferring
/// paragraph, then line, sentence and word boundaries. Neighbouring chunks
/// share up to `chunk_overlap` characters.
pub fn split_text(
    text: &str,
    chunk_size: usize,
    chunk_overlap: usize,
) -> Result<Vec<String>, RagError> {
    let config = ChunkConfig::new(chunk_size)
        .with_overlap(chunk_overlap)
        .map_err(|e| RagError::Config(e.to_string()))?;
    let splitter = TextSplitter::new(config);
    Ok(splitter.chunks(text).map(|s| s.to_string()).collect())
}

// chunk ids are positional so re-ingesting a file overwrites its vectors
pub fn to_documents(source: &str, chunks: Vec<String>) -> Vec<Document> {
    chunks
        .into_iter()
        .enumerate()
        .map(|(index, chunk)| {
            let mut doc = Document::new(format!("{source}-{index}"), chunk);
            doc.metadata
                .insert("source".to_string(), Value::from(source));
            doc.metadata
                .insert("chunk_index".to_string(), Value::from(index));
            doc
        })
        .collect()
}
