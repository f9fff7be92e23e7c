use log::info;
use std::path::Path;

use crate::config::IngestConfig;
use crate::errors::RagError;
use crate::ingest::chunk;
use crate::types::Document;
use crate::vectorstore::VectorStore;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub chunks: usize,
    pub batches: usize,
}

/// reads the document at `path` and splits it into stored-document chunks
pub async fn load_documents(
    path: &str,
    chunk_size: usize,
    chunk_overlap: usize,
) -> Result<Vec<Document>, RagError> {
    let text = tokio::fs::read_to_string(path).await?;
    let source = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_owned());
    let chunks = chunk::split_text(&text, chunk_size, chunk_overlap)?;
    Ok(chunk::to_documents(&source, chunks))
}

/// Upserts `docs` sequentially in batches of `batch_size`. The first failing
/// batch aborts the run; batches already written stay written.
pub async fn add_in_batches(
    store: &dyn VectorStore,
    docs: &[Document],
    batch_size: usize,
) -> Result<IngestReport, RagError> {
    if batch_size == 0 {
        return Err(RagError::Config("batch size must be greater than 0".to_string()));
    }
    let total = docs.len().div_ceil(batch_size);
    let mut report = IngestReport::default();
    for (i, batch) in docs.chunks(batch_size).enumerate() {
        let ids = store.add_documents(batch).await?;
        info!(
            "added {} documents to vector store (batch {}/{})",
            ids.len(),
            i + 1,
            total
        );
        report.chunks += ids.len();
        report.batches += 1;
    }
    Ok(report)
}

pub async fn run(cfg: &IngestConfig, store: &dyn VectorStore) -> Result<IngestReport, RagError> {
    let docs = load_documents(&cfg.document_path, cfg.chunk_size, cfg.chunk_overlap).await?;
    info!(
        "split {} into {} chunks (size {}, overlap {})",
        cfg.document_path,
        docs.len(),
        cfg.chunk_size,
        cfg.chunk_overlap
    );
    add_in_batches(store, &docs, cfg.batch_size).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use async_trait::async_trait;
    use rand::Rng;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingStore {
        batches: Mutex<Vec<usize>>,
        // 1-based call that fails
        fail_on_call: Option<usize>,
    }

    #[async_trait]
    impl VectorStore for RecordingStore {
        async fn similarity_search(&self, _query: &str, _k: usize) -> Result<Vec<Document>, RagError> {
            Ok(vec![])
        }

        async fn add_documents(&self, docs: &[Document]) -> Result<Vec<String>, RagError> {
            let mut batches = self.batches.lock().unwrap();
            batches.push(docs.len());
            if Some(batches.len()) == self.fail_on_call {
                return Err(RagError::Embedding("rate limited".to_string()));
            }
            Ok(docs.iter().map(|d| d.id.clone()).collect())
        }
    }

    fn docs(n: usize) -> Vec<Document> {
        chunk::to_documents("dora.txt", (0..n).map(|i| format!("chunk {i}")).collect())
    }

    fn config(path: &str) -> IngestConfig {
        IngestConfig {
            store: StoreConfig {
                openai_api_key: "sk-test".to_string(),
                openai_base_url: "http://127.0.0.1:9".to_string(),
                embedding_model: "text-embedding-ada-002".to_string(),
                pinecone_host: "http://127.0.0.1:9".to_string(),
                pinecone_api_key: "pc-test".to_string(),
                pinecone_namespace: String::new(),
                embedding_request_timeout: 1,
            },
            document_path: path.to_string(),
            chunk_size: 100,
            chunk_overlap: 10,
            batch_size: 3,
        }
    }

    #[tokio::test]
    async fn test_batches_of_one_hundred() {
        let store = RecordingStore::default();
        let report = add_in_batches(&store, &docs(250), 100).await.unwrap();
        assert_eq!(*store.batches.lock().unwrap(), vec![100, 100, 50]);
        assert_eq!(
            report,
            IngestReport {
                chunks: 250,
                batches: 3
            }
        );
    }

    #[tokio::test]
    async fn test_exact_multiple() {
        let store = RecordingStore::default();
        add_in_batches(&store, &docs(200), 100).await.unwrap();
        assert_eq!(*store.batches.lock().unwrap(), vec![100, 100]);
    }

    #[tokio::test]
    async fn test_failed_batch_halts() {
        let store = RecordingStore {
            fail_on_call: Some(2),
            ..Default::default()
        };
        let res = add_in_batches(&store, &docs(250), 100).await;
        assert!(matches!(res, Err(RagError::Embedding(_))));
        // the third batch is never attempted
        assert_eq!(*store.batches.lock().unwrap(), vec![100, 100]);
    }

    #[tokio::test]
    async fn test_zero_batch_size() {
        let store = RecordingStore::default();
        let res = add_in_batches(&store, &docs(3), 0).await;
        assert!(matches!(res, Err(RagError::Config(_))));
        assert!(store.batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_run_from_file() {
        let mut rng = rand::thread_rng();
        let test_num = rng.gen_range(0..100000);
        let path = std::env::temp_dir().join(format!("ragproxy_ingest_{test_num}.txt"));
        let text = (0..60)
            .map(|i| format!("Article {i} covers ICT risk management."))
            .collect::<Vec<_>>()
            .join("\n\n");
        tokio::fs::write(&path, &text).await.unwrap();

        let store = RecordingStore::default();
        let cfg = config(path.to_str().unwrap());
        let report = run(&cfg, &store).await.unwrap();
        tokio::fs::remove_file(&path).await.unwrap();

        let batches = store.batches.lock().unwrap();
        assert!(report.chunks > 3);
        assert_eq!(report.chunks, batches.iter().sum::<usize>());
        assert_eq!(report.batches, batches.len());
        assert!(batches.iter().all(|b| *b <= 3));
    }

    #[tokio::test]
    async fn test_run_missing_file() {
        let store = RecordingStore::default();
        let cfg = config("/nonexistent/ragproxy/dora.txt");
        let res = run(&cfg, &store).await;
        assert!(matches!(res, Err(RagError::IO(_))));
        assert!(store.batches.lock().unwrap().is_empty());
    }
}
