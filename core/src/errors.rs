use anyhow::Error as AnyhowError;
use handlebars::{RenderError, TemplateError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RagError {
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("Serde error: {0}")]
    SerdeError(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
    #[error("template error: {0}")]
    Template(#[from] TemplateError),
    #[error("render error: {0}")]
    Render(#[from] RenderError),
    #[error("An internal error occurred: {0}")]
    InternalError(#[from] AnyhowError),
    #[error("embedding error: {0}")]
    Embedding(String),
    #[error("vector store error: {0}")]
    VectorStore(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("request data must contain at least one message")]
    EmptyConversation,
}
