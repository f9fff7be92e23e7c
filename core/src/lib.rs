pub mod cache;
pub mod chat;
pub mod config;
pub mod errors;
pub mod ingest;
pub mod transformers;
pub mod types;
pub mod usage;
pub mod vectorstore;
