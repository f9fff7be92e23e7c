use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use tiktoken_rs::{cl100k_base, CoreBPE};

use crate::types::Document;

lazy_static! {
    // the embedding models and gpt-4o-mini's predecessors share this vocabulary
    static ref CL100K: CoreBPE = cl100k_base().expect("cl100k_base vocabulary is bundled");
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Inputs {
    pub record_id: String,   // id the vector is stored under
    pub inputs: String,      // text to embed
    pub token_estimate: i32, // estimated token count
}

impl Inputs {
    pub fn new(record_id: &str, text: &str) -> Self {
        Inputs {
            record_id: record_id.to_owned(),
            inputs: text.to_owned(),
            token_estimate: token_estimate(text),
        }
    }
}

impl From<&Document> for Inputs {
    fn from(doc: &Document) -> Self {
        Inputs::new(&doc.id, &doc.page_content)
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PairedEmbeddings {
    pub primary_key: String,
    pub embeddings: Vec<f64>,
}

pub fn token_estimate(text: &str) -> i32 {
    CL100K.encode_ordinary(text).len() as i32
}
