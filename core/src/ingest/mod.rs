pub mod base;
pub mod chunk;
