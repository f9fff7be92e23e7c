pub mod ops;
pub mod types;
