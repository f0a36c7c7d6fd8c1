// src/extraction/mod.rs
pub mod completion_client;
pub mod field_extractor;

pub use completion_client::{CompletionClient, OpenAiClient};
pub use field_extractor::{
    clean_completion, CompanyPatterns, CompanyStrategy, ExtractedFields, FieldExtractor,
    UNKNOWN_COMPANY,
};
