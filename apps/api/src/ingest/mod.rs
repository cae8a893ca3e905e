// CSV ingestion: column mapping, parsing, and the batch import pipeline.
pub mod csv;
pub mod handlers;
pub mod mapping;
pub mod pipeline;
pub mod prompts;
