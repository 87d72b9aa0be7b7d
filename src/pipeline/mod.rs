pub mod coordinator;
pub mod ingestion;
pub mod processing;
