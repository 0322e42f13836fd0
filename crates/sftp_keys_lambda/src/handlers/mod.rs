pub mod ingestion;
pub mod provisioning;
