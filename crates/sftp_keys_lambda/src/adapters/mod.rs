pub mod aws;
pub mod object_store;
pub mod secrets;
pub mod transfer;
