use sftp_keys_core::contract::SftpUserRequest;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    #[error("user '{0}' does not exist")]
    UserNotFound(String),
    #[error("{0}")]
    Service(String),
}

/// Managed SFTP endpoint operations. Each call returns the identifier the
/// service assigned.
pub trait TransferService {
    fn import_host_key(&self, server_id: &str, host_key_body: &str)
        -> Result<String, TransferError>;

    fn import_ssh_public_key(
        &self,
        server_id: &str,
        username: &str,
        ssh_public_key_body: &str,
    ) -> Result<String, TransferError>;

    fn create_user(&self, request: &SftpUserRequest) -> Result<String, TransferError>;
}
