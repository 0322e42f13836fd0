//! Thin wrapper the handlers use for every external call.

use std::fs;
use std::path::{Path, PathBuf};

use sftp_keys_core::contract::{KeyPairSecret, SftpUserRequest};
use sftp_keys_core::storage_keys::{key_file_name, object_file_name, KeyHalf};

use crate::adapters::object_store::{KeyObjectStore, PutOutcome};
use crate::adapters::secrets::SecretStore;
use crate::adapters::transfer::{TransferError, TransferService};
use crate::error::KeyManagementError;
use crate::keygen::{self, KeyPair};

pub const SECRET_DESCRIPTION: &str = "The key for SFTP user";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SshKeyImport {
    Imported { ssh_public_key_id: String },
    UserMissing,
}

pub struct KeyServices<'a> {
    store: &'a dyn KeyObjectStore,
    secrets: &'a dyn SecretStore,
    transfer: &'a dyn TransferService,
}

impl<'a> KeyServices<'a> {
    pub fn new(
        store: &'a dyn KeyObjectStore,
        secrets: &'a dyn SecretStore,
        transfer: &'a dyn TransferService,
    ) -> Self {
        Self {
            store,
            secrets,
            transfer,
        }
    }

    pub fn generate_key_pair(&self, comment: &str) -> Result<KeyPair, KeyManagementError> {
        keygen::generate_key_pair(comment)
    }

    /// Prefix-listing probe; any object whose key starts with `key` counts.
    pub fn object_exists(&self, key: &str) -> Result<bool, KeyManagementError> {
        self.store
            .count_objects_with_prefix(key)
            .map(|count| count > 0)
            .map_err(|message| KeyManagementError::storage(key, message))
    }

    /// Uploads `content` under `key` unless an object is already there.
    ///
    /// Returns the key when this call wrote the object, `None` when it was
    /// skipped. The write itself is conditional, so a concurrent writer that
    /// slips in between the probe and the put still wins.
    pub fn upload_if_absent(
        &self,
        content: &str,
        key: &str,
    ) -> Result<Option<String>, KeyManagementError> {
        if self.object_exists(key)? {
            return Ok(None);
        }

        match self
            .store
            .put_object_if_absent(key, content.as_bytes())
            .map_err(|message| KeyManagementError::storage(key, message))?
        {
            PutOutcome::Written => Ok(Some(key.to_string())),
            PutOutcome::AlreadyPresent => Ok(None),
        }
    }

    /// Copies an object to `<scratch_dir>/<file name>` and returns that path.
    pub fn download_to_scratch(
        &self,
        key: &str,
        scratch_dir: &Path,
    ) -> Result<PathBuf, KeyManagementError> {
        let file_name = object_file_name(key);
        if file_name.is_empty() || file_name == "." || file_name == ".." {
            return Err(KeyManagementError::InvalidEvent(format!(
                "object key '{key}' does not name a file"
            )));
        }

        let body = self
            .store
            .read_object(key)
            .map_err(|message| KeyManagementError::storage(key, message))?;

        let local_file = scratch_dir.join(file_name);
        fs::write(&local_file, body)
            .map_err(|error| KeyManagementError::scratch(&local_file, error))?;
        Ok(local_file)
    }

    pub fn store_secret(
        &self,
        name: &str,
        payload: &KeyPairSecret,
    ) -> Result<String, KeyManagementError> {
        let secret_string = serde_json::to_string(payload).map_err(|error| {
            KeyManagementError::Secrets {
                name: name.to_string(),
                message: format!("failed to serialize secret payload: {error}"),
            }
        })?;

        self.secrets
            .create_secret(name, SECRET_DESCRIPTION, &secret_string)
            .map_err(|message| KeyManagementError::Secrets {
                name: name.to_string(),
                message,
            })
    }

    pub fn add_host_key(
        &self,
        server_id: &str,
        host_key_body: &str,
    ) -> Result<String, KeyManagementError> {
        self.transfer
            .import_host_key(server_id, host_key_body)
            .map_err(|error| KeyManagementError::Transfer(error.to_string()))
    }

    pub fn add_ssh_public_key(
        &self,
        username: &str,
        server_id: &str,
        ssh_public_key_body: &str,
    ) -> Result<SshKeyImport, KeyManagementError> {
        match self
            .transfer
            .import_ssh_public_key(server_id, username, ssh_public_key_body)
        {
            Ok(ssh_public_key_id) => Ok(SshKeyImport::Imported { ssh_public_key_id }),
            Err(TransferError::UserNotFound(_)) => Ok(SshKeyImport::UserMissing),
            Err(error) => Err(KeyManagementError::Transfer(error.to_string())),
        }
    }

    pub fn create_sftp_user(
        &self,
        request: &SftpUserRequest,
    ) -> Result<String, KeyManagementError> {
        self.transfer
            .create_user(request)
            .map_err(|error| KeyManagementError::Transfer(error.to_string()))
    }
}

/// Both halves of `username`'s pair have been downloaded to `scratch_dir`.
pub fn is_key_pair_downloaded(username: &str, scratch_dir: &Path) -> bool {
    [KeyHalf::Private, KeyHalf::Public]
        .into_iter()
        .all(|half| scratch_dir.join(key_file_name(username, half)).is_file())
}

pub fn read_scratch_file(path: &Path) -> Result<String, KeyManagementError> {
    fs::read_to_string(path).map_err(|error| KeyManagementError::scratch(path, error))
}
