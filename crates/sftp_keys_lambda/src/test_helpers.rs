//! In-memory capability fakes shared by unit and integration tests.
//!
//! Every fake records the calls it receives so tests can assert on exactly
//! which external operations a handler performed.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use sftp_keys_core::contract::SftpUserRequest;

use crate::adapters::object_store::{KeyObjectStore, PutOutcome};
use crate::adapters::secrets::SecretStore;
use crate::adapters::transfer::{TransferError, TransferService};

#[derive(Default)]
pub struct InMemoryKeyStore {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
    hidden_from_listing: Mutex<BTreeSet<String>>,
    put_calls: Mutex<usize>,
    reads: Mutex<Vec<String>>,
}

impl InMemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_object(&self, key: &str, body: &[u8]) {
        self.objects
            .lock()
            .expect("poisoned mutex")
            .insert(key.to_string(), body.to_vec());
    }

    /// Makes `key` invisible to prefix listing while still blocking
    /// conditional writes, emulating a writer that lands between probe and put.
    pub fn hide_from_listing(&self, key: &str) {
        self.hidden_from_listing
            .lock()
            .expect("poisoned mutex")
            .insert(key.to_string());
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects
            .lock()
            .expect("poisoned mutex")
            .keys()
            .cloned()
            .collect()
    }

    pub fn body(&self, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .expect("poisoned mutex")
            .get(key)
            .cloned()
    }

    pub fn put_calls(&self) -> usize {
        *self.put_calls.lock().expect("poisoned mutex")
    }

    pub fn reads(&self) -> Vec<String> {
        self.reads.lock().expect("poisoned mutex").clone()
    }
}

impl KeyObjectStore for InMemoryKeyStore {
    fn count_objects_with_prefix(&self, prefix: &str) -> Result<usize, String> {
        let hidden = self.hidden_from_listing.lock().expect("poisoned mutex");
        Ok(self
            .objects
            .lock()
            .expect("poisoned mutex")
            .keys()
            .filter(|key| key.starts_with(prefix) && !hidden.contains(*key))
            .count())
    }

    fn put_object_if_absent(&self, key: &str, body: &[u8]) -> Result<PutOutcome, String> {
        *self.put_calls.lock().expect("poisoned mutex") += 1;

        let mut objects = self.objects.lock().expect("poisoned mutex");
        if objects.contains_key(key) {
            return Ok(PutOutcome::AlreadyPresent);
        }
        objects.insert(key.to_string(), body.to_vec());
        Ok(PutOutcome::Written)
    }

    fn read_object(&self, key: &str) -> Result<Vec<u8>, String> {
        self.reads
            .lock()
            .expect("poisoned mutex")
            .push(key.to_string());

        self.body(key)
            .ok_or_else(|| format!("simulated missing object: {key}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedSecret {
    pub name: String,
    pub description: String,
    pub secret_string: String,
}

#[derive(Default)]
pub struct RecordingSecretStore {
    created: Mutex<Vec<CreatedSecret>>,
}

impl RecordingSecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created(&self) -> Vec<CreatedSecret> {
        self.created.lock().expect("poisoned mutex").clone()
    }
}

impl SecretStore for RecordingSecretStore {
    fn create_secret(
        &self,
        name: &str,
        description: &str,
        secret_string: &str,
    ) -> Result<String, String> {
        let mut created = self.created.lock().expect("poisoned mutex");
        if created.iter().any(|secret| secret.name == name) {
            return Err(format!("simulated ResourceExistsException for {name}"));
        }
        created.push(CreatedSecret {
            name: name.to_string(),
            description: description.to_string(),
            secret_string: secret_string.to_string(),
        });
        Ok(format!("arn:aws:secretsmanager:eu-west-1:123456789012:secret:{name}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostKeyImport {
    pub server_id: String,
    pub host_key_body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshPublicKeyImport {
    pub server_id: String,
    pub username: String,
    pub ssh_public_key_body: String,
}

#[derive(Default)]
pub struct RecordingTransferService {
    existing_users: Mutex<BTreeSet<String>>,
    host_keys: Mutex<Vec<HostKeyImport>>,
    ssh_public_keys: Mutex<Vec<SshPublicKeyImport>>,
    created_users: Mutex<Vec<SftpUserRequest>>,
    failing_host_import: bool,
}

impl RecordingTransferService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_existing_user(self, username: &str) -> Self {
        self.existing_users
            .lock()
            .expect("poisoned mutex")
            .insert(username.to_string());
        self
    }

    pub fn with_failing_host_import(mut self) -> Self {
        self.failing_host_import = true;
        self
    }

    pub fn host_keys(&self) -> Vec<HostKeyImport> {
        self.host_keys.lock().expect("poisoned mutex").clone()
    }

    pub fn ssh_public_keys(&self) -> Vec<SshPublicKeyImport> {
        self.ssh_public_keys.lock().expect("poisoned mutex").clone()
    }

    pub fn created_users(&self) -> Vec<SftpUserRequest> {
        self.created_users.lock().expect("poisoned mutex").clone()
    }

    pub fn total_calls(&self) -> usize {
        self.host_keys().len() + self.ssh_public_keys().len() + self.created_users().len()
    }
}

impl TransferService for RecordingTransferService {
    fn import_host_key(
        &self,
        server_id: &str,
        host_key_body: &str,
    ) -> Result<String, TransferError> {
        if self.failing_host_import {
            return Err(TransferError::Service(
                "simulated host key import failure".to_string(),
            ));
        }

        let mut host_keys = self.host_keys.lock().expect("poisoned mutex");
        host_keys.push(HostKeyImport {
            server_id: server_id.to_string(),
            host_key_body: host_key_body.to_string(),
        });
        Ok(format!("hostkey-{}", host_keys.len()))
    }

    fn import_ssh_public_key(
        &self,
        server_id: &str,
        username: &str,
        ssh_public_key_body: &str,
    ) -> Result<String, TransferError> {
        let mut imports = self.ssh_public_keys.lock().expect("poisoned mutex");
        imports.push(SshPublicKeyImport {
            server_id: server_id.to_string(),
            username: username.to_string(),
            ssh_public_key_body: ssh_public_key_body.to_string(),
        });

        if !self
            .existing_users
            .lock()
            .expect("poisoned mutex")
            .contains(username)
        {
            return Err(TransferError::UserNotFound(username.to_string()));
        }
        Ok(format!("key-{}", imports.len()))
    }

    fn create_user(&self, request: &SftpUserRequest) -> Result<String, TransferError> {
        let mut existing = self.existing_users.lock().expect("poisoned mutex");
        if !existing.insert(request.username.clone()) {
            return Err(TransferError::Service(format!(
                "simulated ResourceExistsException for {}",
                request.username
            )));
        }
        self.created_users
            .lock()
            .expect("poisoned mutex")
            .push(request.clone());
        Ok(request.username.clone())
    }
}
