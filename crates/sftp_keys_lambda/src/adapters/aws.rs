//! AWS SDK implementations of the capability traits.
//!
//! The handlers are synchronous; every call here bridges into the async SDK
//! on the current multi-threaded tokio runtime.

use std::future::Future;

use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_transfer::types::{HomeDirectoryType, Tag};
use sftp_keys_core::contract::SftpUserRequest;

use crate::adapters::object_store::{KeyObjectStore, PutOutcome};
use crate::adapters::secrets::SecretStore;
use crate::adapters::transfer::{TransferError, TransferService};

pub async fn load_sdk_config(region: &str) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .load()
        .await
}

fn block_on<F: Future>(future: F) -> F::Output {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

/// S3 answers a conditional put on an existing key with 412, and with 409
/// while a concurrent conditional write to the same key is in flight.
fn is_conditional_write_conflict<E>(error: &SdkError<E>) -> bool {
    error
        .raw_response()
        .map(|response| matches!(response.status().as_u16(), 409 | 412))
        .unwrap_or(false)
}

pub struct S3KeyObjectStore {
    bucket: String,
    s3_client: aws_sdk_s3::Client,
}

impl S3KeyObjectStore {
    pub fn new(bucket: impl Into<String>, sdk_config: &SdkConfig) -> Self {
        Self {
            bucket: bucket.into(),
            s3_client: aws_sdk_s3::Client::new(sdk_config),
        }
    }
}

impl KeyObjectStore for S3KeyObjectStore {
    fn count_objects_with_prefix(&self, prefix: &str) -> Result<usize, String> {
        let bucket = self.bucket.clone();
        let prefix = prefix.to_string();
        let client = self.s3_client.clone();

        block_on(async move {
            client
                .list_objects_v2()
                .bucket(bucket)
                .prefix(prefix)
                .send()
                .await
                .map(|output| output.key_count().unwrap_or_default().max(0) as usize)
                .map_err(|error| {
                    format!("failed to list objects in s3: {}", DisplayErrorContext(&error))
                })
        })
    }

    fn put_object_if_absent(&self, key: &str, body: &[u8]) -> Result<PutOutcome, String> {
        let bucket = self.bucket.clone();
        let object_key = key.to_string();
        let body_bytes = body.to_vec();
        let client = self.s3_client.clone();

        block_on(async move {
            let result = client
                .put_object()
                .bucket(bucket)
                .key(object_key)
                .body(ByteStream::from(body_bytes))
                .if_none_match("*")
                .send()
                .await;

            match result {
                Ok(_) => Ok(PutOutcome::Written),
                Err(error) if is_conditional_write_conflict(&error) => {
                    Ok(PutOutcome::AlreadyPresent)
                }
                Err(error) => Err(format!(
                    "failed to write object to s3: {}",
                    DisplayErrorContext(&error)
                )),
            }
        })
    }

    fn read_object(&self, key: &str) -> Result<Vec<u8>, String> {
        let bucket = self.bucket.clone();
        let object_key = key.to_string();
        let client = self.s3_client.clone();

        block_on(async move {
            let output = client
                .get_object()
                .bucket(bucket)
                .key(object_key)
                .send()
                .await
                .map_err(|error| {
                    format!("failed to read object from s3: {}", DisplayErrorContext(&error))
                })?;

            output
                .body
                .collect()
                .await
                .map(|data| data.into_bytes().to_vec())
                .map_err(|error| format!("failed to stream object body from s3: {error}"))
        })
    }
}

pub struct SecretsManagerStore {
    secrets_client: aws_sdk_secretsmanager::Client,
}

impl SecretsManagerStore {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            secrets_client: aws_sdk_secretsmanager::Client::new(sdk_config),
        }
    }
}

impl SecretStore for SecretsManagerStore {
    fn create_secret(
        &self,
        name: &str,
        description: &str,
        secret_string: &str,
    ) -> Result<String, String> {
        let secret_name = name.to_string();
        let description = description.to_string();
        let secret_string = secret_string.to_string();
        let client = self.secrets_client.clone();

        block_on(async move {
            client
                .create_secret()
                .name(secret_name)
                .description(description)
                .secret_string(secret_string)
                .send()
                .await
                .map(|output| output.arn().unwrap_or_default().to_string())
                .map_err(|error| {
                    format!(
                        "failed to create secret: {}",
                        aws_sdk_secretsmanager::error::DisplayErrorContext(&error)
                    )
                })
        })
    }
}

pub struct TransferFamilyService {
    transfer_client: aws_sdk_transfer::Client,
}

impl TransferFamilyService {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            transfer_client: aws_sdk_transfer::Client::new(sdk_config),
        }
    }
}

fn transfer_failure(operation: &str, error: impl std::error::Error) -> TransferError {
    TransferError::Service(format!(
        "failed to {operation}: {}",
        aws_sdk_transfer::error::DisplayErrorContext(&error)
    ))
}

impl TransferService for TransferFamilyService {
    fn import_host_key(
        &self,
        server_id: &str,
        host_key_body: &str,
    ) -> Result<String, TransferError> {
        let server_id = server_id.to_string();
        let host_key_body = host_key_body.to_string();
        let client = self.transfer_client.clone();

        block_on(async move {
            client
                .import_host_key()
                .server_id(server_id)
                .host_key_body(host_key_body)
                .send()
                .await
                .map(|output| output.host_key_id().to_string())
                .map_err(|error| transfer_failure("import host key", error))
        })
    }

    fn import_ssh_public_key(
        &self,
        server_id: &str,
        username: &str,
        ssh_public_key_body: &str,
    ) -> Result<String, TransferError> {
        let server_id = server_id.to_string();
        let user_name = username.to_string();
        let ssh_public_key_body = ssh_public_key_body.to_string();
        let client = self.transfer_client.clone();

        block_on(async move {
            let result = client
                .import_ssh_public_key()
                .server_id(server_id)
                .user_name(user_name.clone())
                .ssh_public_key_body(ssh_public_key_body)
                .send()
                .await;

            match result {
                Ok(output) => Ok(output.ssh_public_key_id().to_string()),
                Err(error)
                    if error
                        .as_service_error()
                        .is_some_and(|service| service.is_resource_not_found_exception()) =>
                {
                    Err(TransferError::UserNotFound(user_name))
                }
                Err(error) => Err(transfer_failure("import ssh public key", error)),
            }
        })
    }

    fn create_user(&self, request: &SftpUserRequest) -> Result<String, TransferError> {
        let tags = request
            .tags
            .iter()
            .map(|(key, value)| {
                Tag::builder()
                    .key(key)
                    .value(value)
                    .build()
                    .map_err(|error| TransferError::Service(format!("invalid user tag: {error}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let request = request.clone();
        let client = self.transfer_client.clone();

        block_on(async move {
            client
                .create_user()
                .server_id(request.server_id)
                .user_name(request.username)
                .role(request.role)
                .home_directory(request.home_directory)
                .home_directory_type(HomeDirectoryType::Path)
                .ssh_public_key_body(request.ssh_public_key)
                .set_tags(Some(tags))
                .send()
                .await
                .map(|output| output.user_name().to_string())
                .map_err(|error| transfer_failure("create sftp user", error))
        })
    }
}
