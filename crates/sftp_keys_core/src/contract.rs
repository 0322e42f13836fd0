use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_SFTP_USERNAME: &str = "FirstUser";
pub const INGESTION_RESPONSE_STATUS_OK: &str = "ok";

/// Lifecycle operation carried by a custom-resource event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestType {
    Create,
    Update,
    Delete,
}

impl RequestType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Update => "Update",
            Self::Delete => "Delete",
        }
    }
}

impl FromStr for RequestType {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Create" => Ok(Self::Create),
            "Update" => Ok(Self::Update),
            "Delete" => Ok(Self::Delete),
            other => Err(ValidationError::new(format!(
                "Invalid request type: {other}"
            ))),
        }
    }
}

/// CloudFormation custom-resource event delivered to the provisioning handler.
///
/// `RequestType` stays a raw string so an unrecognized value reaches the
/// handler and is reported there instead of failing deserialization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct ProvisioningEvent {
    pub request_type: String,
    #[serde(default)]
    pub resource_properties: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_resource_id: Option<String>,
}

impl ProvisioningEvent {
    pub fn request_type(&self) -> Result<RequestType, ValidationError> {
        self.request_type.parse()
    }

    /// `ResourceProperties.UserName`, when it is a non-blank string.
    pub fn user_name(&self) -> Option<&str> {
        self.resource_properties
            .get("UserName")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

/// Transfer service user name rule: 3 to 100 characters, no leading `@`,
/// `.` or `-`.
pub const SFTP_USERNAME_PATTERN: &str = r"^[A-Za-z0-9_][A-Za-z0-9_@.-]{2,99}$";

static SFTP_USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(SFTP_USERNAME_PATTERN).expect("user name pattern compiles"));

/// The name becomes an object key segment and a secret name suffix, so a
/// rejected name never reaches storage.
pub fn validate_sftp_username(username: &str) -> Result<(), ValidationError> {
    if SFTP_USERNAME_RE.is_match(username) {
        Ok(())
    } else {
        Err(ValidationError::new(format!(
            "Invalid user name '{username}': must match {SFTP_USERNAME_PATTERN}"
        )))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProvisioningResponse {
    #[serde(rename = "PhysicalResourceId")]
    pub physical_resource_id: String,
}

/// S3 notification envelope delivered to the key ingestion handler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct StorageEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<StorageEventRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageEventRecord {
    #[serde(rename = "eventName", default, skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    pub s3: StorageEntity,
}

impl StorageEventRecord {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            event_name: None,
            s3: StorageEntity {
                bucket: StorageBucket {
                    name: bucket.into(),
                },
                object: StorageObject {
                    key: key.into(),
                    size: None,
                },
            },
        }
    }

    pub fn bucket_name(&self) -> &str {
        &self.s3.bucket.name
    }

    pub fn object_key(&self) -> &str {
        &self.s3.object.key
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageEntity {
    pub bucket: StorageBucket,
    pub object: StorageObject,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageBucket {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageObject {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecordOutcome {
    SkippedForeignBucket,
    AwaitingPair,
    SshKeyRegistered,
    SftpUserCreated,
    HostKeyImported,
    Unrecognized,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordReport {
    pub object_key: String,
    pub outcome: RecordOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngestionResponse {
    pub status: String,
    pub records_processed: usize,
    pub reports: Vec<RecordReport>,
}

/// Transfer Family user definition derived from a completed key pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SftpUserRequest {
    pub username: String,
    pub server_id: String,
    pub role: String,
    pub home_directory: String,
    pub ssh_public_key: String,
    pub tags: Vec<(String, String)>,
}

/// Secrets store payload for a generated key pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct KeyPairSecret {
    pub username: String,
    pub public_key: String,
    pub private_key: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}
