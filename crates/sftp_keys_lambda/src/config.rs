//! Environment-derived settings, read once per cold start.
//!
//! Both configs are built from an injectable lookup so tests never touch the
//! process environment.

use std::path::PathBuf;

use sftp_keys_core::contract::DEFAULT_SFTP_USERNAME;

use crate::error::ConfigError;

pub const VERBOSE_ENVIRONMENT: &str = "dev";
pub const DEFAULT_SCRATCH_DIR: &str = "/tmp";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningConfig {
    pub physical_id: String,
    pub environment: String,
    pub key_bucket: String,
    pub region: String,
    pub default_username: String,
    pub secret_prefix: String,
    pub store_key_secret: bool,
}

impl ProvisioningConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let environment = required(&lookup, "ENV")?;
        let secret_prefix = optional(&lookup, "SECRET_PREFIX")
            .unwrap_or_else(|| default_secret_prefix(&environment));

        Ok(Self {
            physical_id: required(&lookup, "PHYSICAL_ID")?,
            key_bucket: required(&lookup, "KEY_BUCKET")?,
            region: required(&lookup, "REGION")?,
            default_username: optional(&lookup, "SFTP_USERNAME")
                .unwrap_or_else(|| DEFAULT_SFTP_USERNAME.to_string()),
            secret_prefix,
            store_key_secret: flag(&lookup, "STORE_KEY_SECRET")?,
            environment,
        })
    }

    pub fn verbose(&self) -> bool {
        self.environment == VERBOSE_ENVIRONMENT
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionConfig {
    pub environment: String,
    pub key_bucket: String,
    pub sftp_bucket: String,
    pub sftp_user_role: String,
    pub region: String,
    pub server_id: String,
    pub connector_id: String,
    pub secret_prefix: String,
    pub scratch_dir: PathBuf,
}

impl IngestionConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let environment = required(&lookup, "ENV")?;
        let secret_prefix = optional(&lookup, "SECRET_PREFIX")
            .unwrap_or_else(|| default_secret_prefix(&environment));

        Ok(Self {
            key_bucket: required(&lookup, "KEY_BUCKET")?,
            sftp_bucket: required(&lookup, "SFTP_BUCKET")?,
            sftp_user_role: required(&lookup, "SFTP_USER_ROLE")?,
            region: required(&lookup, "REGION")?,
            server_id: required(&lookup, "SERVER_ID")?,
            connector_id: required(&lookup, "CONNECTOR_ID")?,
            secret_prefix,
            scratch_dir: optional(&lookup, "SCRATCH_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SCRATCH_DIR)),
            environment,
        })
    }

    pub fn verbose(&self) -> bool {
        self.environment == VERBOSE_ENVIRONMENT
    }

    /// Home directory assigned to users created by the ingestion flow.
    pub fn home_directory(&self, username: &str) -> String {
        format!(
            "/{}/home/{username}",
            self.sftp_bucket.trim_matches('/')
        )
    }
}

pub fn default_secret_prefix(environment: &str) -> String {
    format!("{environment}/SFTPSecrets/")
}

fn optional(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, ConfigError> {
    optional(lookup, name).ok_or(ConfigError::Missing(name))
}

fn flag(lookup: &impl Fn(&str) -> Option<String>, name: &'static str) -> Result<bool, ConfigError> {
    let Some(value) = optional(lookup, name) else {
        return Ok(false);
    };

    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            value,
            reason: "expected true or false",
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |name| values.get(name).cloned()
    }

    fn ingestion_pairs() -> Vec<(&'static str, &'static str)> {
        vec![
            ("ENV", "dev"),
            ("KEY_BUCKET", "key-bucket"),
            ("SFTP_BUCKET", "sftp-server-data-bucket"),
            ("SFTP_USER_ROLE", "arn:aws:iam::123456789012:role/SftpAccessRole"),
            ("REGION", "eu-west-1"),
            ("SERVER_ID", "s-0123456789abcdef0"),
            ("CONNECTOR_ID", "c-0123456789abcdef0"),
            ("SECRET_PREFIX", "dev/SFTPSecrets/"),
        ]
    }

    #[test]
    fn provisioning_defaults_optional_settings() {
        let config = ProvisioningConfig::from_lookup(lookup_from(&[
            ("PHYSICAL_ID", "CustomResourcePhysicalID"),
            ("ENV", "prod"),
            ("KEY_BUCKET", "key-bucket"),
            ("REGION", "eu-west-1"),
        ]))
        .expect("config should load");

        assert_eq!(config.default_username, "FirstUser");
        assert_eq!(config.secret_prefix, "prod/SFTPSecrets/");
        assert!(!config.store_key_secret);
        assert!(!config.verbose());
    }

    #[test]
    fn provisioning_requires_physical_id() {
        let error = ProvisioningConfig::from_lookup(lookup_from(&[
            ("ENV", "dev"),
            ("KEY_BUCKET", "key-bucket"),
            ("REGION", "eu-west-1"),
        ]))
        .expect_err("missing physical id should fail");

        assert_eq!(error, ConfigError::Missing("PHYSICAL_ID"));
    }

    #[test]
    fn blank_values_count_as_missing() {
        let error = ProvisioningConfig::from_lookup(lookup_from(&[
            ("PHYSICAL_ID", "id"),
            ("ENV", "dev"),
            ("KEY_BUCKET", "  "),
            ("REGION", "eu-west-1"),
        ]))
        .expect_err("blank bucket should fail");

        assert_eq!(error, ConfigError::Missing("KEY_BUCKET"));
    }

    #[test]
    fn rejects_unparseable_secret_flag() {
        let error = ProvisioningConfig::from_lookup(lookup_from(&[
            ("PHYSICAL_ID", "id"),
            ("ENV", "dev"),
            ("KEY_BUCKET", "key-bucket"),
            ("REGION", "eu-west-1"),
            ("STORE_KEY_SECRET", "sometimes"),
        ]))
        .expect_err("invalid flag should fail");

        assert!(matches!(
            error,
            ConfigError::Invalid {
                name: "STORE_KEY_SECRET",
                ..
            }
        ));
    }

    #[test]
    fn ingestion_loads_all_settings() {
        let config =
            IngestionConfig::from_lookup(lookup_from(&ingestion_pairs())).expect("config should load");

        assert_eq!(config.server_id, "s-0123456789abcdef0");
        assert_eq!(config.scratch_dir, PathBuf::from("/tmp"));
        assert!(config.verbose());
    }

    #[test]
    fn ingestion_defaults_secret_prefix_from_environment() {
        let pairs: Vec<_> = ingestion_pairs()
            .into_iter()
            .filter(|(key, _)| *key != "SECRET_PREFIX")
            .collect();

        let config = IngestionConfig::from_lookup(lookup_from(&pairs))
            .expect("missing secret prefix should not be fatal");
        assert_eq!(config.secret_prefix, "dev/SFTPSecrets/");
    }

    #[test]
    fn ingestion_requires_server_id() {
        let pairs: Vec<_> = ingestion_pairs()
            .into_iter()
            .filter(|(key, _)| *key != "SERVER_ID")
            .collect();

        let error = IngestionConfig::from_lookup(lookup_from(&pairs))
            .expect_err("missing server id should fail");
        assert_eq!(error, ConfigError::Missing("SERVER_ID"));
    }

    #[test]
    fn home_directory_is_absolute_under_sftp_bucket() {
        let mut pairs = ingestion_pairs();
        pairs.push(("SCRATCH_DIR", "/var/scratch"));
        let config = IngestionConfig::from_lookup(lookup_from(&pairs)).expect("config should load");

        assert_eq!(
            config.home_directory("FirstUser"),
            "/sftp-server-data-bucket/home/FirstUser"
        );
        assert_eq!(config.scratch_dir, PathBuf::from("/var/scratch"));
    }
}
