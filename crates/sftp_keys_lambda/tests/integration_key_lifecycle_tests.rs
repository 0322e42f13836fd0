use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::RsaPrivateKey;
use serde_json::json;
use sftp_keys_core::contract::{
    ProvisioningEvent, RecordOutcome, StorageEvent, StorageEventRecord,
};
use sftp_keys_lambda::config::{IngestionConfig, ProvisioningConfig};
use sftp_keys_lambda::facade::KeyServices;
use sftp_keys_lambda::handlers::ingestion::handle_storage_event;
use sftp_keys_lambda::handlers::provisioning::handle_provisioning_event;
use sftp_keys_lambda::test_helpers::{
    InMemoryKeyStore, RecordingSecretStore, RecordingTransferService,
};
use ssh_key::public::{KeyData, RsaPublicKey};
use ssh_key::PublicKey;
use tempfile::TempDir;

const KEY_BUCKET: &str = "key-bucket";

fn provisioning_config() -> ProvisioningConfig {
    ProvisioningConfig::from_lookup(|name| {
        let value = match name {
            "PHYSICAL_ID" => Some("CustomResourcePhysicalID"),
            "ENV" => Some("dev"),
            "KEY_BUCKET" => Some(KEY_BUCKET),
            "REGION" => Some("eu-west-1"),
            "STORE_KEY_SECRET" => Some("true"),
            _ => None,
        };
        value.map(str::to_string)
    })
    .expect("provisioning config should load")
}

fn ingestion_config(scratch: &TempDir) -> IngestionConfig {
    let scratch_dir = scratch.path().display().to_string();
    IngestionConfig::from_lookup(move |name| {
        match name {
            "ENV" => Some("dev".to_string()),
            "KEY_BUCKET" => Some(KEY_BUCKET.to_string()),
            "SFTP_BUCKET" => Some("sftp-server-data-bucket".to_string()),
            "SFTP_USER_ROLE" => Some("arn:aws:iam::123456789012:role/SftpAccessRole".to_string()),
            "REGION" => Some("eu-west-1".to_string()),
            "SERVER_ID" => Some("s-0123456789abcdef0".to_string()),
            "CONNECTOR_ID" => Some("c-0123456789abcdef0".to_string()),
            "SECRET_PREFIX" => Some("dev/SFTPSecrets/".to_string()),
            "SCRATCH_DIR" => Some(scratch_dir.clone()),
            _ => None,
        }
    })
    .expect("ingestion config should load")
}

fn create_event() -> ProvisioningEvent {
    serde_json::from_value(json!({
        "RequestType": "Create",
        "ResourceProperties": {"stageName": "dev"}
    }))
    .expect("event should parse")
}

fn object_text(store: &InMemoryKeyStore, key: &str) -> String {
    String::from_utf8(store.body(key).expect("object should exist")).expect("utf-8 body")
}

#[test]
fn provisioned_pair_flows_into_transfer_service() {
    let store = InMemoryKeyStore::new();
    let secrets = RecordingSecretStore::new();
    let transfer = RecordingTransferService::new();
    let services = KeyServices::new(&store, &secrets, &transfer);
    let scratch = TempDir::new().expect("temp dir");

    handle_provisioning_event(&create_event(), &provisioning_config(), &services)
        .expect("provisioning should succeed");
    handle_provisioning_event(&create_event(), &provisioning_config(), &services)
        .expect("repeated provisioning should succeed");

    assert_eq!(
        store.keys(),
        vec![
            "ssh_keys/FirstUser.pem".to_string(),
            "ssh_keys/FirstUser.pub".to_string()
        ]
    );
    assert_eq!(secrets.created().len(), 1);

    let notifications = StorageEvent {
        records: store
            .keys()
            .into_iter()
            .map(|key| StorageEventRecord::new(KEY_BUCKET, key))
            .collect(),
    };
    let response = handle_storage_event(&notifications, &ingestion_config(&scratch), &services)
        .expect("ingestion should succeed");

    assert_eq!(response.records_processed, 2);
    assert_eq!(response.reports[1].outcome, RecordOutcome::SftpUserCreated);

    let created = transfer.created_users();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].username, "FirstUser");
    assert_eq!(
        created[0].ssh_public_key,
        object_text(&store, "ssh_keys/FirstUser.pub")
    );
}

#[test]
fn uploaded_public_key_matches_uploaded_private_key() {
    let store = InMemoryKeyStore::new();
    let secrets = RecordingSecretStore::new();
    let transfer = RecordingTransferService::new();
    let services = KeyServices::new(&store, &secrets, &transfer);

    handle_provisioning_event(&create_event(), &provisioning_config(), &services)
        .expect("provisioning should succeed");

    let private_key = RsaPrivateKey::from_pkcs1_pem(&object_text(&store, "ssh_keys/FirstUser.pem"))
        .expect("private key should parse");
    let recovered = KeyData::Rsa(
        RsaPublicKey::try_from(private_key.to_public_key()).expect("public key should convert"),
    );
    let uploaded = PublicKey::from_openssh(&object_text(&store, "ssh_keys/FirstUser.pub"))
        .expect("public key should parse");

    assert_eq!(uploaded.key_data(), &recovered);
}

#[test]
fn later_key_rotation_reaches_existing_user_as_import() {
    let store = InMemoryKeyStore::new();
    let secrets = RecordingSecretStore::new();
    let transfer = RecordingTransferService::new().with_existing_user("FirstUser");
    let services = KeyServices::new(&store, &secrets, &transfer);
    let scratch = TempDir::new().expect("temp dir");

    handle_provisioning_event(&create_event(), &provisioning_config(), &services)
        .expect("provisioning should succeed");

    let config = ingestion_config(&scratch);
    for key in ["ssh_keys/FirstUser.pub", "ssh_keys/FirstUser.pem"] {
        let single = StorageEvent {
            records: vec![StorageEventRecord::new(KEY_BUCKET, key)],
        };
        handle_storage_event(&single, &config, &services).expect("ingestion should succeed");
    }

    let imports = transfer.ssh_public_keys();
    assert_eq!(imports.len(), 1);
    assert_eq!(imports[0].username, "FirstUser");
    assert!(transfer.created_users().is_empty());
}
