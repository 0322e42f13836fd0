use sftp_keys_core::contract::{
    IngestionResponse, RecordOutcome, RecordReport, SftpUserRequest, StorageEvent,
    StorageEventRecord, INGESTION_RESPONSE_STATUS_OK,
};
use sftp_keys_core::storage_keys::{
    classify_object_key, decode_object_key, key_file_name, object_file_name, KeyHalf,
    KeyObjectKind,
};
use tracing::{info, warn};

use crate::config::IngestionConfig;
use crate::error::KeyManagementError;
use crate::facade::{is_key_pair_downloaded, read_scratch_file, KeyServices, SshKeyImport};

const COMPONENT: &str = "key_ingestion_handler";
pub const CREATED_BY_TAG: (&str, &str) = ("created_by", "key_management_lambda");

/// Processes a batch of key bucket notifications in order.
///
/// The first failing record aborts the batch. Registrations already made for
/// earlier records stay in place.
pub fn handle_storage_event(
    event: &StorageEvent,
    config: &IngestionConfig,
    services: &KeyServices<'_>,
) -> Result<IngestionResponse, KeyManagementError> {
    if config.verbose() {
        info!(component = COMPONENT, event = "batch_received", request = ?event);
    }

    let mut reports = Vec::with_capacity(event.records.len());
    for record in &event.records {
        reports.push(process_record(record, config, services)?);
    }

    Ok(IngestionResponse {
        status: INGESTION_RESPONSE_STATUS_OK.to_string(),
        records_processed: reports.len(),
        reports,
    })
}

fn process_record(
    record: &StorageEventRecord,
    config: &IngestionConfig,
    services: &KeyServices<'_>,
) -> Result<RecordReport, KeyManagementError> {
    if record.bucket_name() != config.key_bucket {
        info!(
            component = COMPONENT,
            event = "record_skipped",
            bucket = record.bucket_name(),
            key = record.object_key(),
        );
        return Ok(report(record.object_key(), RecordOutcome::SkippedForeignBucket, None));
    }

    let object_key = decode_object_key(record.object_key());
    let kind = classify_object_key(&object_key);
    if let KeyObjectKind::Unknown { reason } = &kind {
        // Folder markers such as `ssh_keys/` have nothing to download.
        if object_file_name(&object_key).is_empty() {
            return Ok(unrecognized(&object_key, reason));
        }
    }
    let local_file = services.download_to_scratch(&object_key, &config.scratch_dir)?;

    match kind {
        KeyObjectKind::SshKey { username, half } => {
            if !is_key_pair_downloaded(&username, &config.scratch_dir) {
                info!(
                    component = COMPONENT,
                    event = "awaiting_pair",
                    username = %username,
                    missing = %key_file_name(&username, half.counterpart()),
                );
                return Ok(report(&object_key, RecordOutcome::AwaitingPair, Some(username)));
            }

            let outcome = register_user_key(&username, config, services)?;
            Ok(report(&object_key, outcome, Some(username)))
        }
        KeyObjectKind::HostKey => {
            let host_key_body = read_scratch_file(&local_file)?;
            let host_key_id = services.add_host_key(&config.server_id, &host_key_body)?;
            info!(
                component = COMPONENT,
                event = "host_key_imported",
                key = %object_key,
                server_id = %config.server_id,
                host_key_id = %host_key_id,
            );
            Ok(report(&object_key, RecordOutcome::HostKeyImported, None))
        }
        KeyObjectKind::Unknown { reason } => Ok(unrecognized(&object_key, &reason)),
    }
}

fn unrecognized(object_key: &str, reason: &str) -> RecordReport {
    warn!(
        component = COMPONENT,
        event = "record_unrecognized",
        key = %object_key,
        reason = %reason,
    );
    report(object_key, RecordOutcome::Unrecognized, None)
}

/// Imports the downloaded public key for `username`, creating the user when
/// the transfer server does not know it yet.
fn register_user_key(
    username: &str,
    config: &IngestionConfig,
    services: &KeyServices<'_>,
) -> Result<RecordOutcome, KeyManagementError> {
    let public_key_path = config
        .scratch_dir
        .join(key_file_name(username, KeyHalf::Public));
    let ssh_public_key = read_scratch_file(&public_key_path)?;

    match services.add_ssh_public_key(username, &config.server_id, &ssh_public_key)? {
        SshKeyImport::Imported { ssh_public_key_id } => {
            info!(
                component = COMPONENT,
                event = "ssh_key_registered",
                username,
                server_id = %config.server_id,
                ssh_public_key_id = %ssh_public_key_id,
            );
            Ok(RecordOutcome::SshKeyRegistered)
        }
        SshKeyImport::UserMissing => {
            let request = SftpUserRequest {
                username: username.to_string(),
                server_id: config.server_id.clone(),
                role: config.sftp_user_role.clone(),
                home_directory: config.home_directory(username),
                ssh_public_key,
                tags: vec![(CREATED_BY_TAG.0.to_string(), CREATED_BY_TAG.1.to_string())],
            };
            services.create_sftp_user(&request)?;
            info!(
                component = COMPONENT,
                event = "sftp_user_created",
                username,
                server_id = %config.server_id,
                home_directory = %request.home_directory,
            );
            Ok(RecordOutcome::SftpUserCreated)
        }
    }
}

fn report(object_key: &str, outcome: RecordOutcome, username: Option<String>) -> RecordReport {
    RecordReport {
        object_key: object_key.to_string(),
        outcome,
        username,
    }
}
