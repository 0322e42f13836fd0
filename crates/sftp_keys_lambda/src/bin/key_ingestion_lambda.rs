use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use sftp_keys_core::contract::{IngestionResponse, StorageEvent};
use sftp_keys_lambda::adapters::aws::{
    load_sdk_config, S3KeyObjectStore, SecretsManagerStore, TransferFamilyService,
};
use sftp_keys_lambda::config::IngestionConfig;
use sftp_keys_lambda::facade::KeyServices;
use sftp_keys_lambda::handlers::ingestion::handle_storage_event;
use sftp_keys_lambda::logging::init_tracing;
use tracing::{error, info};

const COMPONENT: &str = "key_ingestion_lambda";

struct RuntimeDependencies {
    config: IngestionConfig,
    store: S3KeyObjectStore,
    secrets: SecretsManagerStore,
    transfer: TransferFamilyService,
}

async fn handle_request(
    event: LambdaEvent<Value>,
    deps: &RuntimeDependencies,
) -> Result<IngestionResponse, Error> {
    let batch = decode_event(event.payload)?;
    let services = KeyServices::new(&deps.store, &deps.secrets, &deps.transfer);

    handle_storage_event(&batch, &deps.config, &services).map_err(|failure| {
        error!(
            component = COMPONENT,
            event = "batch_failed",
            records = batch.records.len(),
            error = %failure,
        );
        Error::from(failure)
    })
}

fn decode_event(payload: Value) -> Result<StorageEvent, Error> {
    if payload.get("Records").and_then(Value::as_array).is_none() {
        return Err(Error::from("storage event must include Records array"));
    }

    serde_json::from_value(payload)
        .map_err(|error| Error::from(format!("invalid storage event: {error}")))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let config = IngestionConfig::from_env().map_err(|failure| {
        error!(component = COMPONENT, event = "config_invalid", error = %failure);
        Error::from(failure)
    })?;
    info!(
        component = COMPONENT,
        event = "cold_start",
        key_bucket = %config.key_bucket,
        server_id = %config.server_id,
        connector_id = %config.connector_id,
        secret_prefix = %config.secret_prefix,
    );

    let sdk_config = load_sdk_config(&config.region).await;
    let deps = RuntimeDependencies {
        store: S3KeyObjectStore::new(config.key_bucket.clone(), &sdk_config),
        secrets: SecretsManagerStore::new(&sdk_config),
        transfer: TransferFamilyService::new(&sdk_config),
        config,
    };

    let deps = &deps;
    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        handle_request(event, deps).await
    }))
    .await
}
