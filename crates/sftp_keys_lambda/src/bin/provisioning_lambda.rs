use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use sftp_keys_core::contract::{ProvisioningEvent, ProvisioningResponse};
use sftp_keys_lambda::adapters::aws::{
    load_sdk_config, S3KeyObjectStore, SecretsManagerStore, TransferFamilyService,
};
use sftp_keys_lambda::config::ProvisioningConfig;
use sftp_keys_lambda::facade::KeyServices;
use sftp_keys_lambda::handlers::provisioning::handle_provisioning_event;
use sftp_keys_lambda::logging::init_tracing;
use tracing::error;

const COMPONENT: &str = "provisioning_lambda";

struct RuntimeDependencies {
    config: ProvisioningConfig,
    store: S3KeyObjectStore,
    secrets: SecretsManagerStore,
    transfer: TransferFamilyService,
}

async fn handle_request(
    event: LambdaEvent<Value>,
    deps: &RuntimeDependencies,
) -> Result<ProvisioningResponse, Error> {
    let request = decode_event(event.payload)?;
    let services = KeyServices::new(&deps.store, &deps.secrets, &deps.transfer);

    handle_provisioning_event(&request, &deps.config, &services).map_err(|failure| {
        error!(
            component = COMPONENT,
            event = "request_failed",
            request_type = %request.request_type,
            error = %failure,
        );
        Error::from(failure)
    })
}

fn decode_event(payload: Value) -> Result<ProvisioningEvent, Error> {
    serde_json::from_value(payload)
        .map_err(|error| Error::from(format!("invalid provisioning event: {error}")))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let config = ProvisioningConfig::from_env().map_err(|failure| {
        error!(component = COMPONENT, event = "config_invalid", error = %failure);
        Error::from(failure)
    })?;
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

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_custom_resource_payload() {
        let request = decode_event(json!({
            "RequestType": "Delete",
            "PhysicalResourceId": "CustomResourcePhysicalID",
            "ResourceProperties": {}
        }))
        .expect("payload should decode");

        assert_eq!(request.request_type, "Delete");
        assert_eq!(
            request.physical_resource_id.as_deref(),
            Some("CustomResourcePhysicalID")
        );
    }

    #[test]
    fn rejects_payload_without_request_type() {
        let error = decode_event(json!({"ResourceProperties": {}}))
            .expect_err("missing request type should fail");
        assert!(error.to_string().contains("invalid provisioning event"));
    }
}
