//! C3: the request router. Gates an incoming `(commandName, payload)` pair
//! on registration state before handing it to C4, the way the teacher's
//! dispatcher gates on session auth before forwarding to a command handler.

use std::sync::Arc;

use serde_json::Value;

use crate::application::errors::{OcppError, OcppResult};
use crate::application::handlers;
use crate::application::station_handle::StationHandle;
use crate::domain::ocpp::enums::RegistrationStatus;

const REMOTE_TRANSACTION_COMMANDS: [&str; 2] = ["RemoteStartTransaction", "RemoteStopTransaction"];

/// Dispatches one inbound OCPP command, applying the gating rules of
/// `spec.md` §4.3 before calling into C4.
pub async fn route(handle: &Arc<StationHandle>, command_name: &str, payload: Value) -> OcppResult<Value> {
    let registration = handle.with_state("router.read_registration", |s| s.registration).await;
    let strict = handle.descriptor.ocpp_strict_compliance;

    if registration == RegistrationStatus::Pending
        && strict
        && REMOTE_TRANSACTION_COMMANDS.contains(&command_name)
    {
        return Err(OcppError::SecurityError(format!(
            "{command_name} is not allowed while registration is Pending under strict compliance"
        )));
    }

    let accepted =
        registration == RegistrationStatus::Registered || (!strict && registration == RegistrationStatus::Unknown);
    if !accepted {
        return Err(OcppError::SecurityError(format!(
            "station is not registered to process {command_name}"
        )));
    }

    handlers::dispatch(handle, command_name, payload).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::diagnostics::test_support::StubDiagnostics;
    use crate::application::outbound::test_support::RecordingAdapter;
    use crate::application::perf::NullPerformanceSink;
    use crate::domain::StationDescriptor;

    fn descriptor(strict: bool) -> StationDescriptor {
        StationDescriptor {
            charging_station_id: "CS-1".into(),
            connector_count: 2,
            charge_point_vendor: "Acme".into(),
            charge_point_model: "Sim".into(),
            automatic_transaction_generator: Default::default(),
            reset_time_secs: 60,
            smart_charging_enabled: false,
            firmware_management_enabled: false,
            remote_trigger_enabled: false,
            authorized_tags: vec![],
            require_authorize: false,
            authorize_remote_tx_requests: false,
            local_auth_list_enabled: false,
            may_authorize_at_remote_start: false,
            ocpp_strict_compliance: strict,
            begin_end_meter_values: false,
            out_of_order_end_meter_values: false,
        }
    }

    async fn handle_with(registration: RegistrationStatus, strict: bool) -> Arc<StationHandle> {
        let handle = StationHandle::new(
            descriptor(strict),
            Arc::new(RecordingAdapter::default()),
            Arc::new(NullPerformanceSink),
            Arc::new(StubDiagnostics::failing()),
        );
        handle.with_state("setup", |s| s.registration = registration).await;
        handle
    }

    #[tokio::test]
    async fn unregistered_station_rejects_with_security_error() {
        let handle = handle_with(RegistrationStatus::Unregistered, true).await;
        let err = route(&handle, "ClearCache", serde_json::json!({})).await.unwrap_err();
        assert_eq!(err.code(), "SecurityError");
    }

    #[tokio::test]
    async fn unknown_registration_is_accepted_when_not_strict() {
        let handle = handle_with(RegistrationStatus::Unknown, false).await;
        let result = route(&handle, "ClearCache", serde_json::json!({})).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn unknown_registration_is_rejected_when_strict() {
        let handle = handle_with(RegistrationStatus::Unknown, true).await;
        let err = route(&handle, "ClearCache", serde_json::json!({})).await.unwrap_err();
        assert_eq!(err.code(), "SecurityError");
    }

    #[tokio::test]
    async fn pending_strict_blocks_remote_transaction_commands() {
        let handle = handle_with(RegistrationStatus::Pending, true).await;
        let err = route(
            &handle,
            "RemoteStartTransaction",
            serde_json::json!({"connectorId": 1, "idTag": "TAG"}),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), "SecurityError");
    }

    #[tokio::test]
    async fn registered_station_reaches_unknown_command() {
        let handle = handle_with(RegistrationStatus::Registered, true).await;
        let err = route(&handle, "Bogus", serde_json::json!({})).await.unwrap_err();
        assert_eq!(err.code(), "NotImplemented");
    }
}
