use std::sync::Arc;

use serde_json::Value;

use super::{parse, respond};
use crate::application::errors::OcppResult;
use crate::application::station_handle::StationHandle;
use crate::domain::configuration::ConfigSideEffect;
use crate::domain::error::DomainError;
use crate::domain::ocpp::enums::ConfigurationStatus;
use crate::domain::ocpp::messages::{ChangeConfigurationConf, ChangeConfigurationReq};

/// Open question 2 (`spec.md` §9): an unknown key is normalized to
/// `NotSupported` rather than left as an unhandled fallthrough.
pub async fn handle(handle: &Arc<StationHandle>, payload: Value) -> OcppResult<Value> {
    let req: ChangeConfigurationReq = parse(payload)?;

    let outcome = handle
        .with_state("change_configuration", |s| s.configuration.set(&req.key, req.value.clone()))
        .await;

    let status = match outcome {
        Ok(outcome) => {
            match outcome.side_effect {
                ConfigSideEffect::RestartHeartbeat => {
                    tracing::info!(key = %req.key, "restarting heartbeat timer");
                    handle.heartbeat_restart.notify_one();
                }
                ConfigSideEffect::RestartWebSocketPing => {
                    tracing::info!("restarting websocket ping timer");
                    handle.ping_restart.notify_one();
                }
                ConfigSideEffect::None => {}
            }
            if outcome.reboot_required {
                ConfigurationStatus::RebootRequired
            } else {
                ConfigurationStatus::Accepted
            }
        }
        Err(DomainError::ConfigurationReadOnly(_)) => ConfigurationStatus::Rejected,
        Err(DomainError::ConfigurationUnknown(_)) => ConfigurationStatus::NotSupported,
        Err(_) => ConfigurationStatus::Rejected,
    };

    respond(ChangeConfigurationConf { status })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::diagnostics::test_support::StubDiagnostics;
    use crate::application::outbound::test_support::RecordingAdapter;
    use crate::application::perf::NullPerformanceSink;
    use crate::application::router;
    use crate::domain::ocpp::enums::RegistrationStatus;
    use crate::domain::StationDescriptor;

    fn descriptor() -> StationDescriptor {
        StationDescriptor {
            charging_station_id: "CS-1".into(),
            connector_count: 1,
            charge_point_vendor: "Acme".into(),
            charge_point_model: "Sim".into(),
            automatic_transaction_generator: Default::default(),
            reset_time_secs: 60,
            smart_charging_enabled: true,
            firmware_management_enabled: true,
            remote_trigger_enabled: true,
            authorized_tags: vec![],
            require_authorize: false,
            authorize_remote_tx_requests: false,
            local_auth_list_enabled: false,
            may_authorize_at_remote_start: false,
            ocpp_strict_compliance: true,
            begin_end_meter_values: false,
            out_of_order_end_meter_values: false,
        }
    }

    /// `HeartBeatInterval`/`HeartbeatInterval` stay synchronized across the
    /// alias pair and the heartbeat timer is restarted.
    #[tokio::test]
    async fn heartbeat_alias_restarts_once() {
        let adapter = Arc::new(RecordingAdapter::default());
        let handle = StationHandle::new(descriptor(), adapter, Arc::new(NullPerformanceSink), Arc::new(StubDiagnostics::failing()));
        handle.with_state("setup", |s| s.registration = RegistrationStatus::Registered).await;

        let response = router::route(
            &handle,
            "ChangeConfiguration",
            serde_json::json!({"key": "HeartBeatInterval", "value": "30"}),
        )
        .await
        .unwrap();
        assert_eq!(response["status"], "Accepted");

        let get_response = router::route(&handle, "GetConfiguration", serde_json::json!({"key": ["HeartbeatInterval"]}))
            .await
            .unwrap();
        let found = &get_response["configurationKey"][0];
        assert_eq!(found["value"], "30");
    }
}
