use std::sync::Arc;

use serde_json::Value;

use super::{now, parse, respond, transaction_end_meter_values};
use crate::application::errors::OcppResult;
use crate::application::outbound::SendOptions;
use crate::application::station_handle::StationHandle;
use crate::domain::ocpp::enums::{ChargePointErrorCode, ChargePointStatus, RemoteStartStopStatus};
use crate::domain::ocpp::messages::{RemoteStopTransactionConf, RemoteStopTransactionReq, StatusNotificationReq, StopTransactionReq};

pub async fn handle(handle: &Arc<StationHandle>, payload: Value) -> OcppResult<Value> {
    let req: RemoteStopTransactionReq = parse(payload)?;

    let connector_id = handle
        .with_state("remote_stop.find", |s| s.connectors.connector_for_transaction(req.transaction_id))
        .await;

    let connector_id = match connector_id {
        Some(id) => id,
        None => {
            tracing::warn!(transaction_id = req.transaction_id, "RemoteStopTransaction: no matching connector");
            return respond(RemoteStopTransactionConf {
                status: RemoteStartStopStatus::Rejected,
            });
        }
    };

    handle
        .with_state("remote_stop.finishing", |s| {
            if let Ok(c) = s.connectors.get_mut(connector_id) {
                c.status = ChargePointStatus::Finishing;
            }
        })
        .await;
    let _ = handle
        .outbound()
        .status_notification(
            StatusNotificationReq {
                connector_id,
                error_code: ChargePointErrorCode::NoError,
                status: ChargePointStatus::Finishing,
                timestamp: now(),
                info: None,
            },
            SendOptions::default(),
        )
        .await;

    let (register, id_tag) = handle
        .with_state("remote_stop.read", |s| {
            let c = s.connectors.get(connector_id).expect("looked up by transaction id above");
            (c.transaction_energy_active_import_register, c.transaction_id_tag.clone())
        })
        .await;

    let descriptor = &handle.descriptor;
    if descriptor.begin_end_meter_values && descriptor.ocpp_strict_compliance && !descriptor.out_of_order_end_meter_values {
        let meter_req = transaction_end_meter_values(connector_id, req.transaction_id, register);
        let _ = handle.outbound().meter_values(meter_req).await;
    }

    let _ = handle
        .outbound()
        .stop_transaction(StopTransactionReq {
            transaction_id: req.transaction_id,
            meter_stop: register as i64,
            timestamp: now(),
            id_tag,
            reason: None,
        })
        .await;

    handle
        .with_state("remote_stop.clear", |s| {
            if let Ok(c) = s.connectors.get_mut(connector_id) {
                c.clear_transaction();
            }
        })
        .await;

    respond(RemoteStopTransactionConf {
        status: RemoteStartStopStatus::Accepted,
    })
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

    #[tokio::test]
    async fn unknown_transaction_is_rejected_with_no_outbound_stop() {
        let adapter = Arc::new(RecordingAdapter::default());
        let handle = StationHandle::new(descriptor(), adapter.clone(), Arc::new(NullPerformanceSink), Arc::new(StubDiagnostics::failing()));
        handle.with_state("setup", |s| s.registration = RegistrationStatus::Registered).await;

        let response = router::route(&handle, "RemoteStopTransaction", serde_json::json!({"transactionId": 99}))
            .await
            .unwrap();
        assert_eq!(response["status"], "Rejected");

        let sent = adapter.sent.lock().unwrap();
        assert!(!sent.iter().any(|(action, _)| action == "StopTransaction"));
    }
}
