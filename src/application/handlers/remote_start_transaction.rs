use std::sync::Arc;

use serde_json::Value;

use super::{now, parse, respond};
use crate::application::errors::OcppResult;
use crate::application::outbound::SendOptions;
use crate::application::station_handle::StationHandle;
use crate::domain::connector::Connector;
use crate::domain::ocpp::enums::{
    Availability, AuthorizationStatus, ChargePointErrorCode, ChargePointStatus, ChargingProfilePurpose,
    RemoteStartStopStatus,
};
use crate::domain::ocpp::messages::{
    ChargingProfile, RemoteStartTransactionConf, RemoteStartTransactionReq, StartTransactionReq,
    StatusNotificationReq,
};

/// Sets the connector back to `Available` if it had moved off it, emits the
/// matching `StatusNotification`, and returns a `Rejected` response —
/// the common tail of every rejection path in this handler.
async fn notify_rejected(handle: &Arc<StationHandle>, connector_id: u32) -> OcppResult<Value> {
    let was_not_available = handle
        .with_state("remote_start.check_status", |s| {
            s.connectors.get(connector_id).map(|c| c.status != ChargePointStatus::Available).unwrap_or(false)
        })
        .await;

    if was_not_available {
        handle
            .with_state("remote_start.reset_status", |s| {
                if let Ok(c) = s.connectors.get_mut(connector_id) {
                    c.status = ChargePointStatus::Available;
                }
            })
            .await;
        let _ = handle
            .outbound()
            .status_notification(
                StatusNotificationReq {
                    connector_id,
                    error_code: ChargePointErrorCode::NoError,
                    status: ChargePointStatus::Available,
                    timestamp: now(),
                    info: None,
                },
                SendOptions::default(),
            )
            .await;
    }

    tracing::warn!(connector_id, "RemoteStartTransaction rejected");
    respond(RemoteStartTransactionConf {
        status: RemoteStartStopStatus::Rejected,
    })
}

/// `None` profile is always allowed; a `TxProfile` is installed on the
/// connector; anything else is refused (`spec.md` §4.4).
fn install_profile(connector: &mut Connector, profile: Option<ChargingProfile>) -> bool {
    match profile {
        None => true,
        Some(p) if p.charging_profile_purpose == ChargingProfilePurpose::TxProfile => {
            connector.set_profile(p);
            true
        }
        Some(_) => {
            tracing::warn!("RemoteStartTransaction: charging profile must be TxProfile");
            false
        }
    }
}

pub async fn handle(handle: &Arc<StationHandle>, payload: Value) -> OcppResult<Value> {
    let req: RemoteStartTransactionReq = parse(payload)?;

    let connector_id = match req.connector_id {
        Some(id) if id > 0 => id,
        _ => {
            return respond(RemoteStartTransactionConf {
                status: RemoteStartStopStatus::Rejected,
            })
        }
    };

    let exists = handle.with_state("remote_start.exists", |s| s.connectors.lookup(connector_id).is_some()).await;
    if !exists {
        return respond(RemoteStartTransactionConf {
            status: RemoteStartStopStatus::Rejected,
        });
    }

    handle
        .with_state("remote_start.preparing", |s| {
            if let Ok(c) = s.connectors.get_mut(connector_id) {
                c.status = ChargePointStatus::Preparing;
            }
        })
        .await;
    let _ = handle
        .outbound()
        .status_notification(
            StatusNotificationReq {
                connector_id,
                error_code: ChargePointErrorCode::NoError,
                status: ChargePointStatus::Preparing,
                timestamp: now(),
                info: None,
            },
            SendOptions::default(),
        )
        .await;

    let station_available = handle
        .with_state("remote_start.station_available", |s| {
            s.connectors.get(0).map(|c| c.availability == Availability::Operative).unwrap_or(false)
        })
        .await;
    if !station_available {
        return notify_rejected(handle, connector_id).await;
    }

    if handle.descriptor.authorize_remote_tx_requests {
        let authorized = resolve_authorization(handle, connector_id, &req.id_tag).await;
        if !authorized {
            return notify_rejected(handle, connector_id).await;
        }
    }

    let installed = handle
        .with_state("remote_start.install_profile", |s| match s.connectors.get_mut(connector_id) {
            Ok(c) => install_profile(c, req.charging_profile.clone()),
            Err(_) => false,
        })
        .await;
    if !installed {
        return notify_rejected(handle, connector_id).await;
    }

    handle
        .with_state("remote_start.mark_remote", |s| {
            if let Ok(c) = s.connectors.get_mut(connector_id) {
                c.transaction_remote_started = true;
            }
        })
        .await;

    let start_result = handle
        .outbound()
        .start_transaction(StartTransactionReq {
            connector_id,
            id_tag: req.id_tag.clone(),
            meter_start: 0,
            timestamp: now(),
            reservation_id: None,
        })
        .await;

    match start_result {
        Ok(conf) if conf.id_tag_info.status == AuthorizationStatus::Accepted => {
            handle
                .with_state("remote_start.apply", |s| {
                    if let Ok(c) = s.connectors.get_mut(connector_id) {
                        c.start_transaction(conf.transaction_id, req.id_tag.clone());
                        c.status = ChargePointStatus::Charging;
                    }
                })
                .await;
            respond(RemoteStartTransactionConf {
                status: RemoteStartStopStatus::Accepted,
            })
        }
        _ => notify_rejected(handle, connector_id).await,
    }
}

async fn resolve_authorization(handle: &Arc<StationHandle>, connector_id: u32, id_tag: &str) -> bool {
    let local_hit = handle.descriptor.local_auth_list_enabled
        && !handle.descriptor.authorized_tags.is_empty()
        && handle.descriptor.authorized_tags.iter().any(|t| t == id_tag);

    if local_hit {
        handle
            .with_state("remote_start.local_auth", |s| {
                if let Ok(c) = s.connectors.get_mut(connector_id) {
                    c.local_authorize_id_tag = Some(id_tag.to_string());
                    c.id_tag_local_authorized = true;
                }
            })
            .await;
        return true;
    }

    if handle.descriptor.may_authorize_at_remote_start {
        handle
            .with_state("remote_start.authorize_prepare", |s| {
                if let Ok(c) = s.connectors.get_mut(connector_id) {
                    c.authorize_id_tag = Some(id_tag.to_string());
                }
            })
            .await;
        return matches!(
            handle.outbound().authorize(id_tag).await,
            Ok(conf) if conf.id_tag_info.status == AuthorizationStatus::Accepted
        );
    }

    tracing::warn!(
        connector_id,
        "cannot authorize remote start: no local list match and MayAuthorizeAtRemoteStart is off"
    );
    false
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

    fn descriptor(connector_count: u32) -> StationDescriptor {
        StationDescriptor {
            charging_station_id: "CS-1".into(),
            connector_count,
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

    async fn registered_handle(descriptor: StationDescriptor, adapter: Arc<RecordingAdapter>) -> Arc<StationHandle> {
        let handle = StationHandle::new(descriptor, adapter, Arc::new(NullPerformanceSink), Arc::new(StubDiagnostics::failing()));
        handle.with_state("setup", |s| s.registration = RegistrationStatus::Registered).await;
        handle
    }

    #[tokio::test]
    async fn accepted_path_marks_remote_started() {
        let adapter = Arc::new(RecordingAdapter::default());
        adapter.queue(serde_json::json!({"transactionId": 42, "idTagInfo": {"status": "Accepted"}}));

        let handle = registered_handle(descriptor(2), adapter.clone()).await;

        let response = router::route(
            &handle,
            "RemoteStartTransaction",
            serde_json::json!({"connectorId": 2, "idTag": "AAA"}),
        )
        .await
        .unwrap();
        assert_eq!(response["status"], "Accepted");

        let remote_started = handle
            .with_state("check", |s| s.connectors.get(2).unwrap().transaction_remote_started)
            .await;
        assert!(remote_started);

        let sent = adapter.sent.lock().unwrap();
        let preparing = sent
            .iter()
            .find(|(action, payload)| action == "StatusNotification" && payload["status"] == "Preparing");
        assert!(preparing.is_some());
        assert!(sent.iter().any(|(action, _)| action == "StartTransaction"));
    }

    #[tokio::test]
    async fn local_auth_miss_is_rejected_without_authorize() {
        let adapter = Arc::new(RecordingAdapter::default());

        let mut descriptor = descriptor(1);
        descriptor.authorize_remote_tx_requests = true;
        descriptor.local_auth_list_enabled = true;
        descriptor.may_authorize_at_remote_start = false;
        descriptor.authorized_tags = vec!["AAA".into()];

        let handle = registered_handle(descriptor, adapter.clone()).await;

        let response = router::route(
            &handle,
            "RemoteStartTransaction",
            serde_json::json!({"connectorId": 1, "idTag": "BBB"}),
        )
        .await
        .unwrap();
        assert_eq!(response["status"], "Rejected");

        let sent = adapter.sent.lock().unwrap();
        assert!(!sent.iter().any(|(action, _)| action == "Authorize"));
        let available_again =
            sent.iter().any(|(action, payload)| action == "StatusNotification" && payload["status"] == "Available");
        assert!(available_again);
    }
}
