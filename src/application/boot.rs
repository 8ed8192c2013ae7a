//! The boot handshake: sends `BootNotification`, stores the reply as the
//! station's boot echo, and moves `registration` out of `Unknown` per the
//! reply's status (`spec.md` §3 "a registration state, a boot-notification
//! echo"; the router's gating in §4.3 only ever opens up once this has run).
//! Re-run verbatim by `Reset`'s re-boot step (`spec.md` §4.4).

use std::sync::Arc;

use crate::application::errors::OcppResult;
use crate::application::station_handle::StationHandle;
use crate::domain::ocpp::enums::{RegistrationStatus, RegistrationStatusWire};
use crate::domain::ocpp::messages::BootNotificationReq;

pub async fn perform_boot_handshake(handle: &Arc<StationHandle>) -> OcppResult<RegistrationStatus> {
    let req = BootNotificationReq {
        charge_point_vendor: handle.descriptor.charge_point_vendor.clone(),
        charge_point_model: handle.descriptor.charge_point_model.clone(),
        charge_point_serial_number: None,
        charge_box_serial_number: None,
        firmware_version: None,
        iccid: None,
        imsi: None,
        meter_type: None,
        meter_serial_number: None,
    };

    let conf = handle.outbound().boot_notification(req).await?;
    let registration = RegistrationStatus::from(conf.status);

    handle
        .with_state("boot.apply", |s| {
            s.registration = registration;
            if registration == RegistrationStatus::Registered && conf.interval > 0 {
                let _ = s.configuration.set("HeartbeatInterval", conf.interval.to_string());
            }
            s.boot_notification_echo = Some(conf.clone());
        })
        .await;

    if conf.status == RegistrationStatusWire::Accepted {
        handle.heartbeat_restart.notify_one();
    }

    Ok(registration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::diagnostics::test_support::StubDiagnostics;
    use crate::application::outbound::test_support::RecordingAdapter;
    use crate::application::perf::NullPerformanceSink;
    use crate::domain::StationDescriptor;

    fn descriptor() -> StationDescriptor {
        StationDescriptor {
            charging_station_id: "CS-1".into(),
            connector_count: 1,
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
            ocpp_strict_compliance: false,
            begin_end_meter_values: false,
            out_of_order_end_meter_values: false,
        }
    }

    #[tokio::test]
    async fn accepted_reply_registers_the_station_and_adopts_the_interval() {
        let adapter = Arc::new(RecordingAdapter::default());
        adapter.queue(serde_json::json!({
            "status": "Accepted",
            "currentTime": "2024-01-01T00:00:00Z",
            "interval": 45,
        }));
        let handle = StationHandle::new(
            descriptor(),
            adapter.clone(),
            Arc::new(NullPerformanceSink),
            Arc::new(StubDiagnostics::failing()),
        );

        let registration = perform_boot_handshake(&handle).await.unwrap();
        assert_eq!(registration, RegistrationStatus::Registered);

        let (interval, echoed) = handle
            .with_state("check", |s| {
                (
                    s.configuration.get("HeartbeatInterval").unwrap().value.clone(),
                    s.boot_notification_echo.is_some(),
                )
            })
            .await;
        assert_eq!(interval, "45");
        assert!(echoed);

        let sent = adapter.sent.lock().unwrap();
        assert!(sent.iter().any(|(action, _)| action == "BootNotification"));
    }

    #[tokio::test]
    async fn rejected_reply_leaves_the_station_unregistered() {
        let adapter = Arc::new(RecordingAdapter::default());
        adapter.queue(serde_json::json!({
            "status": "Rejected",
            "currentTime": "2024-01-01T00:00:00Z",
            "interval": 300,
        }));
        let handle = StationHandle::new(
            descriptor(),
            adapter.clone(),
            Arc::new(NullPerformanceSink),
            Arc::new(StubDiagnostics::failing()),
        );

        let registration = perform_boot_handshake(&handle).await.unwrap();
        assert_eq!(registration, RegistrationStatus::Unregistered);
    }
}
