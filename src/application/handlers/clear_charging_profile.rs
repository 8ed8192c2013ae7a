use std::sync::Arc;

use serde_json::Value;

use super::{parse, respond};
use crate::application::errors::OcppResult;
use crate::application::station_handle::StationHandle;
use crate::domain::ocpp::enums::ClearChargingProfileStatus;
use crate::domain::ocpp::messages::{ClearChargingProfileConf, ClearChargingProfileReq};

/// Open question 1 (`spec.md` §9): when `connectorId > 0` is given, the
/// source clears *every* profile on that connector regardless of id/purpose/
/// stackLevel, rather than matching the individual filters. Flip this flag to
/// `false` to switch that branch to spec-conformant matching instead.
const REPRODUCE_SOURCE_CLEAR_ALL_QUIRK: bool = true;

pub async fn handle(handle: &Arc<StationHandle>, payload: Value) -> OcppResult<Value> {
    let req: ClearChargingProfileReq = parse(payload)?;

    if !handle.descriptor.smart_charging_enabled {
        return respond(ClearChargingProfileConf {
            status: ClearChargingProfileStatus::Unknown,
        });
    }

    let status = handle
        .with_state("clear_charging_profile", |s| {
            if let Some(connector_id) = req.connector_id {
                if connector_id > 0 {
                    let cleared = match s.connectors.get_mut(connector_id) {
                        Ok(connector) if REPRODUCE_SOURCE_CLEAR_ALL_QUIRK => {
                            if connector.charging_profiles.is_empty() {
                                false
                            } else {
                                connector.charging_profiles.clear();
                                true
                            }
                        }
                        Ok(connector) => connector.clear_profiles_matching(
                            req.id,
                            req.charging_profile_purpose,
                            req.stack_level,
                        ),
                        Err(_) => false,
                    };
                    return if cleared {
                        ClearChargingProfileStatus::Accepted
                    } else {
                        ClearChargingProfileStatus::Unknown
                    };
                }
            }

            let mut cleared = false;
            for connector in s.connectors.iter_mut() {
                if connector.clear_profiles_matching(req.id, req.charging_profile_purpose, req.stack_level) {
                    cleared = true;
                }
            }
            if cleared {
                ClearChargingProfileStatus::Accepted
            } else {
                ClearChargingProfileStatus::Unknown
            }
        })
        .await;

    respond(ClearChargingProfileConf { status })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::diagnostics::test_support::StubDiagnostics;
    use crate::application::outbound::test_support::RecordingAdapter;
    use crate::application::perf::NullPerformanceSink;
    use crate::application::router;
    use crate::application::station_handle::StationHandle;
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

    #[tokio::test]
    async fn clear_by_id_clears_both_connectors() {
        let adapter = Arc::new(RecordingAdapter::default());
        let handle = StationHandle::new(descriptor(2), adapter, Arc::new(NullPerformanceSink), Arc::new(StubDiagnostics::failing()));
        handle.with_state("setup", |s| s.registration = RegistrationStatus::Registered).await;

        for connector_id in [1u32, 2u32] {
            let response = router::route(
                &handle,
                "SetChargingProfile",
                serde_json::json!({
                    "connectorId": connector_id,
                    "csChargingProfiles": {
                        "chargingProfileId": 7,
                        "transactionId": null,
                        "stackLevel": 0,
                        "chargingProfilePurpose": "TxDefaultProfile",
                        "chargingProfileKind": "Absolute",
                    }
                }),
            )
            .await
            .unwrap();
            assert_eq!(response["status"], "Accepted");
        }

        let response = router::route(&handle, "ClearChargingProfile", serde_json::json!({"id": 7}))
            .await
            .unwrap();
        assert_eq!(response["status"], "Accepted");
    }
}
