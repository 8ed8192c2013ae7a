use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use super::{parse, respond};
use crate::application::boot::perform_boot_handshake;
use crate::application::errors::OcppResult;
use crate::application::station_handle::StationHandle;
use crate::domain::ocpp::enums::{Availability, ChargePointStatus, ResetStatus, ResetType};
use crate::domain::ocpp::messages::{ResetConf, ResetReq};

pub async fn handle(handle: &Arc<StationHandle>, payload: Value) -> OcppResult<Value> {
    let req: ResetReq = parse(payload)?;
    let reset_time = Duration::from_secs(handle.descriptor.reset_time_secs);
    let station = Arc::clone(handle);
    tokio::spawn(async move {
        tokio::time::sleep(reset_time).await;
        teardown_and_reboot(&station, req.kind).await;
        tracing::info!(station = station.station_id(), kind = ?req.kind, "simulated reset complete");
    });
    respond(ResetConf {
        status: ResetStatus::Accepted,
    })
}

/// Station teardown + re-boot (`spec.md` §4.4 "Reset"): every connector loses
/// its transaction and profile stack and settles back to its availability's
/// resting status, the station forgets its registration, then runs the same
/// boot handshake a fresh process would on startup.
async fn teardown_and_reboot(handle: &Arc<StationHandle>, kind: ResetType) {
    handle
        .with_state("reset.teardown", |s| {
            for connector in s.connectors.iter_mut() {
                connector.clear_transaction();
                connector.charging_profiles.clear();
                connector.status = if connector.availability == Availability::Operative {
                    ChargePointStatus::Available
                } else {
                    ChargePointStatus::Unavailable
                };
            }
            s.registration = crate::domain::ocpp::enums::RegistrationStatus::Unknown;
        })
        .await;

    if let Err(e) = perform_boot_handshake(handle).await {
        tracing::warn!(station = handle.station_id(), kind = ?kind, error = %e, "boot handshake after reset failed");
    }
}
