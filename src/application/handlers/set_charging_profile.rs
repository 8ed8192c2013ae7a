use std::sync::Arc;

use serde_json::Value;

use super::{parse, respond};
use crate::application::errors::OcppResult;
use crate::application::station_handle::StationHandle;
use crate::domain::ocpp::enums::{ChargingProfilePurpose, ChargingProfileStatus};
use crate::domain::ocpp::messages::{SetChargingProfileConf, SetChargingProfileReq};

pub async fn handle(handle: &Arc<StationHandle>, payload: Value) -> OcppResult<Value> {
    let req: SetChargingProfileReq = parse(payload)?;

    if !handle.descriptor.smart_charging_enabled {
        return respond(SetChargingProfileConf {
            status: ChargingProfileStatus::NotSupported,
        });
    }

    let status = handle
        .with_state("set_charging_profile", |s| match s.connectors.get_mut(req.connector_id) {
            Err(_) => ChargingProfileStatus::Rejected,
            Ok(connector) => {
                let purpose = req.cs_charging_profiles.charging_profile_purpose;
                let rejected = (purpose == ChargingProfilePurpose::ChargePointMaxProfile && req.connector_id != 0)
                    || (purpose == ChargingProfilePurpose::TxProfile
                        && (req.connector_id == 0 || !connector.transaction_started));

                if rejected {
                    ChargingProfileStatus::Rejected
                } else {
                    connector.set_profile(req.cs_charging_profiles.clone());
                    ChargingProfileStatus::Accepted
                }
            }
        })
        .await;

    respond(SetChargingProfileConf { status })
}
