//! C4: one handler per Central-System-initiated command. Handlers mutate
//! the station's connector/configuration state and emit outbound requests
//! through C6; they never touch a socket directly.

mod change_availability;
mod change_configuration;
mod clear_cache;
mod clear_charging_profile;
mod get_configuration;
mod get_diagnostics;
mod remote_start_transaction;
mod remote_stop_transaction;
mod reset;
mod set_charging_profile;
mod trigger_message;
mod unlock_connector;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::application::errors::{OcppError, OcppResult};
use crate::application::station_handle::StationHandle;
use crate::domain::ocpp::messages::{MeterValue, MeterValuesReq, SampledValue};

fn parse<T: DeserializeOwned>(payload: Value) -> OcppResult<T> {
    serde_json::from_value(payload)
        .map_err(|e| OcppError::TypeConstraintViolation(format!("malformed request: {e}")))
}

fn respond<T: Serialize>(value: T) -> OcppResult<Value> {
    serde_json::to_value(value).map_err(OcppError::from)
}

/// A `MeterValues` message carrying a single `Transaction.End` energy sample,
/// the one this crate emits before `StopTransaction` when
/// `beginEndMeterValues` and strict compliance are both on (`spec.md` §4.4).
fn transaction_end_meter_values(connector_id: u32, transaction_id: i32, register: f64) -> MeterValuesReq {
    MeterValuesReq {
        connector_id,
        transaction_id: Some(transaction_id),
        meter_value: vec![MeterValue {
            timestamp: Utc::now(),
            sampled_value: vec![SampledValue {
                value: register.to_string(),
                context: Some("Transaction.End"),
                measurand: Some("Energy.Active.Import.Register"),
            }],
        }],
    }
}

fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Dispatches one already-gated command to its typed handler. Returns
/// `NotImplemented` for anything not in the command surface `spec.md` §6
/// names.
pub async fn dispatch(
    handle: &Arc<StationHandle>,
    command_name: &str,
    payload: Value,
) -> OcppResult<Value> {
    match command_name {
        "Reset" => reset::handle(handle, payload).await,
        "ClearCache" => clear_cache::handle(handle, payload).await,
        "UnlockConnector" => unlock_connector::handle(handle, payload).await,
        "GetConfiguration" => get_configuration::handle(handle, payload).await,
        "ChangeConfiguration" => change_configuration::handle(handle, payload).await,
        "SetChargingProfile" => set_charging_profile::handle(handle, payload).await,
        "ClearChargingProfile" => clear_charging_profile::handle(handle, payload).await,
        "ChangeAvailability" => change_availability::handle(handle, payload).await,
        "RemoteStartTransaction" => remote_start_transaction::handle(handle, payload).await,
        "RemoteStopTransaction" => remote_stop_transaction::handle(handle, payload).await,
        "GetDiagnostics" => get_diagnostics::handle(handle, payload).await,
        "TriggerMessage" => trigger_message::handle(handle, payload).await,
        other => Err(OcppError::NotImplemented(format!("unhandled action: {other}"))),
    }
}
