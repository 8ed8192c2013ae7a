use std::sync::Arc;

use serde_json::Value;

use super::{now, parse, respond, transaction_end_meter_values};
use crate::application::errors::{OcppError, OcppResult};
use crate::application::outbound::SendOptions;
use crate::application::station_handle::StationHandle;
use crate::domain::error::DomainError;
use crate::domain::ocpp::enums::{ChargePointErrorCode, ChargePointStatus, StopReason, UnlockStatus};
use crate::domain::ocpp::messages::{StatusNotificationReq, StopTransactionReq, UnlockConnectorConf, UnlockConnectorReq};

pub async fn handle(handle: &Arc<StationHandle>, payload: Value) -> OcppResult<Value> {
    let req: UnlockConnectorReq = parse(payload)?;

    if req.connector_id == 0 {
        return respond(UnlockConnectorConf {
            status: UnlockStatus::NotSupported,
        });
    }

    let snapshot = handle
        .with_state("unlock_connector.read", |s| {
            s.connectors.get(req.connector_id).ok().map(|c| {
                (
                    c.transaction_started,
                    c.transaction_id,
                    c.transaction_id_tag.clone(),
                    c.transaction_energy_active_import_register,
                )
            })
        })
        .await
        .ok_or(OcppError::from(DomainError::ConnectorNotFound(req.connector_id)))?;

    let (transaction_started, transaction_id, id_tag, register) = snapshot;

    if !transaction_started {
        handle
            .with_state("unlock_connector.available", |s| {
                if let Ok(c) = s.connectors.get_mut(req.connector_id) {
                    c.status = ChargePointStatus::Available;
                }
            })
            .await;
        let _ = handle
            .outbound()
            .status_notification(
                StatusNotificationReq {
                    connector_id: req.connector_id,
                    error_code: ChargePointErrorCode::NoError,
                    status: ChargePointStatus::Available,
                    timestamp: now(),
                    info: None,
                },
                SendOptions::default(),
            )
            .await;
        return respond(UnlockConnectorConf {
            status: UnlockStatus::Unlocked,
        });
    }

    let transaction_id = transaction_id.expect("transaction_started implies transaction_id");
    let descriptor = &handle.descriptor;
    if descriptor.begin_end_meter_values && descriptor.ocpp_strict_compliance && !descriptor.out_of_order_end_meter_values {
        let meter_req = transaction_end_meter_values(req.connector_id, transaction_id, register);
        let _ = handle.outbound().meter_values(meter_req).await;
    }

    let stop_result = handle
        .outbound()
        .stop_transaction(StopTransactionReq {
            transaction_id,
            meter_stop: register as i64,
            timestamp: now(),
            id_tag,
            reason: Some(StopReason::UnlockCommand),
        })
        .await;

    let status = match stop_result {
        Ok(_) => {
            handle
                .with_state("unlock_connector.clear", |s| {
                    if let Ok(c) = s.connectors.get_mut(req.connector_id) {
                        c.clear_transaction();
                    }
                })
                .await;
            UnlockStatus::Unlocked
        }
        Err(_) => UnlockStatus::UnlockFailed,
    };

    respond(UnlockConnectorConf { status })
}
