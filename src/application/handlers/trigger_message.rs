use std::sync::Arc;

use serde_json::Value;

use super::{now, parse, respond};
use crate::application::errors::OcppResult;
use crate::application::outbound::SendOptions;
use crate::application::station_handle::StationHandle;
use crate::domain::ocpp::enums::{ChargePointErrorCode, RequestedMessage, TriggerMessageStatus};
use crate::domain::ocpp::messages::{BootNotificationReq, StatusNotificationReq, TriggerMessageConf, TriggerMessageReq};
use crate::support::constants::TRIGGER_MESSAGE_DELAY;

pub async fn handle(handle: &Arc<StationHandle>, payload: Value) -> OcppResult<Value> {
    let req: TriggerMessageReq = parse(payload)?;

    if !handle.descriptor.remote_trigger_enabled {
        return respond(TriggerMessageConf {
            status: TriggerMessageStatus::NotImplemented,
        });
    }
    if req.connector_id.map(|id| id < 0).unwrap_or(false) {
        return respond(TriggerMessageConf {
            status: TriggerMessageStatus::Rejected,
        });
    }

    match req.requested_message {
        RequestedMessage::BootNotification => {
            let station = Arc::clone(handle);
            tokio::spawn(async move {
                tokio::time::sleep(TRIGGER_MESSAGE_DELAY).await;
                let _ = station
                    .outbound()
                    .boot_notification(BootNotificationReq {
                        charge_point_vendor: station.descriptor.charge_point_vendor.clone(),
                        charge_point_model: station.descriptor.charge_point_model.clone(),
                        charge_point_serial_number: None,
                        charge_box_serial_number: None,
                        firmware_version: None,
                        iccid: None,
                        imsi: None,
                        meter_type: None,
                        meter_serial_number: None,
                    })
                    .await;
            });
            respond(TriggerMessageConf {
                status: TriggerMessageStatus::Accepted,
            })
        }
        RequestedMessage::Heartbeat => {
            let station = Arc::clone(handle);
            tokio::spawn(async move {
                tokio::time::sleep(TRIGGER_MESSAGE_DELAY).await;
                let _ = station.outbound().heartbeat().await;
            });
            respond(TriggerMessageConf {
                status: TriggerMessageStatus::Accepted,
            })
        }
        RequestedMessage::StatusNotification => {
            let ids: Vec<u32> = if let Some(id) = req.connector_id {
                vec![id as u32]
            } else {
                handle.with_state("trigger_message.ids", |s| s.connectors.iter().map(|c| c.id).collect()).await
            };

            for id in ids {
                let station = Arc::clone(handle);
                tokio::spawn(async move {
                    tokio::time::sleep(TRIGGER_MESSAGE_DELAY).await;
                    let status = station.with_state("trigger_message.read_status", |s| s.connectors.get(id).ok().map(|c| c.status)).await;
                    if let Some(status) = status {
                        let options = SendOptions {
                            trigger_message: true,
                            ..SendOptions::default()
                        };
                        let _ = station
                            .outbound()
                            .status_notification(
                                StatusNotificationReq {
                                    connector_id: id,
                                    error_code: ChargePointErrorCode::NoError,
                                    status,
                                    timestamp: now(),
                                    info: None,
                                },
                                options,
                            )
                            .await;
                    }
                });
            }

            respond(TriggerMessageConf {
                status: TriggerMessageStatus::Accepted,
            })
        }
        _ => respond(TriggerMessageConf {
            status: TriggerMessageStatus::NotImplemented,
        }),
    }
}
