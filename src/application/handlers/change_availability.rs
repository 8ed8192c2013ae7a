use std::sync::Arc;

use serde_json::Value;

use super::{now, parse, respond};
use crate::application::errors::{OcppError, OcppResult};
use crate::application::outbound::SendOptions;
use crate::application::station_handle::StationHandle;
use crate::domain::error::DomainError;
use crate::domain::ocpp::enums::{Availability, AvailabilityStatus, ChargePointErrorCode, ChargePointStatus};
use crate::domain::ocpp::messages::{ChangeAvailabilityConf, ChangeAvailabilityReq, StatusNotificationReq};

pub async fn handle(handle: &Arc<StationHandle>, payload: Value) -> OcppResult<Value> {
    let req: ChangeAvailabilityReq = parse(payload)?;
    let availability: Availability = req.kind.into();
    let target_status = if availability == Availability::Operative {
        ChargePointStatus::Available
    } else {
        ChargePointStatus::Unavailable
    };

    if req.connector_id == 0 {
        let (any_running, ids) = handle
            .with_state("change_availability.station", |s| {
                let mut any_running = false;
                let mut ids = Vec::new();
                for c in s.connectors.iter_mut() {
                    c.availability = availability;
                    if c.transaction_started {
                        any_running = true;
                    }
                    ids.push(c.id);
                }
                if availability == Availability::Inoperative {
                    s.connectors.apply_station_level_inoperative();
                }
                (any_running, ids)
            })
            .await;

        if any_running {
            return respond(ChangeAvailabilityConf {
                status: AvailabilityStatus::Scheduled,
            });
        }

        for id in ids.into_iter().filter(|&id| id > 0) {
            handle
                .with_state("change_availability.apply", |s| {
                    if let Ok(c) = s.connectors.get_mut(id) {
                        c.status = target_status;
                    }
                })
                .await;
            let _ = handle
                .outbound()
                .status_notification(
                    StatusNotificationReq {
                        connector_id: id,
                        error_code: ChargePointErrorCode::NoError,
                        status: target_status,
                        timestamp: now(),
                        info: None,
                    },
                    SendOptions::default(),
                )
                .await;
        }

        return respond(ChangeAvailabilityConf {
            status: AvailabilityStatus::Accepted,
        });
    }

    let station_operative = handle
        .with_state("change_availability.read_station", |s| {
            s.connectors.get(0).map(|c| c.availability == Availability::Operative).unwrap_or(false)
        })
        .await;

    let eligible = station_operative || availability == Availability::Inoperative;
    if !eligible {
        return respond(ChangeAvailabilityConf {
            status: AvailabilityStatus::Rejected,
        });
    }

    let applied = handle
        .with_state("change_availability.connector", |s| match s.connectors.get_mut(req.connector_id) {
            Err(_) => None,
            Ok(c) => {
                c.availability = availability;
                Some(c.transaction_started)
            }
        })
        .await;

    let running = applied.ok_or(OcppError::from(DomainError::ConnectorNotFound(req.connector_id)))?;

    if running {
        return respond(ChangeAvailabilityConf {
            status: AvailabilityStatus::Scheduled,
        });
    }

    handle
        .with_state("change_availability.apply_one", |s| {
            if let Ok(c) = s.connectors.get_mut(req.connector_id) {
                c.status = target_status;
            }
        })
        .await;
    let _ = handle
        .outbound()
        .status_notification(
            StatusNotificationReq {
                connector_id: req.connector_id,
                error_code: ChargePointErrorCode::NoError,
                status: target_status,
                timestamp: now(),
                info: None,
            },
            SendOptions::default(),
        )
        .await;

    respond(ChangeAvailabilityConf {
        status: AvailabilityStatus::Accepted,
    })
}
