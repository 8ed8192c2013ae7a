use std::sync::Arc;

use serde_json::Value;

use super::{parse, respond};
use crate::application::errors::OcppResult;
use crate::application::station_handle::StationHandle;
use crate::domain::ocpp::enums::DiagnosticsStatus;
use crate::domain::ocpp::messages::{DiagnosticsStatusNotificationReq, GetDiagnosticsConf, GetDiagnosticsReq};

pub async fn handle(handle: &Arc<StationHandle>, payload: Value) -> OcppResult<Value> {
    let req: GetDiagnosticsReq = parse(payload)?;

    if !handle.descriptor.firmware_management_enabled {
        return respond(GetDiagnosticsConf::default());
    }

    if !req.location.starts_with("ftp://") {
        let _ = handle
            .outbound()
            .diagnostics_status_notification(DiagnosticsStatusNotificationReq {
                status: DiagnosticsStatus::UploadFailed,
            })
            .await;
        return respond(GetDiagnosticsConf::default());
    }

    let (progress_tx, mut progress_rx) = tokio::sync::mpsc::unbounded_channel();

    let forwarder = {
        let station = Arc::clone(handle);
        tokio::spawn(async move {
            while progress_rx.recv().await.is_some() {
                let _ = station
                    .outbound()
                    .diagnostics_status_notification(DiagnosticsStatusNotificationReq {
                        status: DiagnosticsStatus::Uploading,
                    })
                    .await;
            }
        })
    };

    let outcome = handle.diagnostics.collect_and_upload(handle.station_id(), &req.location, progress_tx).await;
    let _ = forwarder.await;

    match outcome {
        Ok(file_name) => {
            let _ = handle
                .outbound()
                .diagnostics_status_notification(DiagnosticsStatusNotificationReq {
                    status: DiagnosticsStatus::Uploaded,
                })
                .await;
            respond(GetDiagnosticsConf { file_name: Some(file_name) })
        }
        Err(e) => {
            tracing::warn!(error = %e, "diagnostics upload failed");
            let _ = handle
                .outbound()
                .diagnostics_status_notification(DiagnosticsStatusNotificationReq {
                    status: DiagnosticsStatus::UploadFailed,
                })
                .await;
            respond(GetDiagnosticsConf::default())
        }
    }
}
