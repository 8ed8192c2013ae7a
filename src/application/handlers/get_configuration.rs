use std::sync::Arc;

use serde_json::Value;

use super::{parse, respond};
use crate::application::errors::OcppResult;
use crate::application::station_handle::StationHandle;
use crate::domain::ocpp::messages::{GetConfigurationConf, GetConfigurationReq, KeyValue};

pub async fn handle(handle: &Arc<StationHandle>, payload: Value) -> OcppResult<Value> {
    let req: GetConfigurationReq = parse(payload)?;

    let (found, unknown) = handle
        .with_state("get_configuration", |s| s.configuration.list_visible(req.key.as_deref()))
        .await;

    let configuration_key = if found.is_empty() {
        None
    } else {
        Some(
            found
                .into_iter()
                .map(|e| KeyValue {
                    key: e.key,
                    readonly: e.readonly,
                    value: Some(e.value),
                })
                .collect(),
        )
    };
    let unknown_key = if unknown.is_empty() { None } else { Some(unknown) };

    respond(GetConfigurationConf {
        configuration_key,
        unknown_key,
    })
}
