use std::sync::Arc;

use serde_json::Value;

use super::respond;
use crate::application::errors::OcppResult;
use crate::application::station_handle::StationHandle;
use crate::domain::ocpp::enums::GenericStatus;
use crate::domain::ocpp::messages::ClearCacheConf;

/// Authorization cache is not modeled, so this always accepts.
pub async fn handle(_handle: &Arc<StationHandle>, _payload: Value) -> OcppResult<Value> {
    respond(ClearCacheConf {
        status: GenericStatus::Accepted,
    })
}
