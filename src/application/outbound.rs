//! C6: the outbound request adapter. Decouples the core from the transport
//! that actually carries OCPP-J frames to the Central System, the same seam
//! the teacher draws around `CommandSender` (`application/commands/mod.rs`) —
//! there it is the Central System sending commands down to charge points,
//! here it is the simulated charge point sending requests up.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::application::errors::{OcppError, OcppResult};
use crate::domain::ocpp::messages::*;

/// Options a caller can attach to an outbound request.
#[derive(Debug, Clone, Copy, Default)]
pub struct SendOptions {
    /// If the transport is down, drop the request instead of queuing it for
    /// retry once reconnected. Used for requests a `TriggerMessage` asked
    /// for, where a stale retry would be misleading.
    pub skip_buffering_on_error: bool,
    /// This request is being (re)sent because of an explicit `TriggerMessage`
    /// command rather than organic protocol flow.
    pub trigger_message: bool,
}

/// The seam between the protocol core and whatever actually moves bytes.
/// A `Call` action/payload goes out; the matching `CallResult` payload (or
/// an `OcppError` built from the peer's `CallError`) comes back.
#[async_trait]
pub trait OutboundAdapter: Send + Sync {
    async fn send_request(
        &self,
        action: &str,
        payload: Value,
        options: SendOptions,
    ) -> OcppResult<Value>;

    /// Whether the adapter currently has a usable connection. The ATG
    /// sleeps and retries while this is `false` (`spec.md` §4.5 step 5)
    /// instead of piling up failed sends.
    fn is_ready(&self) -> bool {
        true
    }
}

fn encode<T: Serialize>(payload: &T) -> OcppResult<Value> {
    serde_json::to_value(payload).map_err(OcppError::from)
}

fn decode<T: serde::de::DeserializeOwned>(value: Value) -> OcppResult<T> {
    serde_json::from_value(value)
        .map_err(|e| OcppError::FormationViolation(format!("malformed response: {e}")))
}

/// Typed helpers layered over [`OutboundAdapter::send_request`], one per
/// outbound action the core actually sends.
pub struct Outbound<'a> {
    adapter: &'a dyn OutboundAdapter,
}

impl<'a> Outbound<'a> {
    pub fn new(adapter: &'a dyn OutboundAdapter) -> Self {
        Self { adapter }
    }

    pub async fn boot_notification(&self, req: BootNotificationReq) -> OcppResult<BootNotificationConf> {
        let payload = self
            .adapter
            .send_request("BootNotification", encode(&req)?, SendOptions::default())
            .await?;
        decode(payload)
    }

    pub async fn heartbeat(&self) -> OcppResult<HeartbeatConf> {
        let payload = self
            .adapter
            .send_request("Heartbeat", encode(&HeartbeatReq::default())?, SendOptions::default())
            .await?;
        decode(payload)
    }

    pub async fn authorize(&self, id_tag: impl Into<String>) -> OcppResult<AuthorizeConf> {
        let req = AuthorizeReq { id_tag: id_tag.into() };
        let payload = self
            .adapter
            .send_request("Authorize", encode(&req)?, SendOptions::default())
            .await?;
        decode(payload)
    }

    pub async fn start_transaction(&self, req: StartTransactionReq) -> OcppResult<StartTransactionConf> {
        let payload = self
            .adapter
            .send_request("StartTransaction", encode(&req)?, SendOptions::default())
            .await?;
        decode(payload)
    }

    pub async fn stop_transaction(&self, req: StopTransactionReq) -> OcppResult<StopTransactionConf> {
        let payload = self
            .adapter
            .send_request("StopTransaction", encode(&req)?, SendOptions::default())
            .await?;
        decode(payload)
    }

    pub async fn status_notification(
        &self,
        req: StatusNotificationReq,
        options: SendOptions,
    ) -> OcppResult<StatusNotificationConf> {
        let payload = self
            .adapter
            .send_request("StatusNotification", encode(&req)?, options)
            .await?;
        decode(payload)
    }

    pub async fn meter_values(&self, req: MeterValuesReq) -> OcppResult<MeterValuesConf> {
        let payload = self
            .adapter
            .send_request("MeterValues", encode(&req)?, SendOptions::default())
            .await?;
        decode(payload)
    }

    pub async fn diagnostics_status_notification(
        &self,
        req: DiagnosticsStatusNotificationReq,
    ) -> OcppResult<DiagnosticsStatusNotificationConf> {
        let payload = self
            .adapter
            .send_request(
                "DiagnosticsStatusNotification",
                encode(&req)?,
                SendOptions::default(),
            )
            .await?;
        decode(payload)
    }
}

#[cfg(test)]
pub mod test_support {
    use super::*;
    use std::sync::Mutex;

    /// In-memory adapter test double: records every request and replays
    /// pre-queued responses in order.
    #[derive(Default)]
    pub struct RecordingAdapter {
        pub sent: Mutex<Vec<(String, Value)>>,
        pub responses: Mutex<Vec<OcppResult<Value>>>,
    }

    impl RecordingAdapter {
        pub fn queue(&self, response: Value) {
            self.responses.lock().unwrap().push(Ok(response));
        }

        pub fn queue_err(&self, err: OcppError) {
            self.responses.lock().unwrap().push(Err(err));
        }
    }

    #[async_trait]
    impl OutboundAdapter for RecordingAdapter {
        async fn send_request(
            &self,
            action: &str,
            payload: Value,
            _options: SendOptions,
        ) -> OcppResult<Value> {
            self.sent.lock().unwrap().push((action.to_string(), payload));
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                Ok(serde_json::json!({}))
            } else {
                responses.remove(0)
            }
        }
    }
}
