//! C6's concrete implementation: an `OutboundAdapter` over a
//! `tokio-tungstenite` WebSocket. Correlates outgoing `Call` frames to their
//! `CallResult`/`CallError` with a `DashMap<String, oneshot::Sender<...>>`
//! keyed by message id — the same pattern the teacher's `CommandSender`
//! (`application/commands/mod.rs`) uses to match Central-System replies.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{oneshot, Mutex, OnceCell};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::application::errors::{OcppError, OcppResult};
use crate::application::outbound::{OutboundAdapter, SendOptions};
use crate::application::router;
use crate::application::station_handle::StationHandle;
use crate::infrastructure::errors::InfraError;
use crate::support::ids::next_message_id;
use crate::support::ocpp_frame::OcppFrame;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RESPONSE_TIMEOUT: Duration = Duration::from_secs(30);

pub struct WsTransport {
    write: Mutex<SplitSink<WsStream, Message>>,
    pending: dashmap::DashMap<String, oneshot::Sender<OcppResult<Value>>>,
    ready: AtomicBool,
    station: OnceCell<Weak<StationHandle>>,
}

impl WsTransport {
    /// Connects to `url` (the Central System's OCPP-J endpoint for one
    /// station) and spawns the background frame reader.
    pub async fn connect(url: &str) -> Result<Arc<Self>, InfraError> {
        let (stream, _response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| InfraError::Connect(e.to_string()))?;
        let (write, read) = stream.split();

        let transport = Arc::new(Self {
            write: Mutex::new(write),
            pending: dashmap::DashMap::new(),
            ready: AtomicBool::new(true),
            station: OnceCell::new(),
        });

        let reader = Arc::clone(&transport);
        tokio::spawn(async move { reader.read_loop(read).await });

        Ok(transport)
    }

    /// Wires this transport to the station whose incoming `Call` frames it
    /// should route. Called once, right after the `StationHandle` that owns
    /// this transport is constructed, to avoid an `Arc` reference cycle.
    pub fn bind_station(&self, handle: &Arc<StationHandle>) {
        let _ = self.station.set(Arc::downgrade(handle));
    }

    async fn read_loop(self: Arc<Self>, mut read: SplitStream<WsStream>) {
        while let Some(message) = read.next().await {
            let message = match message {
                Ok(m) => m,
                Err(e) => {
                    tracing::warn!(error = %e, "websocket read error");
                    self.ready.store(false, Ordering::SeqCst);
                    break;
                }
            };
            let Message::Text(text) = message else { continue };

            let frame = match OcppFrame::parse(&text) {
                Ok(f) => f,
                Err(e) => {
                    tracing::warn!(error = %e, "dropping malformed OCPP-J frame");
                    continue;
                }
            };

            match frame {
                OcppFrame::CallResult { unique_id, payload } => {
                    if let Some((_, tx)) = self.pending.remove(&unique_id) {
                        let _ = tx.send(Ok(payload));
                    }
                }
                OcppFrame::CallError {
                    unique_id,
                    error_code,
                    error_description,
                    ..
                } => {
                    if let Some((_, tx)) = self.pending.remove(&unique_id) {
                        let _ = tx.send(Err(error_from_code(&error_code, error_description)));
                    }
                }
                OcppFrame::Call {
                    unique_id,
                    action,
                    payload,
                } => {
                    self.handle_inbound_call(unique_id, action, payload).await;
                }
            }
        }
    }

    async fn handle_inbound_call(&self, unique_id: String, action: String, payload: Value) {
        let Some(station) = self.station.get().and_then(Weak::upgrade) else {
            tracing::warn!(action = %action, "no station bound yet, dropping inbound call");
            return;
        };

        let frame = match router::route(&station, &action, payload).await {
            Ok(response) => OcppFrame::CallResult {
                unique_id,
                payload: response,
            },
            Err(e) => OcppFrame::error_response(unique_id, e.code(), e.description()),
        };

        let mut write = self.write.lock().await;
        if let Err(e) = write.send(Message::Text(frame.serialize())).await {
            tracing::warn!(error = %e, "failed to send response frame");
        }
    }
}

fn error_from_code(code: &str, description: String) -> OcppError {
    match code {
        "SecurityError" => OcppError::SecurityError(description),
        "FormationViolation" => OcppError::FormationViolation(description),
        "PropertyConstraintViolation" => OcppError::PropertyConstraintViolation(description),
        "OccurrenceConstraintViolation" => OcppError::OccurrenceConstraintViolation(description),
        "TypeConstraintViolation" => OcppError::TypeConstraintViolation(description),
        "NotImplemented" => OcppError::NotImplemented(description),
        "GenericError" => OcppError::GenericError(description),
        _ => OcppError::InternalError(description),
    }
}

#[async_trait]
impl OutboundAdapter for WsTransport {
    async fn send_request(&self, action: &str, payload: Value, options: SendOptions) -> OcppResult<Value> {
        if !self.ready.load(Ordering::SeqCst) && options.skip_buffering_on_error {
            return Err(OcppError::InternalError("transport not connected".into()));
        }

        let unique_id = next_message_id();
        let (tx, rx) = oneshot::channel();
        self.pending.insert(unique_id.clone(), tx);

        let frame = OcppFrame::Call {
            unique_id: unique_id.clone(),
            action: action.to_string(),
            payload,
        };

        {
            let mut write = self.write.lock().await;
            if let Err(e) = write.send(Message::Text(frame.serialize())).await {
                self.pending.remove(&unique_id);
                return Err(OcppError::InternalError(format!("send failed: {e}")));
            }
        }

        match tokio::time::timeout(RESPONSE_TIMEOUT, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => {
                self.pending.remove(&unique_id);
                Err(OcppError::InternalError("response channel closed".into()))
            }
            Err(_) => {
                self.pending.remove(&unique_id);
                Err(OcppError::InternalError("timed out waiting for response".into()))
            }
        }
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}
