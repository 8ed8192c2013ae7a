//! C9: a thin read-only front end onto the `Fleet` registry. One `axum`
//! `/ws` route per the teacher's admin-console pattern, speaking the
//! `[command, payload]` framing described in `spec.md` §6.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use serde_json::Value;

use crate::application::fleet::Fleet;
use crate::infrastructure::errors::InfraError;

pub async fn serve(fleet: Arc<Fleet>, addr: SocketAddr) -> Result<(), InfraError> {
    let app = Router::new()
        .route("/ws", get(ws_handler))
        .with_state(fleet);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(InfraError::Io)?;
    tracing::info!(%addr, "operator UI listening");
    axum::serve(listener, app)
        .await
        .map_err(|e| InfraError::Connect(e.to_string()))
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(fleet): State<Arc<Fleet>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, fleet))
}

async fn handle_socket(mut socket: WebSocket, fleet: Arc<Fleet>) {
    while let Some(Ok(message)) = socket.recv().await {
        let Message::Text(text) = message else { continue };
        let response = dispatch(&fleet, &text);
        if socket.send(Message::Text(response.into())).await.is_err() {
            break;
        }
    }
}

fn dispatch(fleet: &Fleet, text: &str) -> String {
    let parsed: Result<(String, Value), _> = serde_json::from_str::<Vec<Value>>(text).map(|arr| {
        let command = arr.first().and_then(|v| v.as_str()).unwrap_or("").to_string();
        let payload = arr.get(1).cloned().unwrap_or(Value::Null);
        (command, payload)
    });

    let Ok((command, _payload)) = parsed else {
        return serde_json::json!({"error": "malformed command frame"}).to_string();
    };

    match command.as_str() {
        "listChargingStations" => serde_json::json!(fleet.station_ids()).to_string(),
        other => serde_json::json!({"error": format!("unknown command: {other}")}).to_string(),
    }
}
