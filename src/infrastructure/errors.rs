//! Transport/IO-level failures, kept distinct from [`crate::domain::DomainError`]
//! and [`crate::application::OcppError`] the way the teacher layers
//! `InfraError` under `AppError` in `support/errors.rs`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("websocket connect failed: {0}")]
    Connect(String),
    #[error("websocket send failed: {0}")]
    Send(String),
    #[error("timed out waiting for response")]
    Timeout,
    #[error("response channel closed before a reply arrived")]
    ChannelClosed,
    #[error("configuration error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
