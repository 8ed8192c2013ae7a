//! Domain-level errors: invariant violations inside C1/C2, independent of the
//! OCPP wire taxonomy (`application::errors::OcppError`), modeled on the
//! teacher's `support/errors.rs` `DomainError`.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("connector {0} not found")]
    ConnectorNotFound(u32),

    #[error("transaction {0} not found")]
    TransactionNotFound(i32),

    #[error("connector {0} already has a running transaction")]
    TransactionAlreadyActive(u32),

    #[error("connector {0} is inoperative")]
    ConnectorInoperative(u32),

    #[error("configuration key {0} is read-only")]
    ConfigurationReadOnly(String),

    #[error("configuration key {0} is unknown")]
    ConfigurationUnknown(String),

    #[error("charging profile purpose {0:?} is not valid for connector {1}")]
    InvalidProfilePlacement(String, u32),
}

pub type DomainResult<T> = Result<T, DomainError>;
