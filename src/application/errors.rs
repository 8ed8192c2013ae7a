//! The OCPP-J CALLERROR taxonomy surfaced at the protocol boundary
//! (`spec.md` §7), modeled on the teacher's layered `thiserror` error enums
//! (`support/errors.rs`).

use thiserror::Error;

use crate::domain::DomainError;

#[derive(Debug, Error, Clone)]
pub enum OcppError {
    #[error("NotImplemented: {0}")]
    NotImplemented(String),

    #[error("SecurityError: {0}")]
    SecurityError(String),

    #[error("GenericError: {0}")]
    GenericError(String),

    #[error("FormationViolation: {0}")]
    FormationViolation(String),

    #[error("PropertyConstraintViolation: {0}")]
    PropertyConstraintViolation(String),

    #[error("OccurrenceConstraintViolation: {0}")]
    OccurrenceConstraintViolation(String),

    #[error("TypeConstraintViolation: {0}")]
    TypeConstraintViolation(String),

    #[error("InternalError: {0}")]
    InternalError(String),
}

impl OcppError {
    /// The OCPP-J `errorCode` string for a CALLERROR frame.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotImplemented(_) => "NotImplemented",
            Self::SecurityError(_) => "SecurityError",
            Self::GenericError(_) => "GenericError",
            Self::FormationViolation(_) => "FormationViolation",
            Self::PropertyConstraintViolation(_) => "PropertyConstraintViolation",
            Self::OccurrenceConstraintViolation(_) => "OccurrenceConstraintViolation",
            Self::TypeConstraintViolation(_) => "TypeConstraintViolation",
            Self::InternalError(_) => "InternalError",
        }
    }

    pub fn description(&self) -> String {
        self.to_string()
    }
}

impl From<DomainError> for OcppError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::ConnectorNotFound(_) => {
                OcppError::OccurrenceConstraintViolation(e.to_string())
            }
            DomainError::TransactionNotFound(_) => {
                OcppError::OccurrenceConstraintViolation(e.to_string())
            }
            DomainError::TransactionAlreadyActive(_) => {
                OcppError::OccurrenceConstraintViolation(e.to_string())
            }
            DomainError::ConnectorInoperative(_) => {
                OcppError::OccurrenceConstraintViolation(e.to_string())
            }
            DomainError::ConfigurationReadOnly(_) => {
                OcppError::PropertyConstraintViolation(e.to_string())
            }
            DomainError::ConfigurationUnknown(_) => {
                OcppError::PropertyConstraintViolation(e.to_string())
            }
            DomainError::InvalidProfilePlacement(_, _) => {
                OcppError::PropertyConstraintViolation(e.to_string())
            }
        }
    }
}

impl From<serde_json::Error> for OcppError {
    fn from(e: serde_json::Error) -> Self {
        OcppError::FormationViolation(e.to_string())
    }
}

pub type OcppResult<T> = Result<T, OcppError>;
