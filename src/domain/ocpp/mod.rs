//! Concrete OCPP 1.6 Edition 2 payload shapes, version-agnostic transport
//! framing lives in `crate::support::ocpp_frame`.

pub mod enums;
pub mod messages;

pub use enums::*;
