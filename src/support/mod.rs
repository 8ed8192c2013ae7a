//! Cross-cutting utilities shared by every layer.

pub mod constants;
pub mod ids;
pub mod ocpp_frame;
pub mod shutdown;

pub use ocpp_frame::{OcppFrame, OcppFrameError};
pub use shutdown::ShutdownSignal;
