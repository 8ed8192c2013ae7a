//! The ambient collaborators C6's application core is built against:
//! the WebSocket transport, the diagnostics archiver/uploader, the
//! performance sink, descriptor loading, and the operator UI.

pub mod descriptor_loader;
pub mod errors;
pub mod filesystem_diagnostics;
pub mod operator_ui;
pub mod tracing_perf;
pub mod ws_transport;

pub use descriptor_loader::{DescriptorSource, TomlDescriptorLoader};
pub use errors::InfraError;
pub use filesystem_diagnostics::FileSystemDiagnostics;
pub use tracing_perf::TracingPerformanceSink;
pub use ws_transport::WsTransport;
