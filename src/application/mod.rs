//! The protocol core: C3 (request router), C4 (command handlers), C5 (the
//! Automatic Transaction Generator), and C6 (the outbound adapter seam),
//! plus the station registry and ambient collaborator traits (diagnostics,
//! performance) they're built against.

pub mod atg;
pub mod boot;
pub mod diagnostics;
pub mod errors;
pub mod fleet;
pub mod handlers;
pub mod outbound;
pub mod perf;
pub mod router;
pub mod station_handle;

pub use atg::Atg;
pub use boot::perform_boot_handshake;
pub use errors::{OcppError, OcppResult};
pub use fleet::Fleet;
pub use outbound::{OutboundAdapter, SendOptions};
pub use station_handle::StationHandle;
