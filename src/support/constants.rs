//! Timing constants the core falls back on when a station descriptor
//! doesn't override them (`spec.md` §5 "Timeouts").

use std::time::Duration;

/// How long the ATG waits before retrying when the outbound adapter isn't
/// ready yet.
pub const INIT_TIME: Duration = Duration::from_secs(5);

/// How long the ATG waits after a rejected StartTransaction before trying
/// the connector again.
pub const WAIT_TIME: Duration = Duration::from_secs(5);

/// Delay between a TriggerMessage command being accepted and the triggered
/// request actually going out.
pub const TRIGGER_MESSAGE_DELAY: Duration = Duration::from_millis(500);
