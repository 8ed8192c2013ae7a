//! OCPP-J message id generation.

/// Generates unique ids for outbound `Call` frames.
///
/// OCPP-J does not constrain the message id format beyond "string, max 36
/// chars"; a v4 UUID satisfies that comfortably and needs no shared counter
/// state across stations.
pub fn next_message_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
