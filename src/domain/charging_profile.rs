//! Charging profile stack manipulation (part of C1 connector state).
//!
//! Profiles are stored and returned verbatim; schedule contents are never
//! interpreted — Smart Charging schedule computation is a Non-goal.

pub use crate::domain::ocpp::messages::ChargingProfile;
use crate::domain::ocpp::enums::ChargingProfilePurpose;

/// Insert `profile` into `stack`, replacing any existing entry with the same
/// `charging_profile_id`, or the same `(purpose, stack_level)` pair — OCPP 1.6
/// semantics for `SetChargingProfile` (`spec.md` §4.4).
pub fn upsert(stack: &mut Vec<ChargingProfile>, profile: ChargingProfile) {
    stack.retain(|p| {
        p.charging_profile_id != profile.charging_profile_id
            && !(p.charging_profile_purpose == profile.charging_profile_purpose
                && p.stack_level == profile.stack_level)
    });
    stack.push(profile);
}

/// Clear profiles from `stack` matching any of the `ClearChargingProfile`
/// filters; returns `true` if at least one entry was removed.
pub fn clear_matching(
    stack: &mut Vec<ChargingProfile>,
    id: Option<i32>,
    purpose: Option<ChargingProfilePurpose>,
    stack_level: Option<i32>,
) -> bool {
    let before = stack.len();
    stack.retain(|p| {
        let matches_id = id.is_some_and(|id| p.charging_profile_id == id);
        let matches_purpose_only = purpose.is_none()
            && stack_level.is_some_and(|sl| p.stack_level == sl);
        let matches_level_only =
            stack_level.is_none() && purpose.is_some_and(|pp| p.charging_profile_purpose == pp);
        let matches_both = purpose.is_some_and(|pp| p.charging_profile_purpose == pp)
            && stack_level.is_some_and(|sl| p.stack_level == sl);
        !(matches_id || matches_purpose_only || matches_level_only || matches_both)
    });
    stack.len() != before
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ocpp::enums::ChargingProfileKind;

    fn profile(id: i32, purpose: ChargingProfilePurpose, stack_level: i32) -> ChargingProfile {
        ChargingProfile {
            charging_profile_id: id,
            transaction_id: None,
            stack_level,
            charging_profile_purpose: purpose,
            charging_profile_kind: ChargingProfileKind::Absolute,
            valid_from: None,
            valid_to: None,
            charging_schedule: None,
        }
    }

    #[test]
    fn upsert_replaces_by_id() {
        let mut stack = vec![profile(7, ChargingProfilePurpose::TxProfile, 0)];
        upsert(&mut stack, profile(7, ChargingProfilePurpose::TxProfile, 1));
        assert_eq!(stack.len(), 1);
        assert_eq!(stack[0].stack_level, 1);
    }

    #[test]
    fn upsert_replaces_by_purpose_and_level() {
        let mut stack = vec![profile(1, ChargingProfilePurpose::TxProfile, 0)];
        upsert(&mut stack, profile(2, ChargingProfilePurpose::TxProfile, 0));
        assert_eq!(stack.len(), 1);
        assert_eq!(stack[0].charging_profile_id, 2);
    }

    #[test]
    fn clear_matching_by_id() {
        let mut stack = vec![
            profile(7, ChargingProfilePurpose::TxProfile, 0),
            profile(8, ChargingProfilePurpose::TxProfile, 1),
        ];
        let cleared = clear_matching(&mut stack, Some(7), None, None);
        assert!(cleared);
        assert_eq!(stack.len(), 1);
        assert_eq!(stack[0].charging_profile_id, 8);
    }

    #[test]
    fn clear_matching_none_found() {
        let mut stack = vec![profile(7, ChargingProfilePurpose::TxProfile, 0)];
        let cleared = clear_matching(&mut stack, Some(99), None, None);
        assert!(!cleared);
        assert_eq!(stack.len(), 1);
    }
}
