//! Per-connector state (C1). Pure data with accessors enforcing the
//! invariants of `spec.md` §3. Emits no I/O.

use crate::domain::charging_profile::{self, ChargingProfile};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::ocpp::enums::{Availability, ChargePointStatus, ChargingProfilePurpose};

/// A single connector. Connector id 0 is the station-level pseudo-connector.
#[derive(Debug, Clone)]
pub struct Connector {
    pub id: u32,
    pub status: ChargePointStatus,
    pub availability: Availability,

    pub transaction_started: bool,
    pub transaction_id: Option<i32>,
    pub transaction_id_tag: Option<String>,
    pub transaction_energy_active_import_register: f64,
    pub transaction_remote_started: bool,

    pub authorize_id_tag: Option<String>,
    pub local_authorize_id_tag: Option<String>,
    pub id_tag_local_authorized: bool,

    pub charging_profiles: Vec<ChargingProfile>,
}

impl Connector {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            status: ChargePointStatus::Available,
            availability: Availability::Operative,
            transaction_started: false,
            transaction_id: None,
            transaction_id_tag: None,
            transaction_energy_active_import_register: 0.0,
            transaction_remote_started: false,
            authorize_id_tag: None,
            local_authorize_id_tag: None,
            id_tag_local_authorized: false,
            charging_profiles: Vec::new(),
        }
    }

    /// Invariant 1: `transaction_started ⇒ transaction_id ∧ transaction_id_tag`.
    pub fn start_transaction(&mut self, transaction_id: i32, id_tag: impl Into<String>) {
        self.transaction_started = true;
        self.transaction_id = Some(transaction_id);
        self.transaction_id_tag = Some(id_tag.into());
    }

    /// Reset all transient transaction fields (`spec.md` §3 Lifecycle).
    pub fn clear_transaction(&mut self) {
        self.transaction_started = false;
        self.transaction_id = None;
        self.transaction_id_tag = None;
        self.transaction_energy_active_import_register = 0.0;
        self.transaction_remote_started = false;
        self.authorize_id_tag = None;
        self.local_authorize_id_tag = None;
        self.id_tag_local_authorized = false;
    }

    /// Invariant 4: `TxProfile` requires a running transaction on a real
    /// connector; `ChargePointMaxProfile` requires the station pseudo
    /// connector (id 0); `TxDefaultProfile` has no extra precondition.
    pub fn may_accept_profile(&self, purpose: ChargingProfilePurpose) -> bool {
        match purpose {
            ChargingProfilePurpose::ChargePointMaxProfile => self.id == 0,
            ChargingProfilePurpose::TxProfile => self.id > 0 && self.transaction_started,
            ChargingProfilePurpose::TxDefaultProfile => true,
        }
    }

    pub fn set_profile(&mut self, profile: ChargingProfile) {
        charging_profile::upsert(&mut self.charging_profiles, profile);
    }

    pub fn clear_profiles_matching(
        &mut self,
        id: Option<i32>,
        purpose: Option<ChargingProfilePurpose>,
        stack_level: Option<i32>,
    ) -> bool {
        charging_profile::clear_matching(&mut self.charging_profiles, id, purpose, stack_level)
    }
}

/// The connector set for one station. Id 0 is always present.
#[derive(Debug, Clone)]
pub struct ConnectorSet {
    connectors: Vec<Connector>,
}

impl ConnectorSet {
    /// `count` is the number of real (id > 0) connectors.
    pub fn new(count: u32) -> Self {
        let connectors = (0..=count).map(Connector::new).collect();
        Self { connectors }
    }

    pub fn lookup(&self, id: u32) -> Option<&Connector> {
        self.connectors.iter().find(|c| c.id == id)
    }

    pub fn lookup_mut(&mut self, id: u32) -> Option<&mut Connector> {
        self.connectors.iter_mut().find(|c| c.id == id)
    }

    pub fn get(&self, id: u32) -> DomainResult<&Connector> {
        self.lookup(id).ok_or(DomainError::ConnectorNotFound(id))
    }

    pub fn get_mut(&mut self, id: u32) -> DomainResult<&mut Connector> {
        self.lookup_mut(id).ok_or(DomainError::ConnectorNotFound(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Connector> {
        self.connectors.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Connector> {
        self.connectors.iter_mut()
    }

    /// Real connectors only (id > 0), the ones the ATG drives.
    pub fn real_ids(&self) -> Vec<u32> {
        self.connectors.iter().map(|c| c.id).filter(|&id| id > 0).collect()
    }

    pub fn energy_register_for(&self, transaction_id: i32) -> Option<f64> {
        self.connectors
            .iter()
            .find(|c| c.transaction_id == Some(transaction_id))
            .map(|c| c.transaction_energy_active_import_register)
    }

    pub fn id_tag_for(&self, transaction_id: i32) -> Option<String> {
        self.connectors
            .iter()
            .find(|c| c.transaction_id == Some(transaction_id))
            .and_then(|c| c.transaction_id_tag.clone())
    }

    pub fn connector_for_transaction(&self, transaction_id: i32) -> Option<u32> {
        self.connectors
            .iter()
            .find(|c| c.transaction_id == Some(transaction_id))
            .map(|c| c.id)
    }

    /// Invariant 3: connector 0's availability dominates. Setting it
    /// Inoperative forces every per-connector status to Unavailable.
    pub fn apply_station_level_inoperative(&mut self) {
        for c in self.connectors.iter_mut().filter(|c| c.id > 0) {
            c.status = ChargePointStatus::Unavailable;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_transaction_sets_invariant_fields() {
        let mut c = Connector::new(1);
        c.start_transaction(42, "TAG1");
        assert!(c.transaction_started);
        assert_eq!(c.transaction_id, Some(42));
        assert_eq!(c.transaction_id_tag.as_deref(), Some("TAG1"));
    }

    #[test]
    fn clear_transaction_resets_transient_fields() {
        let mut c = Connector::new(1);
        c.start_transaction(42, "TAG1");
        c.transaction_remote_started = true;
        c.authorize_id_tag = Some("TAG1".into());
        c.clear_transaction();
        assert!(!c.transaction_started);
        assert!(c.transaction_id.is_none());
        assert!(c.transaction_id_tag.is_none());
        assert!(!c.transaction_remote_started);
        assert!(c.authorize_id_tag.is_none());
    }

    #[test]
    fn tx_profile_requires_running_transaction_on_real_connector() {
        let mut c = Connector::new(1);
        assert!(!c.may_accept_profile(crate::domain::ocpp::enums::ChargingProfilePurpose::TxProfile));
        c.start_transaction(1, "TAG");
        assert!(c.may_accept_profile(crate::domain::ocpp::enums::ChargingProfilePurpose::TxProfile));
    }

    #[test]
    fn charge_point_max_profile_requires_connector_zero() {
        let c0 = Connector::new(0);
        let c1 = Connector::new(1);
        let purpose = crate::domain::ocpp::enums::ChargingProfilePurpose::ChargePointMaxProfile;
        assert!(c0.may_accept_profile(purpose));
        assert!(!c1.may_accept_profile(purpose));
    }

    #[test]
    fn station_level_inoperative_forces_unavailable() {
        let mut set = ConnectorSet::new(2);
        set.apply_station_level_inoperative();
        assert_eq!(set.get(1).unwrap().status, ChargePointStatus::Unavailable);
        assert_eq!(set.get(2).unwrap().status, ChargePointStatus::Unavailable);
    }
}
