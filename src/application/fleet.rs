//! The fleet registry: every simulated station's handle, keyed by its
//! charging station id. Modeled on the teacher's `SessionManager`
//! (`session/manager.rs`) — a `DashMap`-backed register/lookup/broadcast
//! surface with no locking beyond what `DashMap` gives for free.

use std::sync::Arc;

use dashmap::DashMap;

use crate::application::station_handle::StationHandle;

#[derive(Default)]
pub struct Fleet {
    stations: DashMap<String, Arc<StationHandle>>,
}

impl Fleet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, handle: Arc<StationHandle>) {
        self.stations.insert(handle.station_id().to_string(), handle);
    }

    pub fn unregister(&self, station_id: &str) {
        self.stations.remove(station_id);
    }

    pub fn get(&self, station_id: &str) -> Option<Arc<StationHandle>> {
        self.stations.get(station_id).map(|e| e.value().clone())
    }

    pub fn station_ids(&self) -> Vec<String> {
        self.stations.iter().map(|e| e.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::diagnostics::test_support::StubDiagnostics;
    use crate::application::outbound::test_support::RecordingAdapter;
    use crate::application::perf::NullPerformanceSink;
    use crate::domain::StationDescriptor;

    fn descriptor(id: &str) -> StationDescriptor {
        StationDescriptor {
            charging_station_id: id.into(),
            connector_count: 1,
            charge_point_vendor: "Acme".into(),
            charge_point_model: "Sim".into(),
            automatic_transaction_generator: Default::default(),
            reset_time_secs: 60,
            smart_charging_enabled: false,
            firmware_management_enabled: false,
            remote_trigger_enabled: false,
            authorized_tags: vec![],
            require_authorize: false,
            authorize_remote_tx_requests: false,
            local_auth_list_enabled: false,
            may_authorize_at_remote_start: false,
            ocpp_strict_compliance: false,
            begin_end_meter_values: false,
            out_of_order_end_meter_values: false,
        }
    }

    #[test]
    fn register_and_lookup_round_trips() {
        let fleet = Fleet::new();
        let handle = StationHandle::new(
            descriptor("CS-1"),
            Arc::new(RecordingAdapter::default()),
            Arc::new(NullPerformanceSink),
            Arc::new(StubDiagnostics::failing()),
        );
        fleet.register(handle);
        assert!(fleet.get("CS-1").is_some());
        assert_eq!(fleet.station_ids(), vec!["CS-1".to_string()]);
        fleet.unregister("CS-1");
        assert!(fleet.get("CS-1").is_none());
    }
}
