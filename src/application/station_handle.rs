//! The façade every router, handler, and ATG loop actually holds: an
//! `Arc<StationHandle>` bundling the single-writer lock around `StationState`
//! with the station's outbound adapter and performance sink. Resolves the
//! station/ATG cyclic-reference question raised in `spec.md` §9 the way the
//! teacher resolves `SessionManager`/`Connection` — a registry of cheap,
//! cloneable handles rather than back-pointers.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{Mutex, Notify};

use crate::application::diagnostics::DiagnosticsCollaborator;
use crate::application::outbound::{Outbound, OutboundAdapter};
use crate::application::perf::PerformanceSink;
use crate::domain::{StationDescriptor, StationState};

pub struct StationHandle {
    pub descriptor: StationDescriptor,
    pub state: Mutex<StationState>,
    pub adapter: Arc<dyn OutboundAdapter>,
    pub perf: Arc<dyn PerformanceSink>,
    pub diagnostics: Arc<dyn DiagnosticsCollaborator>,
    /// Notified by `ChangeConfiguration` when a Heartbeat alias changes, so
    /// the station's heartbeat timer task can restart its interval.
    pub heartbeat_restart: Notify,
    /// Notified by `ChangeConfiguration` when `WebSocketPingInterval` changes.
    pub ping_restart: Notify,
}

impl StationHandle {
    pub fn new(
        descriptor: StationDescriptor,
        adapter: Arc<dyn OutboundAdapter>,
        perf: Arc<dyn PerformanceSink>,
        diagnostics: Arc<dyn DiagnosticsCollaborator>,
    ) -> Arc<Self> {
        let state = StationState::new(&descriptor);
        Arc::new(Self {
            descriptor,
            state: Mutex::new(state),
            adapter,
            perf,
            diagnostics,
            heartbeat_restart: Notify::new(),
            ping_restart: Notify::new(),
        })
    }

    pub fn station_id(&self) -> &str {
        &self.descriptor.charging_station_id
    }

    pub fn outbound(&self) -> Outbound<'_> {
        Outbound::new(self.adapter.as_ref())
    }

    /// Run `f` against the locked state, recording how long the lock was
    /// held under `operation` (`spec.md` §9 — never await an outbound call
    /// while holding this lock).
    pub async fn with_state<F, R>(&self, operation: &str, f: F) -> R
    where
        F: FnOnce(&mut StationState) -> R,
    {
        let started = Instant::now();
        let mut guard = self.state.lock().await;
        let result = f(&mut guard);
        drop(guard);
        self.perf
            .record(operation, started.elapsed().as_secs_f64() * 1000.0);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::diagnostics::test_support::StubDiagnostics;
    use crate::application::outbound::test_support::RecordingAdapter;
    use crate::application::perf::NullPerformanceSink;

    fn descriptor() -> StationDescriptor {
        StationDescriptor {
            charging_station_id: "CS-1".into(),
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

    #[tokio::test]
    async fn with_state_mutates_under_lock() {
        let adapter: Arc<dyn OutboundAdapter> = Arc::new(RecordingAdapter::default());
        let perf: Arc<dyn PerformanceSink> = Arc::new(NullPerformanceSink);
        let diagnostics = Arc::new(StubDiagnostics::failing());
        let handle = StationHandle::new(descriptor(), adapter, perf, diagnostics);

        let registered = handle
            .with_state("test", |s| {
                s.registration = crate::domain::ocpp::enums::RegistrationStatus::Registered;
                s.registration
            })
            .await;
        assert_eq!(registered, crate::domain::ocpp::enums::RegistrationStatus::Registered);
    }
}
