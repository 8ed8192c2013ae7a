//! C5: the Automatic Transaction Generator. One per station, driving an
//! independent randomized loop per real connector so no single connector can
//! starve the scheduler (`spec.md` §4.5). Each loop is an ordinary
//! `tokio::spawn` task coordinating through the station's single-writer
//! lock, per the concurrency model resolved in `spec.md` §9.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant as StdInstant};

use chrono::Utc;
use rand::rngs::OsRng;
use rand::Rng;
use tokio::sync::Mutex;
use tokio::time::Instant as TokioInstant;

use crate::application::station_handle::StationHandle;
use crate::domain::ocpp::enums::{Availability, AuthorizationStatus, ChargePointStatus, RegistrationStatus, StopReason};
use crate::domain::ocpp::messages::{StartTransactionReq, StopTransactionReq};
use crate::support::constants::{INIT_TIME, WAIT_TIME};

pub struct Atg {
    handle: Arc<StationHandle>,
    time_to_stop: Arc<AtomicBool>,
    started_at: Mutex<Option<TokioInstant>>,
    /// `runningDuration` (`spec.md` §4.5): accumulated charging time across
    /// this station's whole ATG lifetime, so a restarted `stopDate` accounts
    /// for time already spent before the most recent `start()`.
    running_duration: Mutex<Duration>,
    /// Count of per-connector loop iterations that drew a probability above
    /// `probabilityOfStart` and skipped starting a transaction (`spec.md`
    /// §4.5 step 7).
    skip_count: AtomicU64,
}

impl Atg {
    pub fn new(handle: Arc<StationHandle>) -> Arc<Self> {
        Arc::new(Self {
            handle,
            time_to_stop: Arc::new(AtomicBool::new(true)),
            started_at: Mutex::new(None),
            running_duration: Mutex::new(Duration::ZERO),
            skip_count: AtomicU64::new(0),
        })
    }

    /// Spawns one independent driver per real connector (id > 0).
    pub async fn start(self: &Arc<Self>) {
        let now = TokioInstant::now();
        *self.started_at.lock().await = Some(now);
        self.time_to_stop.store(false, Ordering::SeqCst);

        let cfg = self.handle.descriptor.automatic_transaction_generator.clone();
        let stop_after_total = Duration::from_secs_f64((cfg.stop_after_hours * 3600.0).max(0.0));
        let running_duration = *self.running_duration.lock().await;
        let stop_after = stop_after_total.saturating_sub(running_duration);
        let stop_at = now + stop_after;

        let connector_ids = self.handle.with_state("atg.start.real_ids", |s| s.connectors.real_ids()).await;
        for connector_id in connector_ids {
            let atg = Arc::clone(self);
            tokio::spawn(async move {
                atg.run_connector_loop(connector_id, stop_at).await;
            });
        }
    }

    /// Cooperative stop: flips `time_to_stop` and sends a `StopTransaction`
    /// for every connector with a running transaction. Loops observe the
    /// flag at their next predicate check (`spec.md` §5 "Cancellation").
    pub async fn stop(&self, reason: Option<StopReason>) {
        self.time_to_stop.store(true, Ordering::SeqCst);

        let running = self
            .handle
            .with_state("atg.stop.snapshot", |s| {
                s.connectors
                    .iter()
                    .filter(|c| c.id > 0 && c.transaction_started)
                    .filter_map(|c| {
                        c.transaction_id.map(|tx| {
                            (c.id, tx, c.transaction_energy_active_import_register, c.transaction_id_tag.clone())
                        })
                    })
                    .collect::<Vec<_>>()
            })
            .await;

        for (connector_id, transaction_id, register, id_tag) in running {
            let _ = self
                .handle
                .outbound()
                .stop_transaction(StopTransactionReq {
                    transaction_id,
                    meter_stop: register as i64,
                    timestamp: Utc::now(),
                    id_tag,
                    reason,
                })
                .await;
            self.handle
                .with_state("atg.stop.clear", |s| {
                    if let Ok(c) = s.connectors.get_mut(connector_id) {
                        c.clear_transaction();
                    }
                })
                .await;
        }
    }

    async fn run_connector_loop(self: Arc<Self>, connector_id: u32, stop_at: TokioInstant) {
        let cfg = self.handle.descriptor.automatic_transaction_generator.clone();

        loop {
            if self.time_to_stop.load(Ordering::SeqCst) {
                break;
            }

            if TokioInstant::now() > stop_at {
                self.stop(None).await;
                break;
            }

            let registration = self.handle.with_state("atg.loop.registration", |s| s.registration).await;
            if registration != RegistrationStatus::Registered {
                tracing::error!(connector_id, "ATG loop exiting: station not registered");
                break;
            }

            let station_available = self
                .handle
                .with_state("atg.loop.station_available", |s| {
                    s.connectors.get(0).map(|c| c.availability == Availability::Operative).unwrap_or(false)
                })
                .await;
            if !station_available {
                self.stop(None).await;
                break;
            }

            let connector_available = self
                .handle
                .with_state("atg.loop.connector_available", |s| {
                    s.connectors
                        .get(connector_id)
                        .map(|c| c.availability == Availability::Operative)
                        .unwrap_or(false)
                })
                .await;
            if !connector_available {
                break;
            }

            if !self.handle.adapter.is_ready() {
                tokio::time::sleep(INIT_TIME).await;
                continue;
            }

            let delay_secs = gen_range_u64(cfg.min_delay_between_two_transactions_secs, cfg.max_delay_between_two_transactions_secs);
            tokio::time::sleep(Duration::from_secs(delay_secs)).await;

            let draw: f64 = { OsRng.gen_range(0.0..1.0) };
            if draw >= cfg.probability_of_start {
                let skipped = self.skip_count.fetch_add(1, Ordering::Relaxed) + 1;
                tracing::debug!(connector_id, skipped, "ATG skipped starting a transaction");
                continue;
            }

            if !self.start_transaction(connector_id).await {
                tokio::time::sleep(WAIT_TIME).await;
                continue;
            }

            let duration_secs = gen_range_u64(cfg.min_duration_secs, cfg.max_duration_secs);
            tokio::time::sleep(Duration::from_secs(duration_secs)).await;

            let still_running = self
                .handle
                .with_state("atg.loop.still_running", |s| {
                    s.connectors.get(connector_id).map(|c| c.transaction_started).unwrap_or(false)
                })
                .await;
            if still_running {
                self.stop_transaction(connector_id).await;
            }

            if let Some(started_at) = *self.started_at.lock().await {
                *self.running_duration.lock().await = TokioInstant::now().saturating_duration_since(started_at);
            }
        }
    }

    /// `spec.md` §4.5 step 8: pick a random authorized tag (if any), optionally
    /// authorize, then emit `StartTransaction`.
    async fn start_transaction(&self, connector_id: u32) -> bool {
        let started = StdInstant::now();
        let authorized_tags = self.handle.descriptor.authorized_tags.clone();
        let id_tag = if authorized_tags.is_empty() {
            None
        } else {
            let idx = gen_range_usize(0, authorized_tags.len() - 1);
            Some(authorized_tags[idx].clone())
        };

        let authorized = match &id_tag {
            Some(tag) if self.handle.descriptor.require_authorize => {
                matches!(
                    self.handle.outbound().authorize(tag.clone()).await,
                    Ok(conf) if conf.id_tag_info.status == AuthorizationStatus::Accepted
                )
            }
            _ => true,
        };

        if !authorized {
            self.handle.perf.record("atg.start_transaction", started.elapsed().as_secs_f64() * 1000.0);
            return false;
        }

        let result = self
            .handle
            .outbound()
            .start_transaction(StartTransactionReq {
                connector_id,
                id_tag: id_tag.clone().unwrap_or_default(),
                meter_start: 0,
                timestamp: Utc::now(),
                reservation_id: None,
            })
            .await;

        self.handle.perf.record("atg.start_transaction", started.elapsed().as_secs_f64() * 1000.0);

        match result {
            Ok(conf) if conf.id_tag_info.status == AuthorizationStatus::Accepted => {
                self.handle
                    .with_state("atg.start_transaction.apply", |s| {
                        if let Ok(c) = s.connectors.get_mut(connector_id) {
                            c.start_transaction(conf.transaction_id, id_tag.clone().unwrap_or_default());
                            c.status = ChargePointStatus::Charging;
                        }
                    })
                    .await;
                true
            }
            _ => false,
        }
    }

    async fn stop_transaction(&self, connector_id: u32) {
        let started = StdInstant::now();
        let snapshot = self
            .handle
            .with_state("atg.stop_transaction.read", |s| {
                s.connectors
                    .get(connector_id)
                    .ok()
                    .map(|c| (c.transaction_id, c.transaction_energy_active_import_register, c.transaction_id_tag.clone()))
            })
            .await;

        if let Some((Some(transaction_id), register, id_tag)) = snapshot {
            let _ = self
                .handle
                .outbound()
                .stop_transaction(StopTransactionReq {
                    transaction_id,
                    meter_stop: register as i64,
                    timestamp: Utc::now(),
                    id_tag,
                    reason: None,
                })
                .await;
            self.handle
                .with_state("atg.stop_transaction.clear", |s| {
                    if let Ok(c) = s.connectors.get_mut(connector_id) {
                        c.clear_transaction();
                    }
                })
                .await;
        }

        self.handle.perf.record("atg.stop_transaction", started.elapsed().as_secs_f64() * 1000.0);
    }
}

fn gen_range_u64(min: u64, max: u64) -> u64 {
    if min >= max {
        min
    } else {
        OsRng.gen_range(min..=max)
    }
}

fn gen_range_usize(min: usize, max: usize) -> usize {
    if min >= max {
        min
    } else {
        OsRng.gen_range(min..=max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::diagnostics::test_support::StubDiagnostics;
    use crate::application::outbound::test_support::RecordingAdapter;
    use crate::application::perf::NullPerformanceSink;
    use crate::domain::{AtgConfig, StationDescriptor};

    fn descriptor() -> StationDescriptor {
        StationDescriptor {
            charging_station_id: "CS-1".into(),
            connector_count: 1,
            charge_point_vendor: "Acme".into(),
            charge_point_model: "Sim".into(),
            automatic_transaction_generator: AtgConfig {
                probability_of_start: 1.0,
                min_duration_secs: 1,
                max_duration_secs: 1,
                min_delay_between_two_transactions_secs: 0,
                max_delay_between_two_transactions_secs: 0,
                stop_after_hours: 24.0,
            },
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
    async fn stop_sends_stop_transaction_for_every_running_connector() {
        let adapter = Arc::new(RecordingAdapter::default());
        let handle = StationHandle::new(
            descriptor(),
            adapter.clone(),
            Arc::new(NullPerformanceSink),
            Arc::new(StubDiagnostics::failing()),
        );
        handle
            .with_state("setup", |s| {
                s.registration = RegistrationStatus::Registered;
                s.connectors.get_mut(1).unwrap().start_transaction(7, "TAG1");
            })
            .await;

        let atg = Atg::new(Arc::clone(&handle));
        atg.stop(None).await;

        let sent = adapter.sent.lock().unwrap();
        assert!(sent.iter().any(|(action, _)| action == "StopTransaction"));

        let still_running = handle.with_state("check", |s| s.connectors.get(1).unwrap().transaction_started).await;
        assert!(!still_running);
    }

    /// End-to-end: a full probability-of-start and a registered station
    /// drives one real StartTransaction/StopTransaction pair.
    #[tokio::test]
    async fn happy_cycle_starts_and_stops_a_transaction() {
        let adapter = Arc::new(RecordingAdapter::default());
        adapter.queue(serde_json::json!({"transactionId": 1, "idTagInfo": {"status": "Accepted"}}));
        adapter.queue(serde_json::json!({}));

        let mut descriptor = descriptor();
        descriptor.authorized_tags = vec!["TAG1".into()];

        let handle = StationHandle::new(descriptor, adapter.clone(), Arc::new(NullPerformanceSink), Arc::new(StubDiagnostics::failing()));
        handle.with_state("setup", |s| s.registration = RegistrationStatus::Registered).await;

        let atg = Atg::new(Arc::clone(&handle));
        atg.start().await;

        tokio::time::sleep(Duration::from_millis(2000)).await;
        atg.stop(None).await;

        let sent = adapter.sent.lock().unwrap();
        assert!(sent.iter().any(|(action, _)| action == "StartTransaction"));
        assert!(sent.iter().any(|(action, _)| action == "StopTransaction"));
    }

    #[tokio::test]
    async fn loop_exits_immediately_when_station_unregistered() {
        let adapter = Arc::new(RecordingAdapter::default());
        let handle = StationHandle::new(
            descriptor(),
            adapter.clone(),
            Arc::new(NullPerformanceSink),
            Arc::new(StubDiagnostics::failing()),
        );
        // registration left as default (Unknown), not Registered.
        let atg = Atg::new(Arc::clone(&handle));
        atg.time_to_stop.store(false, Ordering::SeqCst);
        atg.run_connector_loop(1, TokioInstant::now() + Duration::from_secs(3600)).await;

        assert!(adapter.sent.lock().unwrap().is_empty());
    }
}
