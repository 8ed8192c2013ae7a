//! Station aggregate: registration state, boot echo, connector set,
//! configuration store, and the static descriptor it was built from.

use serde::Deserialize;

use crate::domain::configuration::{ConfigurationEntry, ConfigurationStore};
use crate::domain::connector::ConnectorSet;
use crate::domain::ocpp::enums::RegistrationStatus;
use crate::domain::ocpp::messages::BootNotificationConf;

/// ATG tuning knobs, `spec.md` §6 `stationInfo.AutomaticTransactionGenerator`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtgConfig {
    pub probability_of_start: f64,
    pub min_duration_secs: u64,
    pub max_duration_secs: u64,
    pub min_delay_between_two_transactions_secs: u64,
    pub max_delay_between_two_transactions_secs: u64,
    #[serde(default = "default_stop_after_hours")]
    pub stop_after_hours: f64,
}

fn default_stop_after_hours() -> f64 {
    24.0
}

impl Default for AtgConfig {
    fn default() -> Self {
        Self {
            probability_of_start: 0.2,
            min_duration_secs: 300,
            max_duration_secs: 1800,
            min_delay_between_two_transactions_secs: 15,
            max_delay_between_two_transactions_secs: 60,
            stop_after_hours: default_stop_after_hours(),
        }
    }
}

/// Everything an external configuration loader materializes for one
/// simulated station (`spec.md` §6 "Station descriptor").
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationDescriptor {
    pub charging_station_id: String,
    pub connector_count: u32,
    pub charge_point_vendor: String,
    pub charge_point_model: String,

    #[serde(default)]
    pub automatic_transaction_generator: AtgConfig,
    #[serde(default = "default_reset_time_secs")]
    pub reset_time_secs: u64,

    #[serde(default)]
    pub smart_charging_enabled: bool,
    #[serde(default)]
    pub firmware_management_enabled: bool,
    #[serde(default)]
    pub remote_trigger_enabled: bool,

    #[serde(default)]
    pub authorized_tags: Vec<String>,
    #[serde(default)]
    pub require_authorize: bool,
    #[serde(default)]
    pub authorize_remote_tx_requests: bool,
    #[serde(default)]
    pub local_auth_list_enabled: bool,
    #[serde(default)]
    pub may_authorize_at_remote_start: bool,

    #[serde(default)]
    pub ocpp_strict_compliance: bool,
    #[serde(default)]
    pub begin_end_meter_values: bool,
    #[serde(default)]
    pub out_of_order_end_meter_values: bool,
}

fn default_reset_time_secs() -> u64 {
    60
}

/// The mutable state the router, command handlers, and ATG all read and
/// mutate; guarded by a single lock at the `StationHandle` level (`spec.md`
/// §9 "serialize mutations through a single-writer lock").
pub struct StationState {
    pub registration: RegistrationStatus,
    /// The last `BootNotification.conf` the Central System sent back
    /// (`spec.md` §3 "a boot-notification echo"), `None` until the first
    /// boot handshake completes.
    pub boot_notification_echo: Option<BootNotificationConf>,
    pub connectors: ConnectorSet,
    pub configuration: ConfigurationStore,
    pub authorized_tags: Vec<String>,
}

impl StationState {
    pub fn new(descriptor: &StationDescriptor) -> Self {
        let mut configuration = ConfigurationStore::new();
        seed_default_configuration(&mut configuration, descriptor);

        Self {
            registration: RegistrationStatus::Unknown,
            boot_notification_echo: None,
            connectors: ConnectorSet::new(descriptor.connector_count),
            configuration,
            authorized_tags: descriptor.authorized_tags.clone(),
        }
    }
}

fn seed_default_configuration(store: &mut ConfigurationStore, descriptor: &StationDescriptor) {
    store.insert(ConfigurationEntry::new("HeartbeatInterval", "300"));
    store.insert(ConfigurationEntry::new("HeartBeatInterval", "300"));
    store.insert(ConfigurationEntry::new("WebSocketPingInterval", "60"));
    store.insert(
        ConfigurationEntry::new("NumberOfConnectors", descriptor.connector_count.to_string())
            .readonly(true),
    );
    store.insert(ConfigurationEntry::new("AuthorizeRemoteTxRequests", "false"));
    store.insert(ConfigurationEntry::new(
        "SupportedFeatureProfiles",
        "Core,FirmwareManagement,SmartCharging,RemoteTrigger",
    ).readonly(true));
}
