//! Configuration key/value store (C2).

use std::collections::BTreeMap;

use crate::domain::error::{DomainError, DomainResult};

const HEARTBEAT_INTERVAL_KEY: &str = "HeartbeatInterval";
const HEART_BEAT_INTERVAL_KEY: &str = "HeartBeatInterval";
const WS_PING_INTERVAL_KEY: &str = "WebSocketPingInterval";

#[derive(Debug, Clone)]
pub struct ConfigurationEntry {
    pub key: String,
    pub value: String,
    pub readonly: bool,
    pub visible: bool,
    pub reboot: bool,
}

impl ConfigurationEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            readonly: false,
            visible: true,
            reboot: false,
        }
    }

    pub fn readonly(mut self, readonly: bool) -> Self {
        self.readonly = readonly;
        self
    }

    pub fn reboot(mut self, reboot: bool) -> Self {
        self.reboot = reboot;
        self
    }

    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }
}

/// Side effect a caller must act on after a successful `set`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSideEffect {
    None,
    RestartHeartbeat,
    RestartWebSocketPing,
}

/// Outcome of a successful write, including whether a reboot is required.
pub struct SetOutcome {
    pub reboot_required: bool,
    pub side_effect: ConfigSideEffect,
}

/// Key/value settings store with read-only, visibility, and reboot flags.
/// Keys are case-sensitive except for the two Heartbeat aliases, which are
/// kept synchronized: writing either writes both (`spec.md` §3).
#[derive(Debug, Clone, Default)]
pub struct ConfigurationStore {
    entries: BTreeMap<String, ConfigurationEntry>,
}

impl ConfigurationStore {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, entry: ConfigurationEntry) {
        self.entries.insert(entry.key.clone(), entry);
    }

    pub fn get(&self, key: &str) -> Option<&ConfigurationEntry> {
        self.entries.get(key)
    }

    /// Set `key` to `value`. Rejects writes to read-only entries. On success,
    /// reports whether a reboot is required and which background timer (if
    /// any) must be restarted because of the Heartbeat/WebSocketPingInterval
    /// alias rules (`spec.md` §4.2).
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> DomainResult<SetOutcome> {
        let value = value.into();

        let entry = self
            .entries
            .get(key)
            .ok_or_else(|| DomainError::ConfigurationUnknown(key.to_string()))?;
        if entry.readonly {
            return Err(DomainError::ConfigurationReadOnly(key.to_string()));
        }

        let value_changed = entry.value != value;
        let reboot_required = entry.reboot;

        if let Some(e) = self.entries.get_mut(key) {
            e.value = value.clone();
        }

        let side_effect = if is_heartbeat_alias(key) {
            self.sync_heartbeat_alias(key, &value);
            if value_changed {
                ConfigSideEffect::RestartHeartbeat
            } else {
                ConfigSideEffect::None
            }
        } else if key == WS_PING_INTERVAL_KEY {
            if value_changed {
                ConfigSideEffect::RestartWebSocketPing
            } else {
                ConfigSideEffect::None
            }
        } else {
            ConfigSideEffect::None
        };

        Ok(SetOutcome {
            reboot_required,
            side_effect,
        })
    }

    fn sync_heartbeat_alias(&mut self, written_key: &str, value: &str) {
        let sibling = if written_key == HEARTBEAT_INTERVAL_KEY {
            HEART_BEAT_INTERVAL_KEY
        } else {
            HEARTBEAT_INTERVAL_KEY
        };
        if let Some(e) = self.entries.get_mut(sibling) {
            e.value = value.to_string();
        }
    }

    /// Returns `(found, unknown)`. An empty/absent `keys` returns all visible
    /// entries.
    pub fn list_visible(&self, keys: Option<&[String]>) -> (Vec<ConfigurationEntry>, Vec<String>) {
        match keys {
            None => (
                self.entries
                    .values()
                    .filter(|e| e.visible)
                    .cloned()
                    .collect(),
                Vec::new(),
            ),
            Some(keys) if keys.is_empty() => (
                self.entries
                    .values()
                    .filter(|e| e.visible)
                    .cloned()
                    .collect(),
                Vec::new(),
            ),
            Some(keys) => {
                let mut found = Vec::new();
                let mut unknown = Vec::new();
                for key in keys {
                    match self.entries.get(key) {
                        Some(e) if e.visible => found.push(e.clone()),
                        Some(_) => {}
                        None => unknown.push(key.clone()),
                    }
                }
                (found, unknown)
            }
        }
    }
}

fn is_heartbeat_alias(key: &str) -> bool {
    key == HEARTBEAT_INTERVAL_KEY || key == HEART_BEAT_INTERVAL_KEY
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_heartbeat() -> ConfigurationStore {
        let mut store = ConfigurationStore::new();
        store.insert(ConfigurationEntry::new(HEARTBEAT_INTERVAL_KEY, "300"));
        store.insert(ConfigurationEntry::new(HEART_BEAT_INTERVAL_KEY, "300"));
        store.insert(ConfigurationEntry::new(WS_PING_INTERVAL_KEY, "60"));
        store.insert(
            ConfigurationEntry::new("NumberOfConnectors", "2").readonly(true),
        );
        store
    }

    #[test]
    fn readonly_write_is_rejected_and_value_unchanged() {
        let mut store = store_with_heartbeat();
        let err = store.set("NumberOfConnectors", "5").unwrap_err();
        assert_eq!(err, DomainError::ConfigurationReadOnly("NumberOfConnectors".into()));
        assert_eq!(store.get("NumberOfConnectors").unwrap().value, "2");
    }

    #[test]
    fn heartbeat_aliases_stay_synchronized_either_order() {
        let mut store = store_with_heartbeat();
        store.set(HEART_BEAT_INTERVAL_KEY, "30").unwrap();
        assert_eq!(store.get(HEARTBEAT_INTERVAL_KEY).unwrap().value, "30");
        assert_eq!(store.get(HEART_BEAT_INTERVAL_KEY).unwrap().value, "30");

        store.set(HEARTBEAT_INTERVAL_KEY, "45").unwrap();
        assert_eq!(store.get(HEART_BEAT_INTERVAL_KEY).unwrap().value, "45");
    }

    #[test]
    fn unknown_key_is_rejected() {
        let mut store = store_with_heartbeat();
        assert!(store.set("NoSuchKey", "x").is_err());
    }

    #[test]
    fn list_visible_empty_keys_returns_all() {
        let store = store_with_heartbeat();
        let (found, unknown) = store.list_visible(None);
        assert_eq!(found.len(), 4);
        assert!(unknown.is_empty());
    }

    #[test]
    fn list_visible_reports_unknown_keys() {
        let store = store_with_heartbeat();
        let (found, unknown) = store.list_visible(Some(&[
            HEARTBEAT_INTERVAL_KEY.to_string(),
            "Bogus".to_string(),
        ]));
        assert_eq!(found.len(), 1);
        assert_eq!(unknown, vec!["Bogus".to_string()]);
    }
}
