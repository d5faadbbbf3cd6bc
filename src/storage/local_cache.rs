//! Local Cache
//!
//! Opportunistic key/value storage for client-side state: the generated
//! user id, the detected timezone, the last customer payload and a fallback
//! copy of the overrides. Every failure is logged and swallowed; callers
//! see a missing value instead of an error.

use std::path::Path;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::database::{Database, SharedDatabase};
use crate::constants::cache_keys;
use crate::overrides::{CustomerPayload, Overrides};
use crate::types::{Result, UserId};

#[derive(Clone)]
pub struct LocalCache {
    db: SharedDatabase,
}

impl LocalCache {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            db: Arc::new(Database::open(path)?),
        })
    }

    pub fn in_memory() -> Result<Self> {
        Ok(Self {
            db: Arc::new(Database::open_in_memory()?),
        })
    }

    pub fn from_database(db: SharedDatabase) -> Self {
        Self { db }
    }

    // =========================================================================
    // Raw Access
    // =========================================================================

    pub fn get(&self, key: &str) -> Option<String> {
        match self.db.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!("Cache read failed for {}: {}", key, e);
                None
            }
        }
    }

    /// Returns whether the write landed
    pub fn set(&self, key: &str, value: &str) -> bool {
        match self.db.set(key, value) {
            Ok(()) => true,
            Err(e) => {
                warn!("Cache write failed for {}: {}", key, e);
                false
            }
        }
    }

    pub fn remove(&self, key: &str) {
        if let Err(e) = self.db.remove(key) {
            warn!("Cache remove failed for {}: {}", key, e);
        }
    }

    fn get_json(&self, key: &str) -> Option<Value> {
        let raw = self.get(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring unreadable cache entry {}: {}", key, e);
                None
            }
        }
    }

    // =========================================================================
    // Identity and Locale
    // =========================================================================

    /// Stored client identity, generated and persisted on first use.
    ///
    /// Falls back to `default` when the cache cannot hold the new id.
    pub fn user_id(&self) -> UserId {
        if let Some(existing) = self.get(cache_keys::USER_ID).filter(|s| !s.is_empty()) {
            return UserId::new(existing);
        }

        let generated = UserId::generate();
        if self.set(cache_keys::USER_ID, generated.as_str()) {
            debug!("Generated user id {}", generated);
            generated
        } else {
            UserId::default()
        }
    }

    pub fn timezone(&self) -> Option<String> {
        self.get(cache_keys::USER_TIMEZONE).filter(|s| !s.is_empty())
    }

    pub fn set_timezone(&self, timezone: &str) -> bool {
        self.set(cache_keys::USER_TIMEZONE, timezone)
    }

    // =========================================================================
    // Customer Payload
    // =========================================================================

    pub fn save_payload(&self, payload: &CustomerPayload) -> bool {
        self.set(cache_keys::CUSTOMER_PAYLOAD, &payload.as_value().to_string())
    }

    pub fn load_payload(&self) -> Option<CustomerPayload> {
        self.get_json(cache_keys::CUSTOMER_PAYLOAD)
            .map(CustomerPayload::from_value)
    }

    pub fn clear_payload(&self) {
        self.remove(cache_keys::CUSTOMER_PAYLOAD);
    }

    // =========================================================================
    // Override Fallback
    // =========================================================================

    /// Write every section and the switch in one transaction
    pub fn save_overrides(&self, overrides: &Overrides) -> bool {
        let entries = vec![
            (
                cache_keys::RING_DEBUG_OVERRIDES.to_string(),
                Value::Object(overrides.ring_debug_overrides.clone()).to_string(),
            ),
            (
                cache_keys::RING_BATTERY_OVERRIDES.to_string(),
                Value::Object(overrides.ring_battery_overrides.clone()).to_string(),
            ),
            (
                cache_keys::KUSTOMER_OVERRIDES.to_string(),
                Value::Object(overrides.kustomer_overrides.clone()).to_string(),
            ),
            (
                cache_keys::OVERRIDES_ENABLED.to_string(),
                overrides.overrides_enabled.to_string(),
            ),
        ];

        match self.db.set_many(entries) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to cache overrides: {}", e);
                false
            }
        }
    }

    /// Fallback copy of the overrides, `None` when no section was ever stored.
    ///
    /// Anything other than a stored `"false"` leaves overrides enabled.
    pub fn load_overrides(&self) -> Option<Overrides> {
        let debug = self.get(cache_keys::RING_DEBUG_OVERRIDES);
        let battery = self.get(cache_keys::RING_BATTERY_OVERRIDES);
        let kustomer = self.get(cache_keys::KUSTOMER_OVERRIDES);

        if debug.is_none() && battery.is_none() && kustomer.is_none() {
            return None;
        }

        let section = |raw: Option<String>| -> Map<String, Value> {
            raw.and_then(|s| serde_json::from_str::<Map<String, Value>>(&s).ok())
                .unwrap_or_default()
        };

        Some(Overrides {
            ring_debug_overrides: section(debug),
            ring_battery_overrides: section(battery),
            kustomer_overrides: section(kustomer),
            overrides_enabled: self.get(cache_keys::OVERRIDES_ENABLED).as_deref() != Some("false"),
        })
    }
}
