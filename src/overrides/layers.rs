//! Customer payload, layered context and display status.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::Overrides;
use crate::types::{DeskError, Result};

const NOT_AVAILABLE: &str = "N/A";

// =============================================================================
// Customer Payload
// =============================================================================

/// Customer record pasted in by an agent, normalised to `{data:{payload}}`
/// or `{session:{payload}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerPayload(Value);

impl CustomerPayload {
    /// Parse agent input.
    ///
    /// Accepted shapes, in order: an object already carrying `data.payload`
    /// or `session.payload`; an API envelope `{success, data}` which is
    /// unwrapped to `data`; anything else is wrapped as `{data:{payload}}`.
    pub fn parse(text: &str) -> Result<Self> {
        let parsed: Value = serde_json::from_str(text)
            .map_err(|e| DeskError::validation(format!("Invalid JSON: {}", e)))?;
        Ok(Self::from_value(parsed))
    }

    pub fn from_value(parsed: Value) -> Self {
        if has_payload(&parsed, "data") || has_payload(&parsed, "session") {
            return Self(parsed);
        }

        if parsed.get("success").is_some()
            && let Some(data) = parsed.get("data").filter(|d| is_truthy(d))
        {
            return Self(data.clone());
        }

        Self(json!({ "data": { "payload": parsed } }))
    }

    /// The inner customer fields: `data.payload`, else `session.payload`
    pub fn inner(&self) -> Map<String, Value> {
        ["data", "session"]
            .iter()
            .filter_map(|outer| self.0.get(*outer)?.get("payload"))
            .find(|p| is_truthy(p))
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default()
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

/// Free-function form of [`CustomerPayload::parse`]
pub fn parse_payload(text: &str) -> Result<CustomerPayload> {
    CustomerPayload::parse(text)
}

fn has_payload(value: &Value, outer: &str) -> bool {
    value
        .get(outer)
        .and_then(|o| o.get("payload"))
        .is_some_and(is_truthy)
}

/// Loose truthiness used by the web client when picking fallbacks
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

// =============================================================================
// Layered Context
// =============================================================================

/// Context pushed to the backend, built from explicit layers.
///
/// Precedence, lowest first: customer payload, kustomer overrides, ring
/// debug overrides, ring battery overrides.
#[derive(Debug, Clone, Copy)]
pub struct ContextLayers<'a> {
    pub payload: Option<&'a CustomerPayload>,
    pub overrides: &'a Overrides,
}

impl<'a> ContextLayers<'a> {
    pub fn new(payload: Option<&'a CustomerPayload>, overrides: &'a Overrides) -> Self {
        Self { payload, overrides }
    }

    /// Whether anything should be pushed to the backend
    pub fn should_sync(&self) -> bool {
        self.overrides.overrides_enabled && (self.payload.is_some() || !self.overrides.is_empty())
    }

    pub fn merge(&self) -> Map<String, Value> {
        let mut merged = self.payload.map(CustomerPayload::inner).unwrap_or_default();
        for layer in [
            &self.overrides.kustomer_overrides,
            &self.overrides.ring_debug_overrides,
            &self.overrides.ring_battery_overrides,
        ] {
            for (key, value) in layer {
                merged.insert(key.clone(), value.clone());
            }
        }
        merged
    }
}

/// Customer fields as shown to the agent: payload plus kustomer overrides
/// when overrides are enabled.
pub fn effective_data(payload: Option<&CustomerPayload>, overrides: &Overrides) -> Map<String, Value> {
    let mut base = payload.map(CustomerPayload::inner).unwrap_or_default();
    if overrides.overrides_enabled {
        for (key, value) in &overrides.kustomer_overrides {
            base.insert(key.clone(), value.clone());
        }
    }
    base
}

// =============================================================================
// Ring Status
// =============================================================================

/// Live ring telemetry from `GET /api/ring/status`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RingStatus {
    pub battery_ts_sessions: Option<String>,
    pub ring_serial_number: Option<String>,
    pub battery_health_score: Option<String>,
    pub soft_reset: Option<String>,
    pub factory_reset: Option<String>,
    pub latest_firmware_available: Option<String>,
    pub ring_firmware_version: Option<String>,
    pub current_battery_level: Option<String>,
    pub connected: Option<bool>,
    pub last_updated: Option<String>,
}

impl RingStatus {
    /// Extract from the `{ok, data}` envelope; anything else is no status
    pub fn from_envelope(value: &Value) -> Option<Self> {
        if !value.get("ok").is_some_and(is_truthy) {
            return None;
        }
        let data = value.get("data").filter(|d| is_truthy(d))?;
        serde_json::from_value(data.clone()).ok()
    }
}

/// Flattened status panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayStatus {
    pub battery_ts_sessions: String,
    pub ring_serial_number: String,
    pub battery_health_score: String,
    pub soft_reset: String,
    pub factory_reset: String,
    pub latest_firmware_available: String,
    pub ring_firmware_version: String,
    pub current_battery_level: String,
    pub connected: bool,
    pub last_updated: String,
    pub device_model: String,
    pub device_os: String,
    pub app_version: String,
    pub avg_wear_time: String,
    pub warranty_expiry: String,
    pub days_until_warranty_expiry: String,
    pub policy_status: String,
    pub replacement_eligible: String,
    pub replacement_count: String,
    pub max_replacements: String,
    pub order_status: String,
    pub order_id: String,
    pub user_name: String,
    pub user_email: String,
}

impl DisplayStatus {
    /// Combine customer fields with live status; payload wins, then the
    /// ring status, then `N/A`.
    pub fn compose(effective: &Map<String, Value>, ring: Option<&RingStatus>) -> Self {
        let payload = |key: &str| effective.get(key).and_then(display_text);
        let either = |key: &str, api: Option<&Option<String>>| {
            payload(key)
                .or_else(|| api.and_then(|v| v.clone()).filter(|s| !s.is_empty()))
                .unwrap_or_else(|| NOT_AVAILABLE.to_string())
        };
        let only = |key: &str| payload(key).unwrap_or_else(|| NOT_AVAILABLE.to_string());

        Self {
            battery_ts_sessions: either(
                "batteryTsSessionsStr",
                ring.map(|r| &r.battery_ts_sessions),
            ),
            ring_serial_number: either(
                "ringSerialNumberStr",
                ring.map(|r| &r.ring_serial_number),
            ),
            battery_health_score: either(
                "batteryHealthScoreStr",
                ring.map(|r| &r.battery_health_score),
            ),
            soft_reset: either("softResetStr", ring.map(|r| &r.soft_reset)),
            factory_reset: either("factoryResetStr", ring.map(|r| &r.factory_reset)),
            latest_firmware_available: either(
                "latestFirmwareAvailableForUserStr",
                ring.map(|r| &r.latest_firmware_available),
            ),
            ring_firmware_version: either(
                "ringFirmwareVersionStr",
                ring.map(|r| &r.ring_firmware_version),
            ),
            current_battery_level: either(
                "currentBatteryLevelStr",
                ring.map(|r| &r.current_battery_level),
            ),
            connected: ring.and_then(|r| r.connected).unwrap_or(true),
            last_updated: ring
                .and_then(|r| r.last_updated.clone())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| chrono::Utc::now().to_rfc3339()),
            device_model: only("deviceModelStr"),
            device_os: only("deviceOsStr"),
            app_version: only("appVersionStr"),
            avg_wear_time: only("avgWearTimeStr"),
            warranty_expiry: only("warrantyExpiryDateStr"),
            days_until_warranty_expiry: only("daysUntilWarrantyExpiryStr"),
            policy_status: only("policyStatusStr"),
            replacement_eligible: only("replacementEligibleStr"),
            replacement_count: only("replacementCountStr"),
            max_replacements: only("maxReplacementsStr"),
            order_status: only("latestOrderStatusStr"),
            order_id: only("latestOrderIdStr"),
            user_name: only("nameStr"),
            user_email: payload("emailIdStr")
                .or_else(|| payload("userEmail"))
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        }
    }

    /// Label/value pairs in panel order
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Ring serial", self.ring_serial_number.clone()),
            ("Firmware", self.ring_firmware_version.clone()),
            ("Latest firmware", self.latest_firmware_available.clone()),
            ("Battery level", self.current_battery_level.clone()),
            ("Battery health", self.battery_health_score.clone()),
            ("Battery TS sessions", self.battery_ts_sessions.clone()),
            ("Soft reset", self.soft_reset.clone()),
            ("Factory reset", self.factory_reset.clone()),
            ("Connected", self.connected.to_string()),
            ("Last updated", self.last_updated.clone()),
            ("Device", self.device_model.clone()),
            ("Device OS", self.device_os.clone()),
            ("App version", self.app_version.clone()),
            ("Avg wear time", self.avg_wear_time.clone()),
            ("Warranty expiry", self.warranty_expiry.clone()),
            ("Days until expiry", self.days_until_warranty_expiry.clone()),
            ("Policy status", self.policy_status.clone()),
            ("Replacement eligible", self.replacement_eligible.clone()),
            ("Replacements", self.replacement_count.clone()),
            ("Max replacements", self.max_replacements.clone()),
            ("Order status", self.order_status.clone()),
            ("Order id", self.order_id.clone()),
            ("Name", self.user_name.clone()),
            ("Email", self.user_email.clone()),
        ]
    }
}

/// Render a payload value as panel text; falsy values count as missing
fn display_text(value: &Value) -> Option<String> {
    if !is_truthy(value) {
        return None;
    }
    match value {
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
