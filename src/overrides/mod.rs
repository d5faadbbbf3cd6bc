//! Support Overrides
//!
//! Overrides are values a support agent sets by hand so that they win over
//! the same key coming from the customer payload. They are grouped in three
//! sections and can be switched off as a whole.
//!
//! ## Modules
//!
//! - `catalog`: known override keys with descriptions and examples
//! - `layers`: customer payload parsing, layered context merge, display status

pub mod catalog;
pub mod layers;

pub use catalog::{KUSTOMER_KEYS, KeyInfo, RING_BATTERY_KEYS, RING_DEBUG_KEYS, filter_kustomer_keys};
pub use layers::{
    ContextLayers, CustomerPayload, DisplayStatus, RingStatus, effective_data, parse_payload,
};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{DeskError, Result};

/// Override section a key belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverrideSection {
    /// Ring debug info (reset state and dates)
    Debug,
    /// Ring battery info (BDR, chill mode)
    Battery,
    /// Customer-record fields (`*Str` keys)
    Kustomer,
}

impl std::fmt::Display for OverrideSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverrideSection::Debug => write!(f, "debug"),
            OverrideSection::Battery => write!(f, "battery"),
            OverrideSection::Kustomer => write!(f, "kustomer"),
        }
    }
}

impl std::str::FromStr for OverrideSection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(OverrideSection::Debug),
            "battery" => Ok(OverrideSection::Battery),
            "kustomer" | "customer" => Ok(OverrideSection::Kustomer),
            _ => Err(format!(
                "Unknown override section: {}. Valid values: debug, battery, kustomer",
                s
            )),
        }
    }
}

/// All override sections plus the global switch.
///
/// Every editing operation returns a new value; callers replace their copy
/// wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Overrides {
    #[serde(default)]
    pub ring_debug_overrides: Map<String, Value>,
    #[serde(default)]
    pub ring_battery_overrides: Map<String, Value>,
    #[serde(default)]
    pub kustomer_overrides: Map<String, Value>,
    #[serde(default = "default_enabled")]
    pub overrides_enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl Default for Overrides {
    fn default() -> Self {
        Self {
            ring_debug_overrides: Map::new(),
            ring_battery_overrides: Map::new(),
            kustomer_overrides: Map::new(),
            overrides_enabled: true,
        }
    }
}

impl Overrides {
    /// JSON form of the empty default, used when the backend has nothing
    pub fn default_json() -> Value {
        serde_json::to_value(Self::default()).unwrap_or(Value::Null)
    }

    pub fn section(&self, section: OverrideSection) -> &Map<String, Value> {
        match section {
            OverrideSection::Debug => &self.ring_debug_overrides,
            OverrideSection::Battery => &self.ring_battery_overrides,
            OverrideSection::Kustomer => &self.kustomer_overrides,
        }
    }

    fn with_section(&self, section: OverrideSection, map: Map<String, Value>) -> Self {
        let mut next = self.clone();
        match section {
            OverrideSection::Debug => next.ring_debug_overrides = map,
            OverrideSection::Battery => next.ring_battery_overrides = map,
            OverrideSection::Kustomer => next.kustomer_overrides = map,
        }
        next
    }

    pub fn set(&self, section: OverrideSection, key: impl Into<String>, value: Value) -> Self {
        let mut map = self.section(section).clone();
        map.insert(key.into(), value);
        self.with_section(section, map)
    }

    pub fn clear(&self, section: OverrideSection, key: &str) -> Self {
        let mut map = self.section(section).clone();
        map.remove(key);
        self.with_section(section, map)
    }

    pub fn clear_all(&self, section: OverrideSection) -> Self {
        self.with_section(section, Map::new())
    }

    pub fn with_enabled(&self, enabled: bool) -> Self {
        Self {
            overrides_enabled: enabled,
            ..self.clone()
        }
    }

    /// Number of active override keys across all sections
    pub fn count(&self) -> usize {
        self.ring_debug_overrides.len()
            + self.ring_battery_overrides.len()
            + self.kustomer_overrides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }
}

/// Parse a CLI-supplied override value.
///
/// JSON literals (`true`, `4.5`, `"x"`, objects) are taken as JSON; anything
/// else becomes a plain string.
pub fn parse_override_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Decode an overrides document, rejecting anything that isn't an object
pub fn overrides_from_value(value: Value) -> Result<Overrides> {
    if !value.is_object() {
        return Err(DeskError::validation("Overrides must be a JSON object"));
    }
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_json_shape() {
        assert_eq!(
            Overrides::default_json(),
            json!({
                "ringDebugOverrides": {},
                "ringBatteryOverrides": {},
                "kustomerOverrides": {},
                "overridesEnabled": true
            })
        );
    }

    #[test]
    fn test_set_and_clear_return_new_values() {
        let base = Overrides::default();
        let one = base.set(OverrideSection::Battery, "chill_mode_active", json!(true));
        assert!(base.is_empty());
        assert_eq!(one.count(), 1);
        assert_eq!(one.ring_battery_overrides["chill_mode_active"], json!(true));

        let two = one.set(OverrideSection::Kustomer, "nameStr", json!("Asha"));
        assert_eq!(two.count(), 2);

        let cleared = two.clear(OverrideSection::Kustomer, "nameStr");
        assert_eq!(cleared.count(), 1);
        assert_eq!(two.clear_all(OverrideSection::Battery).count(), 1);
    }

    #[test]
    fn test_section_from_str() {
        assert_eq!("Debug".parse::<OverrideSection>(), Ok(OverrideSection::Debug));
        assert_eq!(
            "customer".parse::<OverrideSection>(),
            Ok(OverrideSection::Kustomer)
        );
        assert!("ring".parse::<OverrideSection>().is_err());
    }

    #[test]
    fn test_parse_override_value() {
        assert_eq!(parse_override_value("true"), json!(true));
        assert_eq!(parse_override_value("4.5"), json!(4.5));
        assert_eq!(parse_override_value("85%"), json!("85%"));
    }

    #[test]
    fn test_overrides_from_value() {
        let parsed = overrides_from_value(json!({"kustomerOverrides": {"nameStr": "A"}})).unwrap();
        assert!(parsed.overrides_enabled);
        assert_eq!(parsed.count(), 1);
        assert!(overrides_from_value(json!([1, 2])).is_err());
    }
}
