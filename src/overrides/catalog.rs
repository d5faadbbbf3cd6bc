//! Known override keys.

/// Description of one overridable key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInfo {
    pub key: &'static str,
    pub desc: &'static str,
    pub example: &'static str,
}

const fn info(key: &'static str, desc: &'static str, example: &'static str) -> KeyInfo {
    KeyInfo { key, desc, example }
}

pub const RING_DEBUG_KEYS: &[KeyInfo] = &[
    info("soft_reset_done", "Soft reset done status", "true/false"),
    info("hard_reset_done", "Hard reset done status", "true/false"),
    info("soft_reset_date", "Soft reset date", "January 15, 2026 14:30"),
    info("hard_reset_date", "Hard reset date", "January 15, 2026 14:30"),
];

pub const RING_BATTERY_KEYS: &[KeyInfo] = &[
    info("battery_life_at_current_bdr", "Battery life in days at current BDR", "4.5"),
    info("last_48_hours_bdr_chill_mode", "Battery life with chill mode (48hrs)", "5.2"),
    info("chill_mode_active", "Chill/passive mode active", "true/false"),
    info("chill_mode_last_activated_at", "Chill mode activated timestamp", "2026-01-15T14:30:00Z"),
    info("cdt_events_count_last_3_days", "CDT events (workouts) in 3 days", "5"),
];

pub const KUSTOMER_KEYS: &[KeyInfo] = &[
    info("ringSerialNumberStr", "Ring serial number", "RA-CH2-DTF-WB-AG10-123456"),
    info("ringDescriptionStr", "Ring details", "Size: 8, Color: Matte Grey"),
    info("deviceModelStr", "Device model", "iPhone 14 Pro"),
    info("deviceOsStr", "Device OS", "iOS 17.0"),
    info("ringFirmwareVersionStr", "Ring firmware version", "1.2.3"),
    info("uhXUserStr", "UHX subscription status", "true"),
    info("vipUserStr", "VIP user status", "false"),
    info("latestAvailableAppVersionStr", "Latest app version available", "3.5.0"),
    info("dataSharingStr", "Coach data sharing consent", "true"),
    info("m1First24HrsStr", "M1 CGM in warmup phase", "False"),
    info("ringConnectedLast24HrsStr", "Ring connected in last 24 hrs", "True"),
    info("noOfDaysSinceRingActivationStr", "Days since ring activation", "45"),
    info("lastRingStatesTimestampStr", "Last ring states timestamp", "January 15, 2026 14:30"),
    info("softResetStr", "Last soft reset date", "January 15, 2026 14:30"),
    info("factoryResetStr", "Last factory reset date", "January 15, 2026 14:30"),
    info("last100ChargedStr", "Last time at 100%", "January 15, 2026 14:30"),
    info("appVersionStr", "Current app version", "iOS 3.4.2"),
    info("batteryTsSessionsStr", "Battery TS sessions", "Completed at January 15, 2026"),
    info("latestFirmwareAvailableForUserStr", "Latest firmware available", "1.3.0"),
    info("policyStatusStr", "Replacement policy status", "Within Policy"),
    info("ringState10Str", "Ring state 10 detected", "false"),
    info("faultyHrStr", "Faulty HR sensor detected", "false"),
    info("uhxPlanNameStr", "UHX plan name", "1yr (new)"),
    info("uhxExpiryStr", "UHX expiry date", "January 15, 2027"),
    info("uhxCountryStr", "UHX subscription country", "IN"),
    info("bdrTriggeredStr", "BDR triggered/in progress", "true"),
    info("bdrCompletedStr", "BDR completed", "false"),
    info("bdrValueStr", "BDR trend", "improving"),
    info("daysSinceBdrStr", "Days since BDR started", "5"),
    info("bdrTimeLeftStr", "BDR time remaining", "2d 5h 30m"),
    info("currentBatteryLevelStr", "Current battery level", "85%"),
    info("avgWearTimeStr", "Average wear time", "18 hrs/day"),
    info("batteryHealthScoreStr", "Battery health score", "Good"),
    info("replacementEligibleStr", "Replacement eligible", "true"),
    info("replacementCountStr", "Number of replacements", "1"),
    info("maxReplacementsStr", "Max replacements allowed", "3"),
    info("warrantyExpiryDateStr", "Warranty expiry date", "January 15, 2027"),
    info("daysUntilWarrantyExpiryStr", "Days until warranty expires", "180"),
    info("wabiSabiReplacementCountStr", "Wabi Sabi replacements", "1 / 3"),
    info("latestOrderIdStr", "Latest order ID", "ORD-123456"),
    info("latestOrderStatusStr", "Order status", "Shipped"),
    info("trackingUrlStr", "Tracking URL", "https://track.example.com/..."),
    info("orderSourceStr", "Order source", "shopify"),
    info("orderDateStr", "Order date", "January 15, 2026"),
    info("shippingAddressStr", "Shipping address", "123 Main St, City"),
    info("shippingCountryStr", "Shipping country", "India"),
    info("emailIdStr", "User email", "user@email.com"),
    info("nameStr", "User name", "John Doe"),
];

/// Customer keys whose name or description contains `query` (case-insensitive).
/// An empty query returns every key.
pub fn filter_kustomer_keys(query: &str) -> Vec<&'static KeyInfo> {
    let needle = query.to_lowercase();
    KUSTOMER_KEYS
        .iter()
        .filter(|item| {
            needle.is_empty()
                || item.key.to_lowercase().contains(&needle)
                || item.desc.to_lowercase().contains(&needle)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_by_key_and_description() {
        let by_key = filter_kustomer_keys("bdr");
        assert!(by_key.iter().any(|k| k.key == "bdrTriggeredStr"));
        assert!(by_key.iter().all(|k| {
            k.key.to_lowercase().contains("bdr") || k.desc.to_lowercase().contains("bdr")
        }));

        let by_desc = filter_kustomer_keys("WARRANTY");
        assert_eq!(by_desc.len(), 2);
    }

    #[test]
    fn test_empty_query_returns_all() {
        assert_eq!(filter_kustomer_keys("").len(), KUSTOMER_KEYS.len());
    }

    #[test]
    fn test_catalog_keys_unique() {
        let mut keys: Vec<_> = KUSTOMER_KEYS.iter().map(|k| k.key).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), KUSTOMER_KEYS.len());
    }
}
