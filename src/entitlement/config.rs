//! Entitlement Configuration
//!
//! Plan caps and enforcement settings. Policy values are configuration,
//! not algorithm: every cap lives here as data so the numbers can change
//! without touching the engine.

use serde::{Deserialize, Serialize};

/// Default free-plan caps
pub const DEFAULT_FREE_OUTLINES_PER_DAY: u32 = 2;
pub const DEFAULT_FREE_TITLES_TOTAL: u32 = 1;
pub const DEFAULT_FREE_INTRODUCTIONS_TOTAL: u32 = 1;
pub const DEFAULT_FREE_EXPANSIONS_PER_DAY: u32 = 2;

/// Default capacity-plan caps (one paid book project)
pub const DEFAULT_CAPACITY_OUTLINES_TOTAL: u32 = 10;
pub const DEFAULT_CAPACITY_TITLES_TOTAL: u32 = 10;
pub const DEFAULT_CAPACITY_INTRODUCTIONS_TOTAL: u32 = 5;
pub const DEFAULT_CAPACITY_EXPANSIONS_TOTAL: u32 = 40;

/// Default bound on each normalized project attribute fed to the fingerprint
pub const DEFAULT_FINGERPRINT_MAX_LEN: usize = 500;

/// Entitlement engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntitlementConfig {
    /// Enable cap enforcement
    pub enabled: bool,

    /// Free plan: outlines per UTC day
    pub free_outlines_per_day: u32,

    /// Free plan: title generations, lifetime total
    pub free_titles_total: u32,

    /// Free plan: introduction generations, lifetime total
    pub free_introductions_total: u32,

    /// Free plan: chapter expansions per UTC day
    pub free_expansions_per_day: u32,

    /// Capacity plan: outlines, total for the project
    pub capacity_outlines_total: u32,

    /// Capacity plan: title generations, total for the project
    pub capacity_titles_total: u32,

    /// Capacity plan: introduction generations, total for the project
    pub capacity_introductions_total: u32,

    /// Capacity plan: chapter expansions, total for the project
    pub capacity_expansions_total: u32,

    /// Characters of each normalized project attribute that feed the
    /// project fingerprint
    pub fingerprint_max_len: usize,
}

impl Default for EntitlementConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            free_outlines_per_day: DEFAULT_FREE_OUTLINES_PER_DAY,
            free_titles_total: DEFAULT_FREE_TITLES_TOTAL,
            free_introductions_total: DEFAULT_FREE_INTRODUCTIONS_TOTAL,
            free_expansions_per_day: DEFAULT_FREE_EXPANSIONS_PER_DAY,
            capacity_outlines_total: DEFAULT_CAPACITY_OUTLINES_TOTAL,
            capacity_titles_total: DEFAULT_CAPACITY_TITLES_TOTAL,
            capacity_introductions_total: DEFAULT_CAPACITY_INTRODUCTIONS_TOTAL,
            capacity_expansions_total: DEFAULT_CAPACITY_EXPANSIONS_TOTAL,
            fingerprint_max_len: DEFAULT_FINGERPRINT_MAX_LEN,
        }
    }
}

impl EntitlementConfig {
    /// Create a new configuration with default caps
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("AUTHORED_ENTITLEMENTS_ENABLED") {
            config.enabled = val.parse().unwrap_or(true);
        }

        if let Ok(val) = std::env::var("AUTHORED_FREE_OUTLINES_PER_DAY") {
            if let Ok(cap) = val.parse() {
                config.free_outlines_per_day = cap;
            }
        }

        if let Ok(val) = std::env::var("AUTHORED_FREE_TITLES_TOTAL") {
            if let Ok(cap) = val.parse() {
                config.free_titles_total = cap;
            }
        }

        if let Ok(val) = std::env::var("AUTHORED_FREE_INTRODUCTIONS_TOTAL") {
            if let Ok(cap) = val.parse() {
                config.free_introductions_total = cap;
            }
        }

        if let Ok(val) = std::env::var("AUTHORED_FREE_EXPANSIONS_PER_DAY") {
            if let Ok(cap) = val.parse() {
                config.free_expansions_per_day = cap;
            }
        }

        if let Ok(val) = std::env::var("AUTHORED_CAPACITY_OUTLINES_TOTAL") {
            if let Ok(cap) = val.parse() {
                config.capacity_outlines_total = cap;
            }
        }

        if let Ok(val) = std::env::var("AUTHORED_CAPACITY_TITLES_TOTAL") {
            if let Ok(cap) = val.parse() {
                config.capacity_titles_total = cap;
            }
        }

        if let Ok(val) = std::env::var("AUTHORED_CAPACITY_INTRODUCTIONS_TOTAL") {
            if let Ok(cap) = val.parse() {
                config.capacity_introductions_total = cap;
            }
        }

        if let Ok(val) = std::env::var("AUTHORED_CAPACITY_EXPANSIONS_TOTAL") {
            if let Ok(cap) = val.parse() {
                config.capacity_expansions_total = cap;
            }
        }

        config
    }

    /// Disable enforcement (for testing)
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EntitlementConfig::default();
        assert!(config.enabled);
        assert_eq!(config.free_expansions_per_day, DEFAULT_FREE_EXPANSIONS_PER_DAY);
        assert_eq!(config.capacity_expansions_total, DEFAULT_CAPACITY_EXPANSIONS_TOTAL);
    }

    #[test]
    fn test_disabled_config() {
        let config = EntitlementConfig::disabled();
        assert!(!config.enabled);
    }

    #[test]
    fn test_free_caps_smaller_than_capacity_caps() {
        let config = EntitlementConfig::default();
        assert!(config.free_titles_total < config.capacity_titles_total);
        assert!(config.free_introductions_total < config.capacity_introductions_total);
    }

    #[test]
    fn test_config_serialization() {
        let config = EntitlementConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: EntitlementConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, parsed);
    }
}
