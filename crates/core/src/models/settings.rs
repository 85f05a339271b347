use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// Default freshness window for cached registry data (daily NAV cadence).
pub const DEFAULT_MAX_AGE_SECS: i64 = 24 * 60 * 60;

/// Freshness window for a single fund's detail view.
pub const DETAIL_MAX_AGE_SECS: i64 = 4 * 60 * 60;

/// Longest freshness window a cache entry can be given.
pub const MAX_CACHE_AGE_SECS: i64 = i64::MAX / 1000;

pub const DEFAULT_REGISTRY_BASE_URL: &str = "https://api.mfapi.in";

/// Engine configuration. Every field has a working default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub matcher: MatcherConfig,
    pub cache: CacheConfig,

    /// Base URL of the fund registry API.
    pub registry_base_url: String,

    /// HTTP timeout for registry requests, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            matcher: MatcherConfig::default(),
            cache: CacheConfig::default(),
            registry_base_url: DEFAULT_REGISTRY_BASE_URL.to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl Settings {
    /// Parse settings from JSON; missing fields fall back to their defaults.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        self.matcher.validate()?;
        self.cache.validate()
    }
}

/// Scoring weights and acceptance threshold for the fund matcher.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// A candidate must score strictly above this to be accepted.
    pub acceptance_threshold: f64,
    pub amc_weight: f64,
    pub token_weight: f64,
    pub plan_weight: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            acceptance_threshold: 0.7,
            amc_weight: 0.3,
            token_weight: 0.5,
            plan_weight: 0.2,
        }
    }
}

impl MatcherConfig {
    pub fn validate(&self) -> Result<(), CoreError> {
        let fields = [
            ("acceptance_threshold", self.acceptance_threshold),
            ("amc_weight", self.amc_weight),
            ("token_weight", self.token_weight),
            ("plan_weight", self.plan_weight),
        ];
        for (name, value) in fields {
            if !(0.0..=1.0).contains(&value) {
                return Err(CoreError::ValidationError(format!(
                    "Matcher {name} must be within [0, 1], got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Registry cache namespace and freshness windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Prefix applied to every key this cache writes.
    pub namespace: String,
    pub default_max_age_secs: i64,
    pub detail_max_age_secs: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            namespace: "fund_cache_".to_string(),
            default_max_age_secs: DEFAULT_MAX_AGE_SECS,
            detail_max_age_secs: DETAIL_MAX_AGE_SECS,
        }
    }
}

impl CacheConfig {
    pub fn validate(&self) -> Result<(), CoreError> {
        let windows = [
            ("default_max_age_secs", self.default_max_age_secs),
            ("detail_max_age_secs", self.detail_max_age_secs),
        ];
        for (name, secs) in windows {
            if !(0..=MAX_CACHE_AGE_SECS).contains(&secs) {
                return Err(CoreError::ValidationError(format!(
                    "Cache {name} must be within [0, {MAX_CACHE_AGE_SECS}], got {secs}"
                )));
            }
        }
        Ok(())
    }

    pub fn default_max_age(&self) -> Duration {
        window(self.default_max_age_secs)
    }

    pub fn detail_max_age(&self) -> Duration {
        window(self.detail_max_age_secs)
    }
}

// Clamped so an unvalidated config can never panic in chrono.
fn window(secs: i64) -> Duration {
    Duration::seconds(secs.clamp(0, MAX_CACHE_AGE_SECS))
}
