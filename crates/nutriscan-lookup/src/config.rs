//! # Scanner Configuration
//!
//! Configuration management for the lookup layer and the scan gate.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     NUTRISCAN_API_URL=http://localhost:8080                            │
//! │     NUTRISCAN_COOLDOWN_MS=1500                                         │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/scanner/scanner.toml (Linux)                             │
//! │     ~/Library/Application Support/com.nutriscan.scanner/scanner.toml   │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     Open Food Facts world instance, 10s timeout, 6 chars / 1200 ms     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # scanner.toml
//! [lookup]
//! base_url = "https://world.openfoodfacts.org"
//! timeout_secs = 10
//! user_agent = "NutriScan/0.1 (https://github.com/nutriscan/nutriscan)"
//!
//! [gate]
//! min_payload_len = 6
//! cooldown_ms = 1200
//!
//! [feedback]
//! haptics = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use nutriscan_core::validation::validate_cooldown_ms;
use nutriscan_core::{GatePolicy, MIN_PAYLOAD_LEN, SCAN_COOLDOWN_MS};

use crate::error::{LookupError, LookupResult};
use crate::resolver::ResolverConfig;

/// Public Open Food Facts instance.
pub const DEFAULT_BASE_URL: &str = "https://world.openfoodfacts.org";

/// User agent sent with every product request.
pub const DEFAULT_USER_AGENT: &str = concat!(
    "NutriScan/",
    env!("CARGO_PKG_VERSION"),
    " (https://github.com/nutriscan/nutriscan)"
);

// =============================================================================
// Lookup Settings
// =============================================================================

/// Product database connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupSettings {
    /// Root URL of the product database.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Whole-request timeout (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// `User-Agent` header value. Open Food Facts asks clients to identify
    /// themselves.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

impl Default for LookupSettings {
    fn default() -> Self {
        LookupSettings {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

// =============================================================================
// Gate Settings
// =============================================================================

/// Scan gate policy as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateSettings {
    /// Minimum payload length in characters.
    #[serde(default = "default_min_payload_len")]
    pub min_payload_len: usize,

    /// Minimum interval between accepted scans (milliseconds).
    #[serde(default = "default_cooldown")]
    pub cooldown_ms: u64,
}

fn default_min_payload_len() -> usize {
    MIN_PAYLOAD_LEN
}

fn default_cooldown() -> u64 {
    SCAN_COOLDOWN_MS
}

impl Default for GateSettings {
    fn default() -> Self {
        GateSettings {
            min_payload_len: default_min_payload_len(),
            cooldown_ms: default_cooldown(),
        }
    }
}

// =============================================================================
// Feedback Settings
// =============================================================================

/// User feedback on acceptance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackSettings {
    /// Pulse haptics when a scan is accepted.
    #[serde(default = "default_true")]
    pub haptics: bool,
}

fn default_true() -> bool {
    true
}

impl Default for FeedbackSettings {
    fn default() -> Self {
        FeedbackSettings { haptics: true }
    }
}

// =============================================================================
// Main Scanner Configuration
// =============================================================================

/// Complete scanner configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Product database settings.
    #[serde(default)]
    pub lookup: LookupSettings,

    /// Scan gate policy.
    #[serde(default)]
    pub gate: GateSettings,

    /// Acceptance feedback.
    #[serde(default)]
    pub feedback: FeedbackSettings,
}

impl ScannerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (scanner.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> LookupResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading scanner config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = Self::from_toml(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load scanner config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Parses a config document. Missing sections fall back to defaults.
    pub fn from_toml(contents: &str) -> LookupResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> LookupResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| LookupError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| LookupError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| LookupError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Scanner config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> LookupResult<()> {
        let base_url = &self.lookup.base_url;
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(LookupError::InvalidUrl(format!(
                "Product database URL must start with http:// or https://, got: {}",
                base_url
            )));
        }
        Url::parse(base_url)?;

        if self.lookup.timeout_secs == 0 {
            return Err(LookupError::InvalidConfig(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if self.lookup.user_agent.trim().is_empty() {
            return Err(LookupError::InvalidConfig(
                "user_agent must not be empty".into(),
            ));
        }

        validate_cooldown_ms(self.gate.cooldown_ms)
            .map_err(|e| LookupError::InvalidConfig(e.to_string()))?;
        self.gate_policy()?;

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("NUTRISCAN_API_URL") {
            debug!(url = %url, "Overriding product database URL from environment");
            self.lookup.base_url = url;
        }

        if let Ok(timeout) = std::env::var("NUTRISCAN_TIMEOUT_SECS") {
            match timeout.parse::<u64>() {
                Ok(t) => self.lookup.timeout_secs = t,
                Err(_) => warn!(value = %timeout, "Ignoring non-numeric NUTRISCAN_TIMEOUT_SECS"),
            }
        }

        if let Ok(agent) = std::env::var("NUTRISCAN_USER_AGENT") {
            self.lookup.user_agent = agent;
        }

        if let Ok(len) = std::env::var("NUTRISCAN_MIN_PAYLOAD_LEN") {
            if let Ok(l) = len.parse::<usize>() {
                self.gate.min_payload_len = l;
            }
        }

        if let Ok(cooldown) = std::env::var("NUTRISCAN_COOLDOWN_MS") {
            match cooldown.parse::<u64>() {
                Ok(ms) => {
                    debug!(cooldown_ms = ms, "Overriding scan cooldown from environment");
                    self.gate.cooldown_ms = ms;
                }
                Err(_) => warn!(value = %cooldown, "Ignoring non-numeric NUTRISCAN_COOLDOWN_MS"),
            }
        }

        if let Ok(haptics) = std::env::var("NUTRISCAN_HAPTICS") {
            match haptics.to_lowercase().as_str() {
                "1" | "true" | "on" | "yes" => self.feedback.haptics = true,
                "0" | "false" | "off" | "no" => self.feedback.haptics = false,
                _ => warn!(value = %haptics, "Unknown NUTRISCAN_HAPTICS value"),
            }
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "nutriscan", "scanner")
            .map(|dirs| dirs.config_dir().join("scanner.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Builds the validated gate policy.
    pub fn gate_policy(&self) -> LookupResult<GatePolicy> {
        Ok(GatePolicy::new(
            self.gate.min_payload_len,
            Duration::from_millis(self.gate.cooldown_ms),
        )?)
    }

    /// Returns the resolver settings.
    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            base_url: self.lookup.base_url.clone(),
            timeout: Duration::from_secs(self.lookup.timeout_secs),
            user_agent: self.lookup.user_agent.clone(),
        }
    }

    /// Returns true if haptic feedback is enabled.
    pub fn haptics_enabled(&self) -> bool {
        self.feedback.haptics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ScannerConfig::default();
        assert_eq!(config.lookup.base_url, "https://world.openfoodfacts.org");
        assert_eq!(config.lookup.timeout_secs, 10);
        assert!(config.lookup.user_agent.starts_with("NutriScan/"));
        assert_eq!(config.gate.min_payload_len, 6);
        assert_eq!(config.gate.cooldown_ms, 1200);
        assert!(config.haptics_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ScannerConfig::from_toml(
            r#"
            [lookup]
            base_url = "http://localhost:8080"

            [gate]
            cooldown_ms = 2000
            "#,
        )
        .unwrap();

        assert_eq!(config.lookup.base_url, "http://localhost:8080");
        assert_eq!(config.lookup.timeout_secs, 10);
        assert_eq!(config.gate.cooldown_ms, 2000);
        assert_eq!(config.gate.min_payload_len, 6);
        assert!(config.feedback.haptics);
    }

    #[test]
    fn test_malformed_toml_is_load_error() {
        let err = ScannerConfig::from_toml("[gate\ncooldown_ms = ").unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ScannerConfig::default();

        config.lookup.base_url = "ftp://example.org".to_string();
        assert!(matches!(config.validate(), Err(LookupError::InvalidUrl(_))));

        config.lookup.base_url = "http://".to_string();
        assert!(config.validate().is_err());

        config.lookup.base_url = "http://localhost:9000".to_string();
        assert!(config.validate().is_ok());

        config.lookup.timeout_secs = 0;
        assert!(config.validate().is_err());
        config.lookup.timeout_secs = 5;

        config.lookup.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
        config.lookup.user_agent = DEFAULT_USER_AGENT.to_string();

        config.gate.min_payload_len = 0;
        assert!(config.validate().is_err());
        config.gate.min_payload_len = 6;

        // Twenty minutes is a typo for 1200 ms, not a real setting
        config.gate.cooldown_ms = 1_200_000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_gate_policy_and_resolver_config() {
        let config = ScannerConfig::default();

        let policy = config.gate_policy().unwrap();
        assert_eq!(policy.min_payload_len, 6);
        assert_eq!(policy.cooldown, Duration::from_millis(1200));

        let resolver = config.resolver_config();
        assert_eq!(resolver.base_url, DEFAULT_BASE_URL);
        assert_eq!(resolver.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = std::env::temp_dir().join(format!("nutriscan-config-{}", uuid::Uuid::new_v4()));
        let path = dir.join("scanner.toml");

        let mut config = ScannerConfig::default();
        config.gate.cooldown_ms = 900;
        config.feedback.haptics = false;
        config.save(Some(path.clone())).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("[lookup]"));
        assert!(contents.contains("[gate]"));

        let loaded = ScannerConfig::from_toml(&contents).unwrap();
        assert_eq!(loaded, config);

        std::fs::remove_dir_all(&dir).ok();
    }
}
