//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the pipeline service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the response pipeline service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PipelineConfig {
    /// Listener configuration (bind address, body limit).
    pub listener: ListenerConfig,

    /// Admission control (throttling) settings.
    pub throttling: ThrottlingConfig,

    /// Endpoint statistics settings.
    pub statistics: StatisticsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin API settings.
    pub admin: AdminConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum inbound body size in bytes.
    pub max_body_size: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Admission control configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ThrottlingConfig {
    /// Enable admission control. When disabled every request is admitted
    /// and no rate-limit headers are emitted.
    pub enabled: bool,

    /// Requests allowed per period.
    pub limit: i64,

    /// Period length in milliseconds.
    pub period_ms: i64,

    /// Status code of the discard response.
    pub discard_status_code: u16,
}

impl Default for ThrottlingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            limit: 100,
            period_ms: 1_000,
            discard_status_code: 429,
        }
    }
}

/// Endpoint statistics configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StatisticsConfig {
    /// Endpoint name reported by the statistics read surface.
    pub name: String,

    /// Record statistics from startup.
    pub enabled: bool,
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            enabled: true,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_toml_uses_defaults() {
        let config: PipelineConfig = toml::from_str(
            r#"
            [throttling]
            enabled = true
            limit = 5
            "#,
        )
        .unwrap();

        assert!(config.throttling.enabled);
        assert_eq!(config.throttling.limit, 5);
        assert_eq!(config.throttling.period_ms, 1_000);
        assert_eq!(config.throttling.discard_status_code, 429);
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert!(config.statistics.enabled);
        assert!(!config.admin.enabled);
    }
}
