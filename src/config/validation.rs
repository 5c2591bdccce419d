//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (quota > 0, period > 0, status codes valid)
//! - Validate addresses parse before anything binds
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: PipelineConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::StatusCode;
use thiserror::Error;

use crate::config::schema::PipelineConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("throttling.limit must be positive, got {0}")]
    NonPositiveLimit(i64),

    #[error("throttling.period_ms must be positive, got {0}")]
    NonPositivePeriod(i64),

    #[error("throttling.discard_status_code {0} is not a valid HTTP status")]
    InvalidDiscardStatus(u16),

    #[error("listener.max_body_size must be positive")]
    ZeroBodyLimit,

    #[error("admin.api_key must not be empty when the admin API is enabled")]
    EmptyAdminKey,
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &PipelineConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.listener.max_body_size == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    let throttling = &config.throttling;
    if throttling.enabled {
        if throttling.limit <= 0 {
            errors.push(ValidationError::NonPositiveLimit(throttling.limit));
        }
        if throttling.period_ms <= 0 {
            errors.push(ValidationError::NonPositivePeriod(throttling.period_ms));
        }
    }
    if StatusCode::from_u16(throttling.discard_status_code).is_err() {
        errors.push(ValidationError::InvalidDiscardStatus(
            throttling.discard_status_code,
        ));
    }

    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if config.admin.enabled {
        check_address(&mut errors, "admin.bind_address", &config.admin.bind_address);
        if config.admin.api_key.is_empty() {
            errors.push(ValidationError::EmptyAdminKey);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}
