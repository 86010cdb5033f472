//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and URLs parse
//! - Validate value ranges (gas > 0, timeouts > 0)
//! - Keep the HTTP timeout longer than the worst-case submit
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BridgeConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use alloy::primitives::Address;

use crate::config::schema::BridgeConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a fully merged configuration.
pub fn validate_config(config: &BridgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be > 0"));
    }

    let chain = &config.chain;
    if chain.rpc_url.parse::<url::Url>().is_err() {
        errors.push(ValidationError::new(
            "chain.rpc_url",
            format!("'{}' is not a valid URL", chain.rpc_url),
        ));
    }
    for url in &chain.failover_urls {
        if url.parse::<url::Url>().is_err() {
            errors.push(ValidationError::new(
                "chain.failover_urls",
                format!("'{}' is not a valid URL", url),
            ));
        }
    }
    if chain.contract_address.parse::<Address>().is_err() {
        errors.push(ValidationError::new(
            "chain.contract_address",
            format!("'{}' is not a valid address", chain.contract_address),
        ));
    }
    if chain.abi_path.is_empty() {
        errors.push(ValidationError::new("chain.abi_path", "must not be empty"));
    }
    if chain.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("chain.rpc_timeout_secs", "must be > 0"));
    }
    if chain.submit_gas_limit == 0 {
        errors.push(ValidationError::new("chain.submit_gas_limit", "must be > 0"));
    }
    if chain.vote_gas_limit == 0 {
        errors.push(ValidationError::new("chain.vote_gas_limit", "must be > 0"));
    }
    if chain.gas_price_gwei == 0 {
        errors.push(ValidationError::new("chain.gas_price_gwei", "must be > 0"));
    }
    if chain.receipt_timeout_secs == 0 {
        errors.push(ValidationError::new("chain.receipt_timeout_secs", "must be > 0"));
    }
    if chain.receipt_poll_interval_ms == 0 {
        errors.push(ValidationError::new("chain.receipt_poll_interval_ms", "must be > 0"));
    }

    // The submit path must finish before the HTTP timeout cuts it off
    let submit_budget = submit_budget_secs(config);
    if config.timeouts.request_secs > 0 && config.timeouts.request_secs <= submit_budget {
        errors.push(ValidationError::new(
            "timeouts.request_secs",
            format!(
                "{} must exceed the worst-case submit time of {}s \
                 (receipt timeout plus nonce and send on every provider)",
                config.timeouts.request_secs, submit_budget
            ),
        ));
    }

    let obs = &config.observability;
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", obs.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Longest a submission can take: nonce fetch and broadcast, each possibly
/// timing out on every provider, then the receipt wait.
pub fn submit_budget_secs(config: &BridgeConfig) -> u64 {
    let chain = &config.chain;
    let providers = 1 + chain.failover_urls.len() as u64;
    chain
        .rpc_timeout_secs
        .saturating_mul(2)
        .saturating_mul(providers)
        .saturating_add(chain.receipt_timeout_secs)
}
