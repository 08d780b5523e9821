//! Configuration management with validation and defaults
//!
//! Values come from an optional TOML file, then `CROWNWYNN_*` environment
//! overrides, then validation.

use crate::errors::{ConfigurationError, CrownwynnResult};
use crate::games::{keno::KenoPaytable, mines::MinesPayoutCurve, types::Amount};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Top-level service configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CasinoConfig {
    pub api: ApiSettings,
    pub mines: MinesConfig,
    pub keno: KenoConfig,
    pub bets: BetLimits,
    pub players: PlayerConfig,
}

/// HTTP listener settings
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiSettings {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub request_timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            allowed_origins: vec!["*".to_string()],
            request_timeout_secs: 30,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MinesConfig {
    /// House edge in ten-thousandths of the multiplier (100 = 1%)
    pub house_edge_bp: u64,
}

impl Default for MinesConfig {
    fn default() -> Self {
        Self {
            house_edge_bp: MinesPayoutCurve::default().house_edge_bp,
        }
    }
}

impl MinesConfig {
    pub fn payout_curve(&self) -> MinesPayoutCurve {
        MinesPayoutCurve::new(self.house_edge_bp)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct KenoConfig {
    pub paytable: KenoPaytable,
}

/// Accepted bet range
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BetLimits {
    pub min_bet: Amount,
    pub max_bet: Amount,
}

impl Default for BetLimits {
    fn default() -> Self {
        Self {
            min_bet: Amount::from_minor_units(1),
            max_bet: Amount::from_minor_units(999_999_999_999),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlayerConfig {
    /// Balance credited to a player the first time they are seen
    pub starting_balance: Amount,
    /// Completed games kept per player
    pub history_limit: usize,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            starting_balance: Amount::from_minor_units(100_000),
            history_limit: 100,
        }
    }
}

/// Configuration loader with environment variable support
#[derive(Default)]
pub struct ConfigLoader {
    config_path: Option<String>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Set the configuration file path
    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_string_lossy().to_string());
        self
    }

    /// Load configuration from file and environment variables
    pub fn load(&self) -> CrownwynnResult<CasinoConfig> {
        let mut config = match &self.config_path {
            Some(path) => Self::load_from_file(path)?,
            None => CasinoConfig::default(),
        };

        Self::apply_env_overrides(&mut config)?;
        validate(&config)?;

        Ok(config)
    }

    fn load_from_file(path: &str) -> CrownwynnResult<CasinoConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigurationError::LoadFailed(format!("Failed to read {}: {}", path, e)))?;

        toml::from_str(&content)
            .map_err(|e| ConfigurationError::LoadFailed(format!("Failed to parse TOML: {}", e)).into())
    }

    fn apply_env_overrides(config: &mut CasinoConfig) -> CrownwynnResult<()> {
        if let Ok(host) = env::var("CROWNWYNN_API_HOST") {
            config.api.host = host;
        }
        if let Ok(port) = env::var("CROWNWYNN_API_PORT") {
            config.api.port = parse_env("CROWNWYNN_API_PORT", port, "Invalid port number")?;
        }
        if let Ok(edge) = env::var("CROWNWYNN_HOUSE_EDGE_BP") {
            config.mines.house_edge_bp = parse_env("CROWNWYNN_HOUSE_EDGE_BP", edge, "Invalid basis points")?;
        }
        if let Ok(balance) = env::var("CROWNWYNN_STARTING_BALANCE") {
            let value: f64 = parse_env("CROWNWYNN_STARTING_BALANCE", balance.clone(), "Invalid amount")?;
            config.players.starting_balance =
                Amount::from_decimal(value).map_err(|reason| ConfigurationError::InvalidValue {
                    field: "CROWNWYNN_STARTING_BALANCE".to_string(),
                    value: balance,
                    reason,
                })?;
        }

        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(field: &str, value: String, reason: &str) -> CrownwynnResult<T> {
    value.parse().map_err(|_| {
        ConfigurationError::InvalidValue {
            field: field.to_string(),
            value,
            reason: reason.to_string(),
        }
        .into()
    })
}

/// Validate configuration values
pub fn validate(config: &CasinoConfig) -> CrownwynnResult<()> {
    if config.api.port == 0 {
        return Err(ConfigurationError::InvalidValue {
            field: "api.port".to_string(),
            value: "0".to_string(),
            reason: "Port cannot be zero".to_string(),
        }
        .into());
    }

    if config.mines.house_edge_bp >= crate::games::types::Multiplier::SCALE {
        return Err(ConfigurationError::InvalidValue {
            field: "mines.house_edge_bp".to_string(),
            value: config.mines.house_edge_bp.to_string(),
            reason: "House edge must be below 10000 (100%)".to_string(),
        }
        .into());
    }

    if config.bets.min_bet == Amount::ZERO || config.bets.min_bet > config.bets.max_bet {
        return Err(ConfigurationError::ValidationFailed(format!(
            "Bet limits must satisfy 0 < min_bet ({}) <= max_bet ({})",
            config.bets.min_bet, config.bets.max_bet
        ))
        .into());
    }

    if config.players.history_limit == 0 {
        return Err(ConfigurationError::InvalidValue {
            field: "players.history_limit".to_string(),
            value: "0".to_string(),
            reason: "History limit cannot be zero".to_string(),
        }
        .into());
    }

    config.keno.paytable.validate()?;
    Ok(())
}
