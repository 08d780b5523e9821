//! Error types for the Crownwynn game engine
//!
//! Core outcome functions only ever fail with [`ParameterError`]; the session
//! layer adds [`SessionError`] for balance and game-state violations.

use crate::games::types::Amount;
use thiserror::Error;

/// Root error type for all Crownwynn operations
#[derive(Debug, Error)]
pub enum CrownwynnError {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Invalid game parameters, rejected before any hashing happens
    #[error("Invalid parameter: {0}")]
    Parameter(#[from] ParameterError),

    /// Game session rule violations
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// The operating system could not supply secure randomness
    #[error("Secure randomness unavailable: {0}")]
    EntropyUnavailable(String),
}

/// Configuration and validation errors
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Failed to load configuration: {0}")]
    LoadFailed(String),
}

/// Out-of-range inputs to the outcome engines
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParameterError {
    #[error("mine count must be between 1 and 24, got {0}")]
    MineCount(u8),

    #[error("tile position must be between 0 and 24, got {0}")]
    TilePosition(u8),

    #[error("{revealed} tiles revealed but only {safe} safe tiles exist")]
    TilesExceedSafe { revealed: u8, safe: u8 },

    #[error("must select between 1 and 10 numbers, got {0}")]
    SpotCount(usize),

    #[error("keno numbers must be between 1 and 40, got {0}")]
    NumberOutOfRange(u8),

    #[error("number {0} selected more than once")]
    DuplicateNumber(u8),

    #[error("cannot pick {wanted} unique values from a space of {space}")]
    UniqueCount { wanted: usize, space: u8 },
}

/// Game session errors raised by the processor
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Insufficient balance: have {balance}, need {required}")]
    InsufficientBalance { balance: Amount, required: Amount },

    #[error("Invalid bet amount: {0}")]
    InvalidBet(String),

    #[error("You already have an active game. Please finish or cashout first.")]
    ActiveGameExists,

    #[error("Player {0} not found")]
    PlayerNotFound(String),

    #[error("Game {0} not found")]
    GameNotFound(String),

    #[error("Game {0} is not active")]
    GameNotActive(String),

    #[error("Tile {0} already revealed")]
    TileAlreadyRevealed(u8),

    #[error("Cannot cashout without revealing any tiles")]
    NothingToCashOut,

    #[error("Cannot reroll seeds while a game is active")]
    RerollDuringGame,
}

// Convenience type alias for Results
pub type CrownwynnResult<T> = Result<T, CrownwynnError>;

impl From<toml::de::Error> for CrownwynnError {
    fn from(e: toml::de::Error) -> Self {
        CrownwynnError::Configuration(ConfigurationError::LoadFailed(e.to_string()))
    }
}

impl From<std::io::Error> for CrownwynnError {
    fn from(e: std::io::Error) -> Self {
        CrownwynnError::Configuration(ConfigurationError::LoadFailed(e.to_string()))
    }
}
