//! Crownwynn - Provably-Fair Mines & Keno Engine
//!
//! Every outcome is derived from a committed server seed, a player-chosen
//! client seed and a per-player nonce, so any finished game can be
//! recomputed and audited after the server seed is disclosed.

pub mod api;
pub mod config;
pub mod errors;
pub mod fairness;
pub mod game_store;
pub mod games;
pub mod services;
pub mod state_manager;

pub use config::{CasinoConfig, ConfigLoader};
pub use errors::{CrownwynnError, CrownwynnResult};
pub use fairness::{verify_fairness, FairnessParams};
pub use games::{
    commit, count_matches, draw_keno_numbers, generate_mine_positions, keno_multiplier, mines_multiplier,
    new_client_seed, new_server_seed,
};
pub use services::CasinoService;
