//! API Request & Response Models

use crate::{
    fairness::FairnessParams,
    games::{keno::KenoPaytable, types::{Amount, GameType}},
};
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// POST /api/mines/start
#[derive(Debug, Clone, Deserialize)]
pub struct StartMinesRequest {
    pub player_id: String,
    pub bet_amount: Amount,
    pub mines_count: u8,
    #[serde(default)]
    pub client_seed: Option<String>,
}

/// POST /api/mines/reveal
#[derive(Debug, Clone, Deserialize)]
pub struct RevealTileRequest {
    pub player_id: String,
    pub game_id: String,
    pub tile_position: u8,
}

/// POST /api/mines/cashout
#[derive(Debug, Clone, Deserialize)]
pub struct CashoutRequest {
    pub player_id: String,
    pub game_id: String,
}

/// POST /api/keno/play
#[derive(Debug, Clone, Deserialize)]
pub struct PlayKenoRequest {
    pub player_id: String,
    pub bet_amount: Amount,
    pub numbers_selected: Vec<u8>,
    #[serde(default)]
    pub client_seed: Option<String>,
}

/// POST /api/seeds/reroll
#[derive(Debug, Clone, Deserialize)]
pub struct RerollSeedsRequest {
    pub player_id: String,
}

/// GET /api/history/:player_id?game_type=&limit=
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub game_type: Option<GameType>,
    #[serde(default = "default_history_limit")]
    pub limit: usize,
}

fn default_history_limit() -> usize {
    20
}

#[derive(Debug, Clone, Serialize)]
pub struct ActiveGameResponse<T> {
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game: Option<T>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryResponse<T> {
    pub player_id: String,
    pub games: Vec<T>,
    pub count: usize,
}

/// Paytable plus the theoretical return for every spot count
#[derive(Debug, Clone, Serialize)]
pub struct PaytableResponse {
    #[serde(flatten)]
    pub paytable: KenoPaytable,
    pub expected_return: Vec<SpotReturn>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpotReturn {
    pub spots: usize,
    pub expected_return: f64,
}

/// POST /api/verify/mines
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyMinesRequest {
    pub server_seed: String,
    pub client_seed: String,
    pub nonce: u64,
    pub mines_count: u8,
    pub mine_positions: Vec<u8>,
}

/// POST /api/verify/keno
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyKenoRequest {
    pub server_seed: String,
    pub client_seed: String,
    pub nonce: u64,
    pub drawn_numbers: Vec<u8>,
}

/// Result of a public fairness check
#[derive(Debug, Clone, Serialize)]
pub struct VerifyResponse {
    pub is_valid: bool,
    pub server_seed_hash: String,
    pub params: FairnessParams,
    /// What the seeds actually produce; empty for invalid parameters
    pub expected_outcome: Vec<u8>,
}
