//! Mines outcome engine
//!
//! Mine positions come from the shared hash stream (`byte % 25`). Payouts
//! follow the fair-odds curve `C(25, r) / C(25 - m, r)` discounted by the
//! configured house edge.

use crate::errors::{CrownwynnResult, ParameterError, SessionError};
use crate::games::seed_engine::{draw_unique, SeedPair};
use crate::games::types::{binomial, Amount, Multiplier};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const BOARD_TILES: u8 = 25;
pub const MIN_MINES: u8 = 1;
pub const MAX_MINES: u8 = 24;

/// 1% house edge, in basis points of `Multiplier::SCALE`
pub const DEFAULT_HOUSE_EDGE_BP: u64 = 100;

pub fn validate_mine_count(mine_count: u8) -> Result<(), ParameterError> {
    if !(MIN_MINES..=MAX_MINES).contains(&mine_count) {
        return Err(ParameterError::MineCount(mine_count));
    }
    Ok(())
}

/// Derive the mine layout for a game, ascending.
pub fn generate_mine_positions(
    server_seed: &str,
    client_seed: &str,
    nonce: u64,
    mine_count: u8,
) -> Result<Vec<u8>, ParameterError> {
    validate_mine_count(mine_count)?;
    draw_unique(server_seed, client_seed, nonce, mine_count as usize, BOARD_TILES, 0)
}

/// Multiplier with the default house edge
pub fn mines_multiplier(tiles_revealed: u8, mine_count: u8) -> Result<Multiplier, ParameterError> {
    MinesPayoutCurve::default().multiplier(tiles_revealed, mine_count)
}

/// Fair-odds payout curve with a fixed house take
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinesPayoutCurve {
    /// House edge in ten-thousandths (100 = 1%)
    pub house_edge_bp: u64,
}

impl Default for MinesPayoutCurve {
    fn default() -> Self {
        Self {
            house_edge_bp: DEFAULT_HOUSE_EDGE_BP,
        }
    }
}

impl MinesPayoutCurve {
    pub fn new(house_edge_bp: u64) -> Self {
        Self { house_edge_bp }
    }

    /// `C(25, r) / C(25 - m, r) * (1 - edge)`, rounded half-up to 4 decimals.
    /// Zero reveals always pay exactly 1.0000.
    pub fn multiplier(&self, tiles_revealed: u8, mine_count: u8) -> Result<Multiplier, ParameterError> {
        validate_mine_count(mine_count)?;
        let safe = BOARD_TILES - mine_count;
        if tiles_revealed > safe {
            return Err(ParameterError::TilesExceedSafe {
                revealed: tiles_revealed,
                safe,
            });
        }
        if tiles_revealed == 0 {
            return Ok(Multiplier::ONE);
        }

        let retained = Multiplier::SCALE.saturating_sub(self.house_edge_bp) as u128;
        let numerator = binomial(BOARD_TILES as u64, tiles_revealed as u64) as u128 * retained;
        let denominator = binomial(safe as u64, tiles_revealed as u64) as u128;
        let rounded = (numerator + denominator / 2) / denominator;

        Ok(Multiplier::from_basis_points(rounded as u64))
    }

    /// Multiplier for clearing the whole board
    pub fn max_multiplier(&self, mine_count: u8) -> Result<Multiplier, ParameterError> {
        validate_mine_count(mine_count)?;
        self.multiplier(BOARD_TILES - mine_count, mine_count)
    }
}

/// Result of revealing one tile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    /// Tile was a mine; the game is lost
    Mine,
    /// Safe tile, game continues
    Safe {
        multiplier: Multiplier,
        safe_tiles_remaining: u8,
    },
    /// Last safe tile revealed; the game is won automatically
    Cleared { multiplier: Multiplier },
}

/// In-progress Mines game owned by the player record.
///
/// Mine positions stay private until the game is finished.
#[derive(Debug, Clone)]
pub struct MinesGame {
    pub game_id: String,
    pub bet_amount: Amount,
    pub mines_count: u8,
    pub seeds: SeedPair,
    pub revealed_tiles: Vec<u8>,
    pub current_multiplier: Multiplier,
    pub created_at: DateTime<Utc>,
    mine_positions: Vec<u8>,
}

impl MinesGame {
    pub fn new(
        game_id: String,
        bet_amount: Amount,
        mines_count: u8,
        seeds: SeedPair,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ParameterError> {
        let mine_positions =
            generate_mine_positions(&seeds.server_seed, &seeds.client_seed, seeds.nonce, mines_count)?;

        Ok(Self {
            game_id,
            bet_amount,
            mines_count,
            seeds,
            revealed_tiles: Vec::new(),
            current_multiplier: Multiplier::ONE,
            created_at,
            mine_positions,
        })
    }

    pub fn mine_positions(&self) -> &[u8] {
        &self.mine_positions
    }

    pub fn is_mine(&self, tile: u8) -> bool {
        self.mine_positions.binary_search(&tile).is_ok()
    }

    pub fn safe_tiles(&self) -> u8 {
        BOARD_TILES - self.mines_count
    }

    pub fn safe_tiles_remaining(&self) -> u8 {
        self.safe_tiles() - self.revealed_tiles.len() as u8
    }

    /// Reveal a tile and advance the multiplier.
    pub fn reveal(&mut self, tile: u8, curve: &MinesPayoutCurve) -> CrownwynnResult<RevealOutcome> {
        if tile >= BOARD_TILES {
            return Err(ParameterError::TilePosition(tile).into());
        }
        if self.revealed_tiles.contains(&tile) {
            return Err(SessionError::TileAlreadyRevealed(tile).into());
        }
        if self.is_mine(tile) {
            return Ok(RevealOutcome::Mine);
        }

        self.revealed_tiles.push(tile);
        let multiplier = curve.multiplier(self.revealed_tiles.len() as u8, self.mines_count)?;
        self.current_multiplier = multiplier;

        let safe_tiles_remaining = self.safe_tiles_remaining();
        if safe_tiles_remaining == 0 {
            Ok(RevealOutcome::Cleared { multiplier })
        } else {
            Ok(RevealOutcome::Safe {
                multiplier,
                safe_tiles_remaining,
            })
        }
    }
}
