//! Completed game records, indexed by id and by player (newest first).

use crate::games::types::{serialize_signed_cents, Amount, FairnessProof, GameStatus, GameType, Multiplier};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::collections::VecDeque;

/// Game-specific part of a record
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "game_type", rename_all = "lowercase")]
pub enum GameDetails {
    Mines {
        mines_count: u8,
        mine_positions: Vec<u8>,
        revealed_tiles: Vec<u8>,
    },
    Keno {
        numbers_selected: Vec<u8>,
        drawn_numbers: Vec<u8>,
        matches: usize,
    },
}

/// A finished game, seeds fully disclosed
#[derive(Debug, Clone, Serialize)]
pub struct GameRecord {
    pub game_id: String,
    pub player_id: String,
    pub status: GameStatus,
    pub bet_amount: Amount,
    pub multiplier: Multiplier,
    pub payout: Amount,
    #[serde(serialize_with = "serialize_signed_cents")]
    pub net_profit: i64,
    pub fairness: FairnessProof,
    #[serde(flatten)]
    pub details: GameDetails,
    pub created_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl GameRecord {
    pub fn game_type(&self) -> GameType {
        match self.details {
            GameDetails::Mines { .. } => GameType::Mines,
            GameDetails::Keno { .. } => GameType::Keno,
        }
    }
}

/// In-memory history of finished games.
///
/// Each player keeps at most `history_limit` records; older ones are evicted
/// from both indexes.
pub struct GameStore {
    records: DashMap<String, GameRecord>,
    by_player: DashMap<String, VecDeque<String>>,
    history_limit: usize,
}

impl GameStore {
    pub fn new(history_limit: usize) -> Self {
        Self {
            records: DashMap::new(),
            by_player: DashMap::new(),
            history_limit: history_limit.max(1),
        }
    }

    pub fn store(&self, record: GameRecord) {
        let evicted: Vec<String> = {
            let mut ids = self.by_player.entry(record.player_id.clone()).or_default();
            ids.push_front(record.game_id.clone());
            let excess = ids.len().saturating_sub(self.history_limit);
            (0..excess).filter_map(|_| ids.pop_back()).collect()
        };

        for id in evicted {
            self.records.remove(&id);
        }
        self.records.insert(record.game_id.clone(), record);
    }

    pub fn get(&self, game_id: &str) -> Option<GameRecord> {
        self.records.get(game_id).map(|r| r.value().clone())
    }

    /// Newest first, optionally filtered by game type
    pub fn history(&self, player_id: &str, game_type: Option<GameType>, limit: usize) -> Vec<GameRecord> {
        let Some(ids) = self.by_player.get(player_id) else {
            return Vec::new();
        };

        ids.iter()
            .filter_map(|id| self.records.get(id).map(|r| r.value().clone()))
            .filter(|r| game_type.map_or(true, |t| r.game_type() == t))
            .take(limit)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
