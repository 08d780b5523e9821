//! Per-player state and the atomic transaction boundary around it
//!
//! Nonce, balance, seeds and the active game all live on one
//! [`PlayerAccount`]. Every mutation goes through [`PlayerStore::transact`],
//! which serializes requests for the same player and commits the record only
//! when the transaction body succeeds. Accounts are opened by the first
//! transaction, never by a read.

use crate::{
    errors::CrownwynnResult,
    games::{
        mines::MinesGame,
        seed_engine::PlayerSeeds,
        types::{serialize_signed_cents, Amount, GameType},
    },
};
use async_trait::async_trait;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Win/loss statistics for one game type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GameStats {
    pub games_played: u64,
    pub games_won: u64,
    pub games_lost: u64,
    pub total_wagered: Amount,
    #[serde(serialize_with = "serialize_signed_cents")]
    pub total_profit: i64,
    pub biggest_win: Amount,
    /// Positive for a win streak, negative for a loss streak
    pub current_streak: i64,
    pub best_streak: i64,
}

impl GameStats {
    pub fn record_wager(&mut self, bet: Amount) {
        self.games_played += 1;
        self.total_wagered = self.total_wagered.saturating_add(bet);
    }

    pub fn record_win(&mut self, bet: Amount, payout: Amount) {
        self.games_won += 1;
        self.total_profit = self.total_profit.saturating_add(payout.signed_diff(bet));
        self.biggest_win = self.biggest_win.max(payout);
        self.current_streak = if self.current_streak < 0 { 1 } else { self.current_streak + 1 };
        self.best_streak = self.best_streak.max(self.current_streak);
    }

    pub fn record_loss(&mut self, bet: Amount) {
        self.games_lost += 1;
        self.total_profit = self.total_profit.saturating_sub(bet.minor_units() as i64);
        self.current_streak = if self.current_streak > 0 { -1 } else { self.current_streak - 1 };
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlayerStats {
    pub mines: GameStats,
    pub keno: GameStats,
}

impl PlayerStats {
    pub fn for_game(&mut self, game_type: GameType) -> &mut GameStats {
        match game_type {
            GameType::Mines => &mut self.mines,
            GameType::Keno => &mut self.keno,
        }
    }
}

/// Everything the game core needs to know about one player
#[derive(Debug, Clone)]
pub struct PlayerAccount {
    pub player_id: String,
    pub balance: Amount,
    pub seeds: PlayerSeeds,
    pub active_mines: Option<MinesGame>,
    pub stats: PlayerStats,
}

impl PlayerAccount {
    pub fn open(player_id: &str, starting_balance: Amount) -> CrownwynnResult<Self> {
        Ok(Self {
            player_id: player_id.to_string(),
            balance: starting_balance,
            seeds: PlayerSeeds::generate()?,
            active_mines: None,
            stats: PlayerStats::default(),
        })
    }
}

/// Durable per-player state with a serializable transaction per request
#[async_trait]
pub trait PlayerStore: Send + Sync {
    /// Run `f` against the player's record as one atomic unit. Concurrent
    /// calls for the same player are serialized; a body returning `Err`
    /// leaves the record untouched.
    async fn transact<T, F>(&self, player_id: &str, f: F) -> CrownwynnResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PlayerAccount) -> CrownwynnResult<T> + Send + 'static;

    /// Consistent copy of the player's record, `None` if the player has
    /// never transacted. Never opens an account.
    async fn snapshot(&self, player_id: &str) -> CrownwynnResult<Option<PlayerAccount>>;
}

/// Process-local store: one async mutex per player, players never contend
/// with each other.
pub struct InMemoryPlayerStore {
    accounts: DashMap<String, Arc<Mutex<PlayerAccount>>>,
    starting_balance: Amount,
}

impl InMemoryPlayerStore {
    pub fn new(starting_balance: Amount) -> Self {
        Self {
            accounts: DashMap::new(),
            starting_balance,
        }
    }

    fn existing_slot(&self, player_id: &str) -> Option<Arc<Mutex<PlayerAccount>>> {
        self.accounts.get(player_id).map(|slot| slot.value().clone())
    }

    /// Lock slot for a player, opening the account on first sight.
    fn slot(&self, player_id: &str) -> CrownwynnResult<Arc<Mutex<PlayerAccount>>> {
        if let Some(slot) = self.existing_slot(player_id) {
            return Ok(slot);
        }

        let account = PlayerAccount::open(player_id, self.starting_balance)?;
        let slot = self
            .accounts
            .entry(player_id.to_string())
            .or_insert_with(|| {
                tracing::info!(player_id, "Opened player account");
                Arc::new(Mutex::new(account))
            })
            .value()
            .clone();
        Ok(slot)
    }

    pub fn player_count(&self) -> usize {
        self.accounts.len()
    }
}

#[async_trait]
impl PlayerStore for InMemoryPlayerStore {
    async fn transact<T, F>(&self, player_id: &str, f: F) -> CrownwynnResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PlayerAccount) -> CrownwynnResult<T> + Send + 'static,
    {
        let slot = self.slot(player_id)?;
        let mut committed = slot.lock().await;

        let mut draft = committed.clone();
        let value = f(&mut draft)?;
        *committed = draft;

        Ok(value)
    }

    async fn snapshot(&self, player_id: &str) -> CrownwynnResult<Option<PlayerAccount>> {
        let Some(slot) = self.existing_slot(player_id) else {
            return Ok(None);
        };
        let account = slot.lock().await;
        Ok(Some(account.clone()))
    }
}
