//! Service layer wiring player state, game rules and game history together
//!
//! The HTTP handlers only talk to [`CasinoService`]. Every mutating call runs
//! its rule from [`GameProcessor`] inside one [`PlayerStore::transact`], then
//! files any finished game into the [`GameStore`].

use crate::{
    config::CasinoConfig,
    errors::{CrownwynnError, CrownwynnResult, SessionError},
    fairness::{verify_record, VerificationReport},
    game_store::{GameRecord, GameStore},
    games::{
        keno::KenoPaytable,
        processor::{ActiveMinesView, GameProcessor, GameSettled, MinesStarted, SeedsView, TileRevealed},
        types::{Amount, GameType},
    },
    state_manager::{InMemoryPlayerStore, PlayerAccount, PlayerStats, PlayerStore},
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

/// Public account overview
#[derive(Debug, Clone, Serialize)]
pub struct PlayerSummary {
    pub player_id: String,
    pub balance: Amount,
    pub seeds: SeedsView,
    pub stats: PlayerStats,
    pub active_game_id: Option<String>,
}

/// Casino facade shared by all request handlers
pub struct CasinoService<S: PlayerStore = InMemoryPlayerStore> {
    players: Arc<S>,
    processor: GameProcessor,
    games: Arc<GameStore>,
}

impl<S: PlayerStore> Clone for CasinoService<S> {
    fn clone(&self) -> Self {
        Self {
            players: Arc::clone(&self.players),
            processor: self.processor.clone(),
            games: Arc::clone(&self.games),
        }
    }
}

impl CasinoService<InMemoryPlayerStore> {
    /// In-memory service built from validated configuration
    pub fn from_config(config: &CasinoConfig) -> Self {
        Self::new(
            InMemoryPlayerStore::new(config.players.starting_balance),
            GameProcessor::from_config(config),
            GameStore::new(config.players.history_limit),
        )
    }
}

impl<S: PlayerStore + 'static> CasinoService<S> {
    pub fn new(players: S, processor: GameProcessor, games: GameStore) -> Self {
        Self {
            players: Arc::new(players),
            processor,
            games: Arc::new(games),
        }
    }

    pub fn paytable(&self) -> &KenoPaytable {
        self.processor.paytable()
    }

    pub async fn start_mines(
        &self,
        player_id: &str,
        bet: Amount,
        mines_count: u8,
        client_seed: Option<String>,
    ) -> CrownwynnResult<MinesStarted> {
        let processor = self.processor.clone();
        self.players
            .transact(player_id, move |account| {
                processor.start_mines(account, bet, mines_count, client_seed, Utc::now())
            })
            .await
    }

    pub async fn reveal_tile(&self, player_id: &str, game_id: &str, tile: u8) -> CrownwynnResult<TileRevealed> {
        let processor = self.processor.clone();
        let game_id = game_id.to_string();
        let revealed = self
            .players
            .transact(player_id, move |account| {
                processor.reveal_tile(account, &game_id, tile, Utc::now())
            })
            .await
            .map_err(|e| self.finished_game_error(e))?;

        if let Some(record) = &revealed.record {
            self.games.store(record.clone());
        }
        Ok(revealed)
    }

    pub async fn cash_out(&self, player_id: &str, game_id: &str) -> CrownwynnResult<GameSettled> {
        let processor = self.processor.clone();
        let game_id = game_id.to_string();
        let settled = self
            .players
            .transact(player_id, move |account| processor.cash_out(account, &game_id, Utc::now()))
            .await
            .map_err(|e| self.finished_game_error(e))?;

        self.games.store(settled.record.clone());
        Ok(settled)
    }

    /// A game id the player no longer has active may still be on file as a
    /// finished game.
    fn finished_game_error(&self, error: CrownwynnError) -> CrownwynnError {
        match error {
            CrownwynnError::Session(SessionError::GameNotFound(game_id)) if self.games.get(&game_id).is_some() => {
                SessionError::GameNotActive(game_id).into()
            }
            other => other,
        }
    }

    pub async fn active_mines(&self, player_id: &str) -> CrownwynnResult<Option<ActiveMinesView>> {
        let account = self.players.snapshot(player_id).await?;
        Ok(account
            .as_ref()
            .and_then(|a| a.active_mines.as_ref())
            .map(ActiveMinesView::from_game))
    }

    pub async fn play_keno(
        &self,
        player_id: &str,
        bet: Amount,
        numbers_selected: Vec<u8>,
        client_seed: Option<String>,
    ) -> CrownwynnResult<GameSettled> {
        let processor = self.processor.clone();
        let settled = self
            .players
            .transact(player_id, move |account| {
                processor.play_keno(account, bet, &numbers_selected, client_seed, Utc::now())
            })
            .await?;

        self.games.store(settled.record.clone());
        Ok(settled)
    }

    pub async fn reroll_seeds(&self, player_id: &str) -> CrownwynnResult<SeedsView> {
        let processor = self.processor.clone();
        self.players
            .transact(player_id, move |account| processor.reroll_seeds(account))
            .await
    }

    /// Existing account only; unknown players are opened by their first
    /// bet or seed reroll.
    async fn known_account(&self, player_id: &str) -> CrownwynnResult<PlayerAccount> {
        self.players
            .snapshot(player_id)
            .await?
            .ok_or_else(|| SessionError::PlayerNotFound(player_id.to_string()).into())
    }

    /// Commitment for the player's next game, plus the seed counters
    pub async fn next_seed_hash(&self, player_id: &str) -> CrownwynnResult<SeedsView> {
        let account = self.known_account(player_id).await?;
        Ok(SeedsView::from_account(&account))
    }

    pub async fn player_summary(&self, player_id: &str) -> CrownwynnResult<PlayerSummary> {
        let account = self.known_account(player_id).await?;
        Ok(PlayerSummary {
            player_id: account.player_id.clone(),
            balance: account.balance,
            seeds: SeedsView::from_account(&account),
            active_game_id: account.active_mines.as_ref().map(|g| g.game_id.clone()),
            stats: account.stats,
        })
    }

    pub fn history(&self, player_id: &str, game_type: Option<GameType>, limit: usize) -> Vec<GameRecord> {
        self.games.history(player_id, game_type, limit)
    }

    pub fn game(&self, game_id: &str) -> CrownwynnResult<GameRecord> {
        self.games
            .get(game_id)
            .ok_or_else(|| SessionError::GameNotFound(game_id.to_string()).into())
    }

    /// Re-check a completed game's commitment and outcome
    pub fn verify_game(&self, game_id: &str) -> CrownwynnResult<VerificationReport> {
        let record = self.game(game_id)?;
        let report = verify_record(&record);
        if !report.is_valid {
            tracing::warn!(game_id, "Stored game failed verification");
        }
        Ok(report)
    }
}
