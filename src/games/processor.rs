use crate::config::{BetLimits, CasinoConfig};
use crate::errors::{CrownwynnResult, SessionError};
use crate::game_store::{GameDetails, GameRecord};
use crate::games::keno::{validate_selection, KenoOutcome, KenoPaytable};
use crate::games::mines::{validate_mine_count, MinesGame, MinesPayoutCurve, RevealOutcome};
use crate::games::types::{Amount, FairnessProof, GameStatus, GameType, Multiplier};
use crate::state_manager::PlayerAccount;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Returned when a Mines game starts; the server seed stays hidden
#[derive(Debug, Clone, Serialize)]
pub struct MinesStarted {
    pub game_id: String,
    pub mines_count: u8,
    pub bet_amount: Amount,
    pub current_multiplier: Multiplier,
    pub revealed_tiles: Vec<u8>,
    pub fairness: FairnessProof,
    pub balance: Amount,
}

/// Result of one reveal. `record` is set once the game is over.
#[derive(Debug, Clone, Serialize)]
pub struct TileRevealed {
    pub game_id: String,
    pub tile_position: u8,
    pub hit_mine: bool,
    pub game_over: bool,
    pub auto_win: bool,
    pub revealed_tiles: Vec<u8>,
    pub current_multiplier: Multiplier,
    pub potential_payout: Amount,
    pub safe_tiles_remaining: u8,
    pub balance: Amount,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<GameRecord>,
}

/// A finished game together with the balance it left behind
#[derive(Debug, Clone, Serialize)]
pub struct GameSettled {
    #[serde(flatten)]
    pub record: GameRecord,
    pub balance: Amount,
}

/// Public view of the active Mines game: no mine positions, no server seed
#[derive(Debug, Clone, Serialize)]
pub struct ActiveMinesView {
    pub game_id: String,
    pub mines_count: u8,
    pub bet_amount: Amount,
    pub revealed_tiles: Vec<u8>,
    pub current_multiplier: Multiplier,
    pub potential_payout: Amount,
    pub fairness: FairnessProof,
    pub created_at: DateTime<Utc>,
}

impl ActiveMinesView {
    pub fn from_game(game: &MinesGame) -> Self {
        Self {
            game_id: game.game_id.clone(),
            mines_count: game.mines_count,
            bet_amount: game.bet_amount,
            revealed_tiles: game.revealed_tiles.clone(),
            current_multiplier: game.current_multiplier,
            potential_payout: game.current_multiplier.apply(game.bet_amount),
            fairness: hidden_proof(game),
            created_at: game.created_at,
        }
    }
}

/// Seed state a player may see
#[derive(Debug, Clone, Serialize)]
pub struct SeedsView {
    pub client_seed: String,
    pub next_server_seed_hash: String,
    pub nonce: u64,
    pub seed_games_played: u64,
}

impl SeedsView {
    pub fn from_account(account: &PlayerAccount) -> Self {
        Self {
            client_seed: account.seeds.client_seed().to_string(),
            next_server_seed_hash: account.seeds.next_server_seed_hash().to_string(),
            nonce: account.seeds.nonce(),
            seed_games_played: account.seeds.seed_games_played(),
        }
    }
}

fn hidden_proof(game: &MinesGame) -> FairnessProof {
    FairnessProof {
        server_seed_hash: game.seeds.server_seed_hash.clone(),
        server_seed: None,
        client_seed: game.seeds.client_seed.clone(),
        nonce: game.seeds.nonce,
    }
}

/// Game session rules applied inside a player transaction.
///
/// Every method validates first and only then consumes the nonce and moves
/// money, so a rejected request never burns a nonce.
#[derive(Clone)]
pub struct GameProcessor {
    mines_curve: MinesPayoutCurve,
    paytable: Arc<KenoPaytable>,
    bet_limits: BetLimits,
}

impl GameProcessor {
    pub fn new(mines_curve: MinesPayoutCurve, paytable: KenoPaytable, bet_limits: BetLimits) -> Self {
        Self {
            mines_curve,
            paytable: Arc::new(paytable),
            bet_limits,
        }
    }

    pub fn from_config(config: &CasinoConfig) -> Self {
        Self::new(
            config.mines.payout_curve(),
            config.keno.paytable.clone(),
            config.bets.clone(),
        )
    }

    pub fn paytable(&self) -> &KenoPaytable {
        &self.paytable
    }

    pub fn mines_curve(&self) -> &MinesPayoutCurve {
        &self.mines_curve
    }

    fn check_bet(&self, account: &PlayerAccount, bet: Amount) -> Result<(), SessionError> {
        if bet < self.bet_limits.min_bet {
            return Err(SessionError::InvalidBet(format!(
                "Bet must be at least {}",
                self.bet_limits.min_bet
            )));
        }
        if bet > self.bet_limits.max_bet {
            return Err(SessionError::InvalidBet(format!(
                "Bet cannot exceed {}",
                self.bet_limits.max_bet
            )));
        }
        if bet > account.balance {
            return Err(SessionError::InsufficientBalance {
                balance: account.balance,
                required: bet,
            });
        }
        Ok(())
    }

    fn debit(account: &mut PlayerAccount, bet: Amount) -> Result<(), SessionError> {
        account.balance = account
            .balance
            .checked_sub(bet)
            .ok_or(SessionError::InsufficientBalance {
                balance: account.balance,
                required: bet,
            })?;
        Ok(())
    }

    /// Place a Mines bet: debit, consume seeds, lay out the board.
    pub fn start_mines(
        &self,
        account: &mut PlayerAccount,
        bet: Amount,
        mines_count: u8,
        client_seed: Option<String>,
        now: DateTime<Utc>,
    ) -> CrownwynnResult<MinesStarted> {
        validate_mine_count(mines_count)?;
        if account.active_mines.is_some() {
            return Err(SessionError::ActiveGameExists.into());
        }
        self.check_bet(account, bet)?;

        Self::debit(account, bet)?;
        let seeds = account.seeds.consume(client_seed)?;
        let game = MinesGame::new(Uuid::new_v4().to_string(), bet, mines_count, seeds, now)?;
        account.stats.for_game(GameType::Mines).record_wager(bet);

        tracing::info!(
            player_id = %account.player_id,
            game_id = %game.game_id,
            nonce = game.seeds.nonce,
            mines_count,
            bet = %bet,
            "Mines game started"
        );

        let started = MinesStarted {
            game_id: game.game_id.clone(),
            mines_count,
            bet_amount: bet,
            current_multiplier: game.current_multiplier,
            revealed_tiles: Vec::new(),
            fairness: hidden_proof(&game),
            balance: account.balance,
        };
        account.active_mines = Some(game);
        Ok(started)
    }

    fn active_game<'a>(account: &'a mut PlayerAccount, game_id: &str) -> Result<&'a mut MinesGame, SessionError> {
        match account.active_mines.as_mut() {
            Some(game) if game.game_id == game_id => Ok(game),
            _ => Err(SessionError::GameNotFound(game_id.to_string())),
        }
    }

    /// Reveal one tile. A mine ends the game as a loss; the last safe tile
    /// ends it as an automatic win.
    pub fn reveal_tile(
        &self,
        account: &mut PlayerAccount,
        game_id: &str,
        tile: u8,
        now: DateTime<Utc>,
    ) -> CrownwynnResult<TileRevealed> {
        let game = Self::active_game(account, game_id)?;
        let outcome = game.reveal(tile, &self.mines_curve)?;
        tracing::debug!(game_id, tile, ?outcome, "Tile revealed");

        match outcome {
            RevealOutcome::Safe {
                multiplier,
                safe_tiles_remaining,
            } => Ok(TileRevealed {
                game_id: game_id.to_string(),
                tile_position: tile,
                hit_mine: false,
                game_over: false,
                auto_win: false,
                revealed_tiles: game.revealed_tiles.clone(),
                current_multiplier: multiplier,
                potential_payout: multiplier.apply(game.bet_amount),
                safe_tiles_remaining,
                balance: account.balance,
                record: None,
            }),
            RevealOutcome::Mine => {
                let record = self.finish_mines(account, GameStatus::Lost, Multiplier::ZERO, now)?;
                Ok(Self::terminal_reveal(tile, true, false, account.balance, record))
            }
            RevealOutcome::Cleared { multiplier } => {
                let record = self.finish_mines(account, GameStatus::Won, multiplier, now)?;
                Ok(Self::terminal_reveal(tile, false, true, account.balance, record))
            }
        }
    }

    fn terminal_reveal(tile: u8, hit_mine: bool, auto_win: bool, balance: Amount, record: GameRecord) -> TileRevealed {
        let revealed_tiles = match &record.details {
            GameDetails::Mines { revealed_tiles, .. } => revealed_tiles.clone(),
            GameDetails::Keno { .. } => Vec::new(),
        };
        TileRevealed {
            game_id: record.game_id.clone(),
            tile_position: tile,
            hit_mine,
            game_over: true,
            auto_win,
            revealed_tiles,
            current_multiplier: record.multiplier,
            potential_payout: record.payout,
            safe_tiles_remaining: 0,
            balance,
            record: Some(record),
        }
    }

    /// Take the current multiplier and end the game
    pub fn cash_out(&self, account: &mut PlayerAccount, game_id: &str, now: DateTime<Utc>) -> CrownwynnResult<GameSettled> {
        let game = Self::active_game(account, game_id)?;
        if game.revealed_tiles.is_empty() {
            return Err(SessionError::NothingToCashOut.into());
        }
        let multiplier = game.current_multiplier;
        let record = self.finish_mines(account, GameStatus::Won, multiplier, now)?;
        Ok(GameSettled {
            record,
            balance: account.balance,
        })
    }

    /// Close the active game, settle the balance and disclose the seed.
    fn finish_mines(
        &self,
        account: &mut PlayerAccount,
        status: GameStatus,
        multiplier: Multiplier,
        now: DateTime<Utc>,
    ) -> CrownwynnResult<GameRecord> {
        let game = account
            .active_mines
            .take()
            .ok_or_else(|| SessionError::GameNotFound(String::new()))?;

        let payout = multiplier.apply(game.bet_amount);
        account.balance = account.balance.saturating_add(payout);

        let stats = account.stats.for_game(GameType::Mines);
        match status {
            GameStatus::Won => stats.record_win(game.bet_amount, payout),
            _ => stats.record_loss(game.bet_amount),
        }

        tracing::info!(
            player_id = %account.player_id,
            game_id = %game.game_id,
            ?status,
            multiplier = %multiplier,
            payout = %payout,
            "Mines game finished"
        );

        Ok(GameRecord {
            game_id: game.game_id.clone(),
            player_id: account.player_id.clone(),
            status,
            bet_amount: game.bet_amount,
            multiplier,
            payout,
            net_profit: payout.signed_diff(game.bet_amount),
            fairness: FairnessProof {
                server_seed_hash: game.seeds.server_seed_hash.clone(),
                server_seed: Some(game.seeds.server_seed.clone()),
                client_seed: game.seeds.client_seed.clone(),
                nonce: game.seeds.nonce,
            },
            details: GameDetails::Mines {
                mines_count: game.mines_count,
                mine_positions: game.mine_positions().to_vec(),
                revealed_tiles: game.revealed_tiles.clone(),
            },
            created_at: game.created_at,
            completed_at: now,
        })
    }

    /// Play a full Keno round. The game is terminal on creation, so the
    /// server seed is disclosed in the returned record.
    pub fn play_keno(
        &self,
        account: &mut PlayerAccount,
        bet: Amount,
        selected: &[u8],
        client_seed: Option<String>,
        now: DateTime<Utc>,
    ) -> CrownwynnResult<GameSettled> {
        validate_selection(selected)?;
        self.check_bet(account, bet)?;

        Self::debit(account, bet)?;
        let seeds = account.seeds.consume(client_seed)?;
        let outcome = KenoOutcome::resolve(&seeds, selected, &self.paytable)?;

        let payout = outcome.multiplier.apply(bet);
        let status = if outcome.multiplier.is_zero() {
            GameStatus::Lost
        } else {
            GameStatus::Won
        };

        account.balance = account.balance.saturating_add(payout);
        let stats = account.stats.for_game(GameType::Keno);
        stats.record_wager(bet);
        match status {
            GameStatus::Won => stats.record_win(bet, payout),
            _ => stats.record_loss(bet),
        }

        let game_id = Uuid::new_v4().to_string();
        tracing::info!(
            player_id = %account.player_id,
            game_id = %game_id,
            nonce = seeds.nonce,
            matches = outcome.matches,
            multiplier = %outcome.multiplier,
            paytable = %self.paytable.version,
            "Keno round played"
        );

        let record = GameRecord {
            game_id,
            player_id: account.player_id.clone(),
            status,
            bet_amount: bet,
            multiplier: outcome.multiplier,
            payout,
            net_profit: payout.signed_diff(bet),
            fairness: FairnessProof {
                server_seed_hash: seeds.server_seed_hash,
                server_seed: Some(seeds.server_seed),
                client_seed: seeds.client_seed,
                nonce: seeds.nonce,
            },
            details: GameDetails::Keno {
                numbers_selected: outcome.numbers_selected,
                drawn_numbers: outcome.drawn_numbers,
                matches: outcome.matches,
            },
            created_at: now,
            completed_at: now,
        };
        Ok(GameSettled {
            record,
            balance: account.balance,
        })
    }

    /// New client seed and next server seed, refused mid-game.
    pub fn reroll_seeds(&self, account: &mut PlayerAccount) -> CrownwynnResult<SeedsView> {
        if account.active_mines.is_some() {
            return Err(SessionError::RerollDuringGame.into());
        }
        account.seeds.reroll()?;
        tracing::info!(player_id = %account.player_id, "Seeds rerolled");
        Ok(SeedsView::from_account(account))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{CrownwynnError, ParameterError};
    use crate::fairness::{verify_fairness, verify_record, FairnessParams};

    fn processor() -> GameProcessor {
        GameProcessor::from_config(&CasinoConfig::default())
    }

    fn account(balance: u64) -> PlayerAccount {
        PlayerAccount::open("tester", Amount::from_minor_units(balance)).unwrap()
    }

    fn first_safe_tile(account: &PlayerAccount) -> u8 {
        let game = account.active_mines.as_ref().unwrap();
        (0..25).find(|t| !game.is_mine(*t)).unwrap()
    }

    fn first_mine(account: &PlayerAccount) -> u8 {
        account.active_mines.as_ref().unwrap().mine_positions()[0]
    }

    #[test]
    fn test_start_mines_debits_and_hides_seed() {
        let processor = processor();
        let mut account = account(1_000);
        let committed = account.seeds.next_server_seed_hash().to_string();

        let started = processor
            .start_mines(&mut account, Amount::from_minor_units(250), 3, None, Utc::now())
            .unwrap();

        assert_eq!(started.balance, Amount::from_minor_units(750));
        assert_eq!(started.fairness.server_seed_hash, committed);
        assert!(started.fairness.server_seed.is_none());
        assert_eq!(started.fairness.nonce, 0);
        assert_eq!(account.seeds.nonce(), 1);
        assert_eq!(account.stats.mines.games_played, 1);
    }

    #[test]
    fn test_start_mines_rejections_do_not_burn_nonce() {
        let processor = processor();
        let mut account = account(100);

        let err = processor
            .start_mines(&mut account, Amount::from_minor_units(500), 3, None, Utc::now())
            .unwrap_err();
        assert!(matches!(err, CrownwynnError::Session(SessionError::InsufficientBalance { .. })));
        assert!(err.to_string().ends_with("have 1.00, need 5.00"));

        let err = processor
            .start_mines(&mut account, Amount::from_minor_units(50), 25, None, Utc::now())
            .unwrap_err();
        assert!(matches!(err, CrownwynnError::Parameter(ParameterError::MineCount(25))));

        let err = processor
            .start_mines(&mut account, Amount::ZERO, 3, None, Utc::now())
            .unwrap_err();
        assert!(matches!(err, CrownwynnError::Session(SessionError::InvalidBet(_))));

        assert_eq!(account.seeds.nonce(), 0);
        assert_eq!(account.balance, Amount::from_minor_units(100));
    }

    #[test]
    fn test_only_one_active_mines_game() {
        let processor = processor();
        let mut account = account(1_000);
        processor
            .start_mines(&mut account, Amount::from_minor_units(100), 3, None, Utc::now())
            .unwrap();

        let err = processor
            .start_mines(&mut account, Amount::from_minor_units(100), 3, None, Utc::now())
            .unwrap_err();
        assert!(matches!(err, CrownwynnError::Session(SessionError::ActiveGameExists)));

        let err = processor.reroll_seeds(&mut account).unwrap_err();
        assert!(matches!(err, CrownwynnError::Session(SessionError::RerollDuringGame)));
    }

    #[test]
    fn test_hitting_mine_loses_and_reveals_seed() {
        let processor = processor();
        let mut account = account(1_000);
        let started = processor
            .start_mines(&mut account, Amount::from_minor_units(100), 5, None, Utc::now())
            .unwrap();

        let mine = first_mine(&account);
        let result = processor
            .reveal_tile(&mut account, &started.game_id, mine, Utc::now())
            .unwrap();

        assert!(result.hit_mine && result.game_over && !result.auto_win);
        assert_eq!(result.balance, Amount::from_minor_units(900));
        assert!(account.active_mines.is_none());
        assert_eq!(account.stats.mines.games_lost, 1);
        assert_eq!(account.stats.mines.current_streak, -1);

        let record = result.record.unwrap();
        assert_eq!(record.status, GameStatus::Lost);
        assert_eq!(record.net_profit, -100);
        assert!(verify_record(&record).is_valid);
    }

    #[test]
    fn test_cash_out_pays_current_multiplier() {
        let processor = processor();
        let mut account = account(1_000);
        let started = processor
            .start_mines(&mut account, Amount::from_minor_units(1_000), 3, None, Utc::now())
            .unwrap();

        let err = processor.cash_out(&mut account, &started.game_id, Utc::now()).unwrap_err();
        assert!(matches!(err, CrownwynnError::Session(SessionError::NothingToCashOut)));

        let tile = first_safe_tile(&account);
        let revealed = processor
            .reveal_tile(&mut account, &started.game_id, tile, Utc::now())
            .unwrap();
        assert!(!revealed.game_over);
        assert_eq!(revealed.current_multiplier, Multiplier::from_basis_points(11_250));
        assert_eq!(revealed.potential_payout, Amount::from_minor_units(1_125));

        let settled = processor.cash_out(&mut account, &started.game_id, Utc::now()).unwrap();
        assert_eq!(settled.balance, Amount::from_minor_units(1_125));
        let record = settled.record;
        assert_eq!(record.status, GameStatus::Won);
        assert_eq!(record.payout, Amount::from_minor_units(1_125));
        assert_eq!(account.balance, Amount::from_minor_units(1_125));
        assert_eq!(account.stats.mines.games_won, 1);

        let GameDetails::Mines { mine_positions, .. } = &record.details else {
            panic!("expected mines details");
        };
        let fairness = &record.fairness;
        assert!(verify_fairness(
            fairness.server_seed.as_deref().unwrap(),
            &fairness.client_seed,
            fairness.nonce,
            FairnessParams::Mines { mine_count: 3 },
            mine_positions,
        ));
    }

    #[test]
    fn test_unknown_game_id_rejected() {
        let processor = processor();
        let mut account = account(1_000);
        processor
            .start_mines(&mut account, Amount::from_minor_units(100), 3, None, Utc::now())
            .unwrap();

        let err = processor.reveal_tile(&mut account, "nope", 0, Utc::now()).unwrap_err();
        assert!(matches!(err, CrownwynnError::Session(SessionError::GameNotFound(_))));
    }

    #[test]
    fn test_clearing_board_auto_wins() {
        let processor = processor();
        let mut account = account(1_000);
        let started = processor
            .start_mines(&mut account, Amount::from_minor_units(100), 24, None, Utc::now())
            .unwrap();

        let tile = first_safe_tile(&account);
        let result = processor
            .reveal_tile(&mut account, &started.game_id, tile, Utc::now())
            .unwrap();

        assert!(result.game_over && result.auto_win && !result.hit_mine);
        assert_eq!(result.current_multiplier, Multiplier::from_basis_points(247_500));
        assert_eq!(account.balance, Amount::from_minor_units(900 + 2_475));
        assert!(account.active_mines.is_none());
    }

    #[test]
    fn test_keno_round_settles_immediately() {
        let processor = processor();
        let mut account = account(10_000);

        let settled = processor
            .play_keno(&mut account, Amount::from_minor_units(100), &[7, 3, 22], None, Utc::now())
            .unwrap();
        assert_eq!(settled.balance, account.balance);
        let record = settled.record;

        let GameDetails::Keno { numbers_selected, drawn_numbers, matches } = &record.details else {
            panic!("expected keno details");
        };
        assert_eq!(numbers_selected, &vec![3, 7, 22]);
        assert_eq!(drawn_numbers.len(), 10);
        assert_eq!(record.multiplier, processor.paytable().multiplier(3, *matches));
        assert_eq!(
            account.balance,
            Amount::from_minor_units(10_000 - 100 + record.payout.minor_units())
        );
        assert!(record.fairness.server_seed.is_some());
        assert!(verify_record(&record).is_valid);
        assert_eq!(account.stats.keno.games_played, 1);
        assert_eq!(account.seeds.nonce(), 1);
    }

    #[test]
    fn test_keno_and_mines_share_nonce_counter() {
        let processor = processor();
        let mut account = account(10_000);

        let keno = processor
            .play_keno(&mut account, Amount::from_minor_units(100), &[1], None, Utc::now())
            .unwrap();
        let mines = processor
            .start_mines(&mut account, Amount::from_minor_units(100), 1, None, Utc::now())
            .unwrap();

        assert_eq!(keno.record.fairness.nonce, 0);
        assert_eq!(mines.fairness.nonce, 1);
    }

    #[test]
    fn test_keno_rejects_bad_selection() {
        let processor = processor();
        let mut account = account(10_000);
        let err = processor
            .play_keno(&mut account, Amount::from_minor_units(100), &[1, 1], None, Utc::now())
            .unwrap_err();

        assert!(matches!(err, CrownwynnError::Parameter(ParameterError::DuplicateNumber(1))));
        assert_eq!(account.balance, Amount::from_minor_units(10_000));
    }
}
