//! End-to-end game flows through `CasinoService`

use crownwynn::{
    commit,
    config::CasinoConfig,
    errors::{CrownwynnError, SessionError},
    game_store::GameDetails,
    games::{
        processor::GameProcessor,
        types::{Amount, GameStatus, GameType},
    },
    state_manager::PlayerAccount,
    verify_fairness, CasinoService, FairnessParams,
};
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;

fn service() -> CasinoService {
    CasinoService::from_config(&CasinoConfig::default())
}

#[tokio::test]
async fn test_mines_commitment_holds_through_cashout() {
    let service = service();
    // Rerolling opens the account and shows the first commitment
    let committed = service.reroll_seeds("alice").await.unwrap().next_server_seed_hash;
    assert_eq!(service.next_seed_hash("alice").await.unwrap().next_server_seed_hash, committed);

    let started = service
        .start_mines("alice", Amount::from_minor_units(500), 3, Some("my-lucky-seed".to_string()))
        .await
        .unwrap();
    assert_eq!(started.fairness.server_seed_hash, committed);
    assert_eq!(started.fairness.client_seed, "my-lucky-seed");

    // Tile 0 either ends the game on a mine or lets us cash out
    let revealed = service.reveal_tile("alice", &started.game_id, 0).await.unwrap();
    let record = if revealed.game_over {
        assert!(revealed.hit_mine);
        revealed.record.unwrap()
    } else {
        let settled = service.cash_out("alice", &started.game_id).await.unwrap();
        assert_eq!(settled.record.status, GameStatus::Won);
        assert_eq!(settled.record.payout, Amount::from_minor_units(562));
        settled.record
    };

    let server_seed = record.fairness.server_seed.clone().unwrap();
    assert_eq!(commit(&server_seed), committed);

    let GameDetails::Mines { mine_positions, .. } = &record.details else {
        panic!("expected a mines record");
    };
    assert!(verify_fairness(
        &server_seed,
        "my-lucky-seed",
        record.fairness.nonce,
        FairnessParams::Mines { mine_count: 3 },
        mine_positions,
    ));

    // The next game is bound to a fresh commitment
    let next = service.next_seed_hash("alice").await.unwrap();
    assert_ne!(next.next_server_seed_hash, committed);
    assert_eq!(next.nonce, 1);
    assert!(service.verify_game(&record.game_id).unwrap().is_valid);
}

#[test]
fn test_twenty_four_mines_single_safe_tile_auto_wins() {
    let processor = GameProcessor::from_config(&CasinoConfig::default());
    let mut account = PlayerAccount::open("bob", Amount::from_minor_units(1_000)).unwrap();

    let started = processor
        .start_mines(&mut account, Amount::from_minor_units(100), 24, None, Utc::now())
        .unwrap();
    let game = account.active_mines.as_ref().unwrap();
    let safe = (0..25).find(|t| !game.is_mine(*t)).unwrap();

    let won = processor
        .reveal_tile(&mut account, &started.game_id, safe, Utc::now())
        .unwrap();
    assert!(won.game_over && won.auto_win);
    assert_eq!(won.current_multiplier.basis_points(), 247_500);
    assert_eq!(won.potential_payout, Amount::from_minor_units(2_475));
    assert_eq!(won.balance, Amount::from_minor_units(900 + 2_475));
    assert_eq!(won.record.unwrap().status, GameStatus::Won);
    assert!(account.active_mines.is_none());
}

#[tokio::test]
async fn test_twenty_four_mines_first_reveal_always_ends_game() {
    let service = service();

    for round in 0..10 {
        let started = service
            .start_mines("bob", Amount::from_minor_units(100), 24, None)
            .await
            .unwrap();
        let revealed = service.reveal_tile("bob", &started.game_id, round).await.unwrap();

        assert!(revealed.game_over);
        assert_ne!(revealed.hit_mine, revealed.auto_win);
        assert!(service.active_mines("bob").await.unwrap().is_none());
    }

    assert_eq!(service.history("bob", Some(GameType::Mines), 50).len(), 10);
}

#[tokio::test]
async fn test_keno_round_records_history_and_stats() {
    let service = service();
    let before = CasinoConfig::default().players.starting_balance;

    let settled = service
        .play_keno("carol", Amount::from_minor_units(200), vec![40, 1, 20, 13], None)
        .await
        .unwrap();
    let record = &settled.record;

    let GameDetails::Keno {
        numbers_selected,
        drawn_numbers,
        matches,
    } = &record.details
    else {
        panic!("expected a keno record");
    };
    assert_eq!(numbers_selected, &vec![1, 13, 20, 40]);
    assert_eq!(drawn_numbers.len(), 10);
    assert_eq!(
        record.status,
        if record.multiplier.is_zero() { GameStatus::Lost } else { GameStatus::Won }
    );
    assert_eq!(*matches, numbers_selected.iter().filter(|n| drawn_numbers.contains(n)).count());

    let summary = service.player_summary("carol").await.unwrap();
    assert_eq!(
        summary.balance.minor_units(),
        before.minor_units() - 200 + record.payout.minor_units()
    );
    assert_eq!(summary.stats.keno.games_played, 1);
    assert_eq!(summary.stats.mines.games_played, 0);

    let history = service.history("carol", Some(GameType::Keno), 10);
    assert_eq!(history.len(), 1);
    assert!(service.history("carol", Some(GameType::Mines), 10).is_empty());
}

#[tokio::test]
async fn test_reroll_rules() {
    let service = service();
    let before = service.reroll_seeds("dave").await.unwrap();

    let rerolled = service.reroll_seeds("dave").await.unwrap();
    assert_ne!(rerolled.client_seed, before.client_seed);
    assert_ne!(rerolled.next_server_seed_hash, before.next_server_seed_hash);
    assert_eq!(rerolled.seed_games_played, 0);

    service
        .start_mines("dave", Amount::from_minor_units(100), 5, None)
        .await
        .unwrap();
    let err = service.reroll_seeds("dave").await.unwrap_err();
    assert!(matches!(err, CrownwynnError::Session(SessionError::RerollDuringGame)));
}

#[tokio::test]
async fn test_concurrent_rounds_get_unique_nonces() {
    let service = Arc::new(service());
    let mut handles = Vec::new();

    for i in 0..40 {
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(async move {
            let numbers = vec![(i % 40) as u8 + 1];
            service
                .play_keno("erin", Amount::from_minor_units(10), numbers, None)
                .await
                .unwrap()
                .record
                .fairness
                .nonce
        }));
    }

    let mut nonces = HashSet::new();
    for handle in handles {
        assert!(nonces.insert(handle.await.unwrap()));
    }
    assert_eq!(nonces, (0..40).collect::<HashSet<u64>>());

    let summary = service.player_summary("erin").await.unwrap();
    assert_eq!(summary.seeds.nonce, 40);
    assert_eq!(summary.stats.keno.games_played, 40);
}

#[tokio::test]
async fn test_players_do_not_share_state() {
    let service = service();
    service
        .start_mines("frank", Amount::from_minor_units(100), 3, None)
        .await
        .unwrap();

    assert!(service.active_mines("grace").await.unwrap().is_none());
    assert!(service.active_mines("frank").await.unwrap().is_some());
    assert!(matches!(
        service.next_seed_hash("grace").await.unwrap_err(),
        CrownwynnError::Session(SessionError::PlayerNotFound(_))
    ));

    service.reroll_seeds("grace").await.unwrap();
    assert_eq!(service.next_seed_hash("grace").await.unwrap().nonce, 0);
}
