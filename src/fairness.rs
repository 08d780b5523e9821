//! Fairness verification: recompute an outcome from disclosed seeds.
//!
//! Everything here is pure. It needs no stored state beyond the seeds and
//! game parameters, so it is safe to expose outside the player session.

use crate::{
    game_store::{GameDetails, GameRecord},
    games::{
        keno::draw_keno_numbers,
        mines::generate_mine_positions,
        seed_engine::commit,
    },
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Game parameters needed to recompute an outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "game", rename_all = "lowercase")]
pub enum FairnessParams {
    Mines { mine_count: u8 },
    Keno,
}

/// Recompute the outcome for `params` and compare it, as a set, with `claimed`.
///
/// Invalid parameters simply fail verification.
pub fn verify_fairness(
    server_seed: &str,
    client_seed: &str,
    nonce: u64,
    params: FairnessParams,
    claimed: &[u8],
) -> bool {
    match recompute_outcome(server_seed, client_seed, nonce, params) {
        Some(actual) => same_set(&actual, claimed),
        None => false,
    }
}

/// The outcome the seeds produce, or `None` for invalid parameters.
pub fn recompute_outcome(
    server_seed: &str,
    client_seed: &str,
    nonce: u64,
    params: FairnessParams,
) -> Option<Vec<u8>> {
    match params {
        FairnessParams::Mines { mine_count } => {
            generate_mine_positions(server_seed, client_seed, nonce, mine_count).ok()
        }
        FairnessParams::Keno => Some(draw_keno_numbers(server_seed, client_seed, nonce)),
    }
}

fn same_set(a: &[u8], b: &[u8]) -> bool {
    a.iter().collect::<BTreeSet<_>>() == b.iter().collect::<BTreeSet<_>>()
}

/// Full audit of a finished game
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    pub game_id: String,
    pub is_valid: bool,
    /// `commit(server_seed)` equals the hash shown before the game
    pub commitment_valid: bool,
    /// Recomputed outcome equals the stored one
    pub outcome_valid: bool,
    pub server_seed: String,
    pub server_seed_hash: String,
    pub client_seed: String,
    pub nonce: u64,
    pub params: FairnessParams,
    pub recorded_outcome: Vec<u8>,
    pub recomputed_outcome: Vec<u8>,
}

/// Check both the seed commitment and the outcome of a completed game.
pub fn verify_record(record: &GameRecord) -> VerificationReport {
    let (params, recorded_outcome) = match &record.details {
        GameDetails::Mines {
            mines_count,
            mine_positions,
            ..
        } => (
            FairnessParams::Mines {
                mine_count: *mines_count,
            },
            mine_positions.clone(),
        ),
        GameDetails::Keno { drawn_numbers, .. } => (FairnessParams::Keno, drawn_numbers.clone()),
    };

    let fairness = &record.fairness;
    let server_seed = fairness.server_seed.clone().unwrap_or_default();
    let commitment_valid = commit(&server_seed) == fairness.server_seed_hash;
    let recomputed_outcome =
        recompute_outcome(&server_seed, &fairness.client_seed, fairness.nonce, params).unwrap_or_default();
    let outcome_valid = same_set(&recomputed_outcome, &recorded_outcome);

    VerificationReport {
        game_id: record.game_id.clone(),
        is_valid: commitment_valid && outcome_valid,
        commitment_valid,
        outcome_valid,
        server_seed_hash: fairness.server_seed_hash.clone(),
        server_seed,
        client_seed: fairness.client_seed.clone(),
        nonce: fairness.nonce,
        params,
        recorded_outcome,
        recomputed_outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeds() -> (String, String) {
        ("a".repeat(64), "b".repeat(64))
    }

    #[test]
    fn test_verify_accepts_true_outcome_in_any_order() {
        let (server, client) = seeds();
        let params = FairnessParams::Mines { mine_count: 3 };
        assert!(verify_fairness(&server, &client, 0, params, &[3, 11, 15]));
        assert!(verify_fairness(&server, &client, 0, params, &[15, 3, 11]));
    }

    #[test]
    fn test_verify_rejects_changed_inputs() {
        let (server, client) = seeds();
        let params = FairnessParams::Mines { mine_count: 3 };
        let claimed = [3, 11, 15];

        let mut tampered = server.clone();
        tampered.replace_range(0..1, "b");

        assert!(!verify_fairness(&tampered, &client, 0, params, &claimed));
        assert!(!verify_fairness(&server, &client, 1, params, &claimed));
        assert!(!verify_fairness(&server, "c", 0, params, &claimed));
        assert!(!verify_fairness(&server, &client, 0, params, &[3, 11]));
    }

    #[test]
    fn test_verify_keno() {
        let (server, client) = seeds();
        let drawn = draw_keno_numbers(&server, &client, 5);
        assert!(verify_fairness(&server, &client, 5, FairnessParams::Keno, &drawn));
        assert!(!verify_fairness(&server, &client, 6, FairnessParams::Keno, &drawn));
    }

    #[test]
    fn test_invalid_params_fail_verification() {
        let (server, client) = seeds();
        assert!(!verify_fairness(
            &server,
            &client,
            0,
            FairnessParams::Mines { mine_count: 0 },
            &[]
        ));
    }

    #[test]
    fn test_verification_is_idempotent() {
        let (server, client) = seeds();
        let params = FairnessParams::Mines { mine_count: 3 };
        let first = verify_fairness(&server, &client, 0, params, &[3, 11, 15]);
        for _ in 0..5 {
            assert_eq!(verify_fairness(&server, &client, 0, params, &[3, 11, 15]), first);
        }
    }

    #[test]
    fn test_params_serde_shape() {
        let json = serde_json::to_value(FairnessParams::Mines { mine_count: 4 }).unwrap();
        assert_eq!(json, serde_json::json!({"game": "mines", "mine_count": 4}));
        let keno: FairnessParams = serde_json::from_str(r#"{"game":"keno"}"#).unwrap();
        assert_eq!(keno, FairnessParams::Keno);
    }
}
