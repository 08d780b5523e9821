//! Keno outcome engine
//!
//! Ten numbers are drawn from 1..=40 with the shared hash stream
//! (`byte % 40 + 1`). Payouts come from a versioned paytable loaded from
//! configuration rather than derived from the odds.

use crate::errors::{ConfigurationError, ParameterError};
use crate::games::seed_engine::{collect_unique, HashStream, SeedPair};
use crate::games::types::{binomial, Multiplier};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::sync::OnceLock;

pub const KENO_NUMBERS: u8 = 40;
pub const KENO_DRAW_SIZE: usize = 10;
pub const MIN_SPOTS: usize = 1;
pub const MAX_SPOTS: usize = 10;

const _: () = assert!(KENO_DRAW_SIZE <= KENO_NUMBERS as usize);

/// Draw the ten winning numbers, ascending.
pub fn draw_keno_numbers(server_seed: &str, client_seed: &str, nonce: u64) -> Vec<u8> {
    collect_unique(
        HashStream::new(server_seed, client_seed, nonce),
        KENO_DRAW_SIZE,
        KENO_NUMBERS,
        1,
    )
}

/// Size of the intersection of the player's picks and the draw
pub fn count_matches(selected: &[u8], drawn: &[u8]) -> usize {
    let drawn: HashSet<u8> = drawn.iter().copied().collect();
    selected
        .iter()
        .copied()
        .collect::<BTreeSet<u8>>()
        .into_iter()
        .filter(|n| drawn.contains(n))
        .count()
}

/// Check a player's picks and return them sorted.
pub fn validate_selection(selected: &[u8]) -> Result<Vec<u8>, ParameterError> {
    if !(MIN_SPOTS..=MAX_SPOTS).contains(&selected.len()) {
        return Err(ParameterError::SpotCount(selected.len()));
    }

    let mut unique = BTreeSet::new();
    for &number in selected {
        if !(1..=KENO_NUMBERS).contains(&number) {
            return Err(ParameterError::NumberOutOfRange(number));
        }
        if !unique.insert(number) {
            return Err(ParameterError::DuplicateNumber(number));
        }
    }

    Ok(unique.into_iter().collect())
}

static DEFAULT_PAYTABLE: OnceLock<KenoPaytable> = OnceLock::new();

/// Multiplier from the built-in default paytable
pub fn keno_multiplier(spots_selected: usize, matches: usize) -> Multiplier {
    DEFAULT_PAYTABLE
        .get_or_init(KenoPaytable::default)
        .multiplier(spots_selected, matches)
}

/// One paying `(spots, matches)` combination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaytableEntry {
    pub spots: u8,
    pub matches: u8,
    pub multiplier: Multiplier,
}

/// Versioned Keno paytable. Pairs not listed pay nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KenoPaytable {
    pub version: String,
    pub payouts: Vec<PaytableEntry>,
}

impl Default for KenoPaytable {
    fn default() -> Self {
        const TABLE: &[(u8, &[(u8, f64)])] = &[
            (1, &[(1, 3.00)]),
            (2, &[(2, 12.00)]),
            (3, &[(2, 1.50), (3, 40.00)]),
            (4, &[(2, 1.00), (3, 4.00), (4, 100.00)]),
            (5, &[(3, 2.00), (4, 15.00), (5, 250.00)]),
            (6, &[(3, 1.50), (4, 4.00), (5, 50.00), (6, 500.00)]),
            (7, &[(4, 2.00), (5, 10.00), (6, 100.00), (7, 1000.00)]),
            (8, &[(5, 3.00), (6, 15.00), (7, 200.00), (8, 2000.00)]),
            (9, &[(5, 2.00), (6, 5.00), (7, 50.00), (8, 500.00), (9, 3000.00)]),
            (10, &[(5, 1.50), (6, 3.00), (7, 20.00), (8, 100.00), (9, 1000.00), (10, 5000.00)]),
        ];

        let payouts = TABLE
            .iter()
            .flat_map(|(spots, row)| {
                row.iter().map(move |(matches, multiplier)| PaytableEntry {
                    spots: *spots,
                    matches: *matches,
                    multiplier: Multiplier::from_basis_points((multiplier * Multiplier::SCALE as f64).round() as u64),
                })
            })
            .collect();

        Self {
            version: "v3".to_string(),
            payouts,
        }
    }
}

impl KenoPaytable {
    pub fn multiplier(&self, spots_selected: usize, matches: usize) -> Multiplier {
        self.payouts
            .iter()
            .find(|e| e.spots as usize == spots_selected && e.matches as usize == matches)
            .map(|e| e.multiplier)
            .unwrap_or(Multiplier::ZERO)
    }

    /// Largest multiplier available for a spot count
    pub fn max_multiplier(&self, spots_selected: usize) -> Multiplier {
        self.payouts
            .iter()
            .filter(|e| e.spots as usize == spots_selected)
            .map(|e| e.multiplier)
            .max()
            .unwrap_or(Multiplier::ZERO)
    }

    /// Theoretical return to player for a spot count, as a fraction of stake.
    ///
    /// P(k matches) = C(s, k) * C(40 - s, 10 - k) / C(40, 10)
    pub fn expected_return(&self, spots_selected: usize) -> f64 {
        if spots_selected > KENO_NUMBERS as usize {
            return 0.0;
        }
        let s = spots_selected as u64;
        let total = binomial(KENO_NUMBERS as u64, KENO_DRAW_SIZE as u64) as f64;

        (0..=s.min(KENO_DRAW_SIZE as u64))
            .map(|k| {
                let ways = binomial(s, k) * binomial(KENO_NUMBERS as u64 - s, KENO_DRAW_SIZE as u64 - k);
                ways as f64 / total * self.multiplier(spots_selected, k as usize).as_f64()
            })
            .sum()
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.version.trim().is_empty() {
            return Err(ConfigurationError::InvalidValue {
                field: "keno.paytable.version".to_string(),
                value: self.version.clone(),
                reason: "Paytable version cannot be empty".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for entry in &self.payouts {
            if !(MIN_SPOTS..=MAX_SPOTS).contains(&(entry.spots as usize)) {
                return Err(ConfigurationError::InvalidValue {
                    field: "keno.paytable.payouts.spots".to_string(),
                    value: entry.spots.to_string(),
                    reason: format!("Spots must be between {} and {}", MIN_SPOTS, MAX_SPOTS),
                });
            }
            if entry.matches > entry.spots {
                return Err(ConfigurationError::InvalidValue {
                    field: "keno.paytable.payouts.matches".to_string(),
                    value: entry.matches.to_string(),
                    reason: format!("Cannot match more than {} selected spots", entry.spots),
                });
            }
            if !seen.insert((entry.spots, entry.matches)) {
                return Err(ConfigurationError::ValidationFailed(format!(
                    "Duplicate paytable entry for {} spots / {} matches",
                    entry.spots, entry.matches
                )));
            }
        }

        Ok(())
    }
}

/// Fully resolved Keno round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KenoOutcome {
    pub numbers_selected: Vec<u8>,
    pub drawn_numbers: Vec<u8>,
    pub matches: usize,
    pub multiplier: Multiplier,
}

impl KenoOutcome {
    /// Draw, match and price a round in one pass.
    pub fn resolve(
        seeds: &SeedPair,
        selected: &[u8],
        paytable: &KenoPaytable,
    ) -> Result<Self, ParameterError> {
        let numbers_selected = validate_selection(selected)?;
        let drawn_numbers = draw_keno_numbers(&seeds.server_seed, &seeds.client_seed, seeds.nonce);
        let matches = count_matches(&numbers_selected, &drawn_numbers);
        let multiplier = paytable.multiplier(numbers_selected.len(), matches);

        Ok(Self {
            numbers_selected,
            drawn_numbers,
            matches,
            multiplier,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_is_ten_unique_numbers_in_range() {
        for nonce in 0..200 {
            let drawn = draw_keno_numbers("server", "client", nonce);
            assert_eq!(drawn.len(), KENO_DRAW_SIZE);
            assert!(drawn.windows(2).all(|w| w[0] < w[1]));
            assert!(drawn.iter().all(|&n| (1..=KENO_NUMBERS).contains(&n)));
        }
    }

    #[test]
    fn test_count_matches() {
        assert_eq!(count_matches(&[1, 2, 3], &[3, 4, 5, 1]), 2);
        assert_eq!(count_matches(&[], &[1, 2]), 0);
        assert_eq!(count_matches(&[7, 7], &[7]), 1);
    }

    #[test]
    fn test_selection_validation() {
        assert_eq!(validate_selection(&[5, 1, 3]).unwrap(), vec![1, 3, 5]);
        assert_eq!(validate_selection(&[]), Err(ParameterError::SpotCount(0)));
        assert_eq!(
            validate_selection(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11]),
            Err(ParameterError::SpotCount(11))
        );
        assert_eq!(validate_selection(&[0]), Err(ParameterError::NumberOutOfRange(0)));
        assert_eq!(validate_selection(&[41]), Err(ParameterError::NumberOutOfRange(41)));
        assert_eq!(validate_selection(&[4, 4]), Err(ParameterError::DuplicateNumber(4)));
    }

    #[test]
    fn test_default_paytable_lookups() {
        assert_eq!(keno_multiplier(10, 10), Multiplier::from_basis_points(50_000_000));
        assert_eq!(keno_multiplier(3, 2), Multiplier::from_basis_points(15_000));
        assert_eq!(keno_multiplier(1, 0), Multiplier::ZERO);
        assert_eq!(keno_multiplier(10, 4), Multiplier::ZERO);
        assert_eq!(keno_multiplier(11, 11), Multiplier::ZERO);
        assert_eq!(
            KenoPaytable::default().max_multiplier(10),
            keno_multiplier(10, 10)
        );
        assert!(KenoPaytable::default().validate().is_ok());
    }

    #[test]
    fn test_builtin_paytable_is_built_once() {
        keno_multiplier(5, 3);
        let first = DEFAULT_PAYTABLE.get().unwrap() as *const KenoPaytable;
        keno_multiplier(7, 4);
        assert_eq!(DEFAULT_PAYTABLE.get().unwrap() as *const KenoPaytable, first);
        assert_eq!(DEFAULT_PAYTABLE.get().unwrap(), &KenoPaytable::default());
    }

    #[test]
    fn test_zero_match_entries_pay() {
        let mut table = KenoPaytable::default();
        table.version = "low-volatility".to_string();
        table.payouts.push(PaytableEntry {
            spots: 10,
            matches: 0,
            multiplier: Multiplier::from_basis_points(20_000),
        });

        assert!(table.validate().is_ok());
        assert_eq!(table.multiplier(10, 0), Multiplier::from_basis_points(20_000));
    }

    #[test]
    fn test_paytable_validation_rejects_bad_entries() {
        let mut table = KenoPaytable::default();
        table.payouts.push(PaytableEntry {
            spots: 2,
            matches: 3,
            multiplier: Multiplier::ONE,
        });
        assert!(table.validate().is_err());

        let mut table = KenoPaytable::default();
        table.payouts.push(table.payouts[0].clone());
        assert!(table.validate().is_err());

        let mut table = KenoPaytable::default();
        table.version = " ".to_string();
        assert!(table.validate().is_err());
    }

    #[test]
    fn test_expected_return_single_spot() {
        // One spot hits with probability 10/40, paying 3x
        let rtp = KenoPaytable::default().expected_return(1);
        assert!((rtp - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_resolve_full_overlap() {
        let seeds = SeedPair {
            server_seed: "a".repeat(64),
            server_seed_hash: String::new(),
            client_seed: "b".repeat(64),
            nonce: 0,
        };
        let drawn = draw_keno_numbers(&seeds.server_seed, &seeds.client_seed, 0);
        let outcome = KenoOutcome::resolve(&seeds, &drawn, &KenoPaytable::default()).unwrap();

        assert_eq!(outcome.matches, 10);
        assert_eq!(outcome.multiplier, keno_multiplier(10, 10));
        assert_eq!(outcome.drawn_numbers, vec![1, 2, 6, 12, 15, 21, 26, 29, 30, 37]);
    }
}
