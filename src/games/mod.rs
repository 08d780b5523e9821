pub mod types;
pub mod seed_engine;
pub mod mines;
pub mod keno;
pub mod processor;

pub use types::*;
pub use seed_engine::{commit, new_client_seed, new_server_seed, PlayerSeeds, SeedPair};
pub use mines::{generate_mine_positions, mines_multiplier, MinesGame, MinesPayoutCurve};
pub use keno::{count_matches, draw_keno_numbers, keno_multiplier, KenoPaytable};
pub use processor::GameProcessor;
