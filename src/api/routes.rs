//! Route Definitions
//!
//! Maps URLs to handlers with type-safe routing.

use super::handlers::*;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Build the API router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/player/:player_id", get(player_handler))
        // Mines session
        .route("/api/mines/start", post(start_mines_handler))
        .route("/api/mines/reveal", post(reveal_tile_handler))
        .route("/api/mines/cashout", post(cashout_handler))
        .route("/api/mines/active/:player_id", get(active_mines_handler))
        // Keno
        .route("/api/keno/play", post(play_keno_handler))
        .route("/api/keno/paytable", get(paytable_handler))
        // Seeds
        .route("/api/seeds/reroll", post(reroll_seeds_handler))
        .route("/api/seeds/next/:player_id", get(next_seed_handler))
        .route("/api/history/:player_id", get(history_handler))
        // Fairness
        .route("/api/verify/game/:game_id", get(verify_game_handler))
        .route("/api/verify/mines", post(verify_mines_handler))
        .route("/api/verify/keno", post(verify_keno_handler))
        .with_state(state)
}
