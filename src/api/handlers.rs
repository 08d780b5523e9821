//! Request Handlers
//!
//! Thin adapters between JSON bodies and [`CasinoService`]; all game rules
//! live below this layer. Bodies are read through [`ApiJson`] so a malformed
//! request gets the same error shape as a rule violation.

use super::{
    errors::ApiError,
    middleware::{ApiJson, RequestId},
    models::*,
};
use crate::{
    errors::CrownwynnError,
    fairness::{recompute_outcome, verify_fairness, FairnessParams, VerificationReport},
    game_store::GameRecord,
    games::{
        keno::MAX_SPOTS,
        processor::{ActiveMinesView, GameSettled, MinesStarted, SeedsView, TileRevealed},
        seed_engine::commit,
    },
    services::{CasinoService, PlayerSummary},
};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use std::sync::Arc;

/// Shared application state
pub struct AppState {
    pub service: CasinoService,
    pub version: String,
}

type ApiResult<T> = Result<Json<T>, ApiError>;

fn core_error(request_id: &RequestId) -> impl FnOnce(CrownwynnError) -> ApiError + '_ {
    move |e| ApiError::from_core(request_id.0.clone(), e)
}

/// GET /health
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: state.version.clone(),
    })
}

/// GET /api/player/:player_id
pub async fn player_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(player_id): Path<String>,
) -> ApiResult<PlayerSummary> {
    let summary = state
        .service
        .player_summary(&player_id)
        .await
        .map_err(core_error(&request_id))?;
    Ok(Json(summary))
}

/// POST /api/mines/start
pub async fn start_mines_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<StartMinesRequest>,
) -> ApiResult<MinesStarted> {
    let started = state
        .service
        .start_mines(
            &request.player_id,
            request.bet_amount,
            request.mines_count,
            request.client_seed,
        )
        .await
        .map_err(core_error(&request_id))?;
    Ok(Json(started))
}

/// POST /api/mines/reveal
pub async fn reveal_tile_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<RevealTileRequest>,
) -> ApiResult<TileRevealed> {
    let revealed = state
        .service
        .reveal_tile(&request.player_id, &request.game_id, request.tile_position)
        .await
        .map_err(core_error(&request_id))?;
    Ok(Json(revealed))
}

/// POST /api/mines/cashout
pub async fn cashout_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<CashoutRequest>,
) -> ApiResult<GameSettled> {
    let settled = state
        .service
        .cash_out(&request.player_id, &request.game_id)
        .await
        .map_err(core_error(&request_id))?;
    Ok(Json(settled))
}

/// GET /api/mines/active/:player_id
pub async fn active_mines_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(player_id): Path<String>,
) -> ApiResult<ActiveGameResponse<ActiveMinesView>> {
    let game = state
        .service
        .active_mines(&player_id)
        .await
        .map_err(core_error(&request_id))?;
    Ok(Json(ActiveGameResponse {
        active: game.is_some(),
        game,
    }))
}

/// POST /api/keno/play
pub async fn play_keno_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<PlayKenoRequest>,
) -> ApiResult<GameSettled> {
    let settled = state
        .service
        .play_keno(
            &request.player_id,
            request.bet_amount,
            request.numbers_selected,
            request.client_seed,
        )
        .await
        .map_err(core_error(&request_id))?;
    Ok(Json(settled))
}

/// GET /api/keno/paytable
pub async fn paytable_handler(State(state): State<Arc<AppState>>) -> Json<PaytableResponse> {
    let paytable = state.service.paytable().clone();
    let expected_return = (1..=MAX_SPOTS)
        .map(|spots| SpotReturn {
            spots,
            expected_return: paytable.expected_return(spots),
        })
        .collect();

    Json(PaytableResponse {
        paytable,
        expected_return,
    })
}

/// POST /api/seeds/reroll
pub async fn reroll_seeds_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<RerollSeedsRequest>,
) -> ApiResult<SeedsView> {
    let seeds = state
        .service
        .reroll_seeds(&request.player_id)
        .await
        .map_err(core_error(&request_id))?;
    Ok(Json(seeds))
}

/// GET /api/seeds/next/:player_id
pub async fn next_seed_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(player_id): Path<String>,
) -> ApiResult<SeedsView> {
    let seeds = state
        .service
        .next_seed_hash(&player_id)
        .await
        .map_err(core_error(&request_id))?;
    Ok(Json(seeds))
}

/// GET /api/history/:player_id?game_type={mines|keno}&limit={n}
pub async fn history_handler(
    State(state): State<Arc<AppState>>,
    Path(player_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Json<HistoryResponse<GameRecord>> {
    let games = state.service.history(&player_id, query.game_type, query.limit);
    Json(HistoryResponse {
        player_id,
        count: games.len(),
        games,
    })
}

/// GET /api/verify/game/:game_id
pub async fn verify_game_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(game_id): Path<String>,
) -> ApiResult<VerificationReport> {
    let report = state.service.verify_game(&game_id).map_err(core_error(&request_id))?;
    Ok(Json(report))
}

fn public_verification(
    server_seed: &str,
    client_seed: &str,
    nonce: u64,
    params: FairnessParams,
    claimed: &[u8],
) -> VerifyResponse {
    VerifyResponse {
        is_valid: verify_fairness(server_seed, client_seed, nonce, params, claimed),
        server_seed_hash: commit(server_seed),
        params,
        expected_outcome: recompute_outcome(server_seed, client_seed, nonce, params).unwrap_or_default(),
    }
}

/// POST /api/verify/mines
pub async fn verify_mines_handler(ApiJson(request): ApiJson<VerifyMinesRequest>) -> Json<VerifyResponse> {
    Json(public_verification(
        &request.server_seed,
        &request.client_seed,
        request.nonce,
        FairnessParams::Mines {
            mine_count: request.mines_count,
        },
        &request.mine_positions,
    ))
}

/// POST /api/verify/keno
pub async fn verify_keno_handler(ApiJson(request): ApiJson<VerifyKenoRequest>) -> Json<VerifyResponse> {
    Json(public_verification(
        &request.server_seed,
        &request.client_seed,
        request.nonce,
        FairnessParams::Keno,
        &request.drawn_numbers,
    ))
}
