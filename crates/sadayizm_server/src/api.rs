//! HTTP handlers for the troll list.
//!
//! Endpoints:
//! - GET    /api/trolls            list; `?q=` searches, `?id=` fetches one
//! - POST   /api/trolls            create
//! - PUT    /api/trolls?id=<n>     replace editable fields
//! - DELETE /api/trolls?id=<n>     hard delete
//! - OPTIONS /api/trolls           200, for non-preflight requests
//! - GET    /api/elo               ranked ELO board; `?steamId64=` rates one player
//! - GET    /api/diagnostics       live store self-test
//!
//! Store calls are synchronous and run on the blocking pool.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sadayizm_core::elo::is_steam_id64;
use sadayizm_core::{
    run_diagnostics, DiagnosticsReport, Troll, TrollId, TrollInput, TrollServiceError,
};
use log::debug;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::error::{
    ApiError, MSG_ID_REQUIRED, MSG_INVALID_BODY, MSG_STEAM_ID64_REQUIRED,
};
use crate::state::{AppState, SharedService};

/// Query params accepted on `/api/trolls`.
#[derive(Debug, Default, Deserialize)]
pub struct TrollQuery {
    pub id: Option<String>,
    pub q: Option<String>,
}

impl TrollQuery {
    fn required_id(&self) -> Result<TrollId, ApiError> {
        self.id
            .as_deref()
            .and_then(|raw| raw.trim().parse::<TrollId>().ok())
            .ok_or(ApiError::BadRequest(MSG_ID_REQUIRED))
    }
}

/// GET /api/trolls
pub async fn list_trolls(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TrollQuery>,
) -> Result<Response, ApiError> {
    if query.id.is_some() {
        let id = query.required_id()?;
        let troll = with_store(&state, move |trolls| trolls.get(id))
            .await?
            .ok_or(ApiError::NotFound)?;
        return Ok(Json(troll).into_response());
    }

    let trolls = match query.q {
        Some(text) => with_store(&state, move |trolls| trolls.search(&text)).await?,
        None => with_store(&state, |trolls| trolls.list()).await?,
    };
    Ok(Json(trolls).into_response())
}

/// POST /api/trolls
pub async fn create_troll(
    State(state): State<Arc<AppState>>,
    body: Result<Json<TrollInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Troll>), ApiError> {
    let input = troll_input(body)?;
    let troll = with_store(&state, move |trolls| trolls.add(&input)).await?;
    Ok((StatusCode::CREATED, Json(troll)))
}

/// PUT /api/trolls?id=<n>
pub async fn update_troll(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TrollQuery>,
    body: Result<Json<TrollInput>, JsonRejection>,
) -> Result<Json<Troll>, ApiError> {
    let id = query.required_id()?;
    let input = troll_input(body)?;
    let troll = with_store(&state, move |trolls| trolls.update(id, &input)).await?;
    Ok(Json(troll))
}

/// DELETE /api/trolls?id=<n>
pub async fn delete_troll(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TrollQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = query.required_id()?;
    with_store(&state, move |trolls| trolls.delete(id)).await?;
    Ok(Json(json!({ "message": "Troll eliminado" })))
}

/// OPTIONS /api/trolls
pub async fn options_ok() -> StatusCode {
    StatusCode::OK
}

/// Query params accepted on `/api/elo`.
#[derive(Debug, Default, Deserialize)]
pub struct EloQuery {
    #[serde(rename = "steamId64")]
    pub steam_id64: Option<String>,
}

/// GET /api/elo, or GET /api/elo?steamId64=<n> for a single player
pub async fn elo_board(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EloQuery>,
) -> Result<Response, ApiError> {
    let Some(raw) = query.steam_id64 else {
        return Ok(Json(state.elo.board().await).into_response());
    };

    let steam_id64 = raw.trim();
    if !is_steam_id64(steam_id64) {
        return Err(ApiError::BadRequest(MSG_STEAM_ID64_REQUIRED));
    }
    Ok(Json(state.elo.lookup_by_steam64(steam_id64).await).into_response())
}

/// GET /api/diagnostics
pub async fn diagnostics(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DiagnosticsReport>, ApiError> {
    let report = tokio::task::spawn_blocking(move || run_diagnostics(&state.trolls))
        .await
        .map_err(|err| ApiError::Internal(format!("diagnostics task failed: {err}")))?;
    Ok(Json(report))
}

/// GET /health
pub async fn health() -> &'static str {
    "ok"
}

/// Unwraps a JSON body, turning any extractor rejection into a 400.
fn troll_input(body: Result<Json<TrollInput>, JsonRejection>) -> Result<TrollInput, ApiError> {
    body.map(|Json(input)| input).map_err(|rejection| {
        debug!(
            "event=api_request module=server status=rejected reason={}",
            rejection.body_text()
        );
        ApiError::BadRequest(MSG_INVALID_BODY)
    })
}

async fn with_store<T, F>(state: &Arc<AppState>, op: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&SharedService) -> Result<T, TrollServiceError> + Send + 'static,
{
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || op(&state.trolls))
        .await
        .map_err(|err| ApiError::Internal(format!("store task failed: {err}")))?
        .map_err(ApiError::from)
}
