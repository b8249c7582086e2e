//! Game gateway: the host's join/leave/activity callbacks, delivered over HTTP.

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use validator::Validate;

use crate::error::AppError;
use crate::handlers::http::AppState;
use crate::middleware::GameSecret;
use crate::models::{Actor, ActorId, JoinRequest};

/// POST /game/players/:id/join
pub async fn player_join(
    _secret: GameSecret,
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(body): Json<JoinRequest>,
) -> Result<Json<Value>, AppError> {
    body.validate().map_err(|e| AppError::Validation(e.to_string()))?;
    let actor = Actor::new(id, body.name);
    let tracked = state.hooks.on_join(&actor).await;
    Ok(Json(json!({ "ok": true, "id": actor.id, "tracked": tracked })))
}

/// POST /game/players/:id/leave
pub async fn player_leave(
    _secret: GameSecret,
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Json<Value> {
    let tracked = state.hooks.on_leave(ActorId(id)).await;
    Json(json!({ "ok": true, "id": id, "tracked": tracked }))
}

/// POST /game/players/:id/activity: zero-payload activity signal from the client emitter.
pub async fn player_activity(
    _secret: GameSecret,
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Json<Value> {
    let recorded = state.hooks.on_activity(ActorId(id)).await;
    Json(json!({ "ok": true, "id": id, "recorded": recorded }))
}
