//! HTTP handlers: presence webhook, shift clock, and health.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::middleware::GameSecret;
use crate::models::{ActiveShift, PresenceEventKind, PresenceWebhook, ShiftSummary};
use crate::services::{PresenceState, SessionHooks, ShiftService};

/// Shared application state for the gateway and receiver routes.
#[derive(Clone)]
pub struct AppState {
    /// Expected `x-game-secret`; empty accepts every caller.
    pub game_secret: String,
    pub hooks: SessionHooks,
    pub presence: PresenceState,
    pub shifts: ShiftService,
    /// Idle threshold, quoted in the auto-end reason.
    pub inactivity_threshold: Duration,
}

/// Accepts a JSON number or a numeric string.
fn parse_member_id(raw: &Value) -> AppResult<u64> {
    let invalid = || AppError::Validation("invalid roblox_id".to_string());
    match raw {
        Value::Number(n) => n.as_u64().ok_or_else(invalid),
        Value::String(s) => s.trim().parse().map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

/// Null, empty strings and a numeric zero all count as a missing id.
fn is_blank(raw: &Value) -> bool {
    match raw {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        _ => false,
    }
}

/// Auto-end reason for an `inactive` ping. Whole minutes, rounded up, from one minute on.
fn idle_reason(threshold: Duration) -> String {
    let secs = threshold.as_secs();
    match secs {
        0..=59 => format!("were inactive in Roblox for {} seconds", secs),
        60 => "were inactive in Roblox for 1 minute".to_string(),
        _ => format!("were inactive in Roblox for {} minutes", secs.div_ceil(60)),
    }
}

/// POST /roblox/presence: presence ping from the game.
/// Requires header `x-game-secret` when a secret is configured.
pub async fn presence_webhook(
    _secret: GameSecret,
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let hook: PresenceWebhook = serde_json::from_slice(&body)?;

    let event = hook
        .event
        .as_deref()
        .and_then(|e| e.parse::<PresenceEventKind>().ok());
    let (raw_id, event) = match (hook.roblox_id, event) {
        (Some(raw_id), Some(event)) if !is_blank(&raw_id) => (raw_id, event),
        _ => return Err(AppError::Validation("missing or invalid fields".to_string())),
    };
    let member_id = parse_member_id(&raw_id)?;

    let ended = match event {
        PresenceEventKind::Join => {
            state.presence.mark_join(member_id).await;
            None
        }
        PresenceEventKind::Leave => {
            state.presence.mark_leave(member_id).await;
            state
                .shifts
                .auto_end_for_inactivity(member_id, "left the Roblox game")
                .await
        }
        PresenceEventKind::Inactive => {
            let reason = idle_reason(state.inactivity_threshold);
            state.shifts.auto_end_for_inactivity(member_id, &reason).await
        }
    };
    info!(member_id, event = %event, "presence webhook");
    if let Some(summary) = &ended {
        info!(member_id, duration = %summary.duration, reason = %summary.reason, "shift auto-ended");
    }

    Ok(Json(json!({
        "ok": true,
        "event": event,
        "id": member_id.to_string(),
        "shift_ended": ended,
    })))
}

/// POST /shifts/:id/start: manual clock-in; the member must be in the game.
pub async fn start_shift(
    _secret: GameSecret,
    State(state): State<AppState>,
    Path(member_id): Path<u64>,
) -> Result<Json<ActiveShift>, AppError> {
    let shift = state.shifts.start(member_id, true).await?;
    Ok(Json(shift))
}

/// POST /shifts/:id/end
pub async fn end_shift(
    _secret: GameSecret,
    State(state): State<AppState>,
    Path(member_id): Path<u64>,
) -> Result<Json<ShiftSummary>, AppError> {
    state
        .shifts
        .end(member_id, "Manual end")
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("member {} has no active shift", member_id)))
}

/// GET /shifts
pub async fn list_shifts(
    _secret: GameSecret,
    State(state): State<AppState>,
) -> Json<Vec<ActiveShift>> {
    Json(state.shifts.list().await)
}

/// GET /health: liveness check.
pub async fn health() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "service": "staffclock" })),
    )
}
