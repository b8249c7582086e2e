//! Shared-secret check for game-facing routes.

use axum::http::request::Parts;
use tracing::debug;

use crate::error::AppError;
use crate::handlers::http::AppState;

/// Header carrying the static shared secret.
pub const HEADER_GAME_SECRET: &str = "x-game-secret";

/// Extractor: succeeds when `x-game-secret` matches the configured secret, or when no
/// secret is configured at all.
#[derive(Clone, Copy, Debug)]
pub struct GameSecret;

#[axum::async_trait]
impl axum::extract::FromRequestParts<AppState> for GameSecret {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if state.game_secret.is_empty() {
            return Ok(GameSecret);
        }
        let provided = parts
            .headers
            .get(HEADER_GAME_SECRET)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if provided != state.game_secret {
            debug!("rejected request: invalid or missing x-game-secret");
            return Err(AppError::Auth("unauthorized".to_string()));
        }
        Ok(GameSecret)
    }
}
