//! Staff presence relay.
//!
//! Tracks privileged actors inside a game session, posts `join` / `leave` / `inactive`
//! pings to a receiver with a shared secret, and runs that receiver: an in-game presence
//! map plus a staff shift clock that ends itself when the game reports leave or idleness.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

pub use config::{Config, TrackerSettings};
pub use error::AppError;
pub use handlers::http::AppState;
pub use services::{PresenceState, SessionHooks, ShiftService};

use axum::routing::{get, post};
use handlers::{game, http};
use tower_http::trace::TraceLayer;

/// Build the router (game gateway, presence webhook, shifts, health). Used by main and by
/// integration tests.
pub fn create_app(state: AppState) -> axum::Router {
    let game_routes = axum::Router::new()
        .route("/players/:id/join", post(game::player_join))
        .route("/players/:id/leave", post(game::player_leave))
        .route("/players/:id/activity", post(game::player_activity));

    let shift_routes = axum::Router::new()
        .route("/", get(http::list_shifts))
        .route("/:id/start", post(http::start_shift))
        .route("/:id/end", post(http::end_shift));

    axum::Router::new()
        .route("/roblox/presence", post(http::presence_webhook))
        .route("/health", get(http::health))
        .nest("/game", game_routes)
        .nest("/shifts", shift_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
