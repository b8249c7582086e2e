//! Entry point: load config, wire dependencies, and run the server.

use staffclock::config::Config;
use staffclock::services::{GroupRankLookup, HttpTransport, PresenceState, SessionHooks, ShiftService};
use staffclock::{create_app, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("config: {}", e))?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    if config.game_secret.is_empty() {
        tracing::warn!("GAME_SECRET is not set; presence webhook accepts unauthenticated callers");
    }
    if config.group_id == 0 {
        tracing::warn!("GROUP_ID is not set; no actor will be tracked");
    }

    let client = reqwest::Client::builder().build()?;
    let lookup = Arc::new(GroupRankLookup::new(client.clone(), config.groups_api.clone()));
    let transport = Arc::new(HttpTransport::new(
        client,
        config.notify_endpoint.clone(),
        config.game_secret.clone(),
    ));
    let hooks = SessionHooks::new(
        lookup,
        transport,
        config.group_id,
        config.min_rank,
        config.tracker,
    );

    let presence = PresenceState::new();
    let shifts = ShiftService::new(presence.clone());

    let state = AppState {
        game_secret: config.game_secret.clone(),
        hooks,
        presence,
        shifts,
        inactivity_threshold: config.tracker.inactivity_threshold,
    };

    let app = create_app(state);

    tracing::info!(
        addr = %config.server_addr,
        endpoint = %config.notify_endpoint,
        group_id = config.group_id,
        min_rank = config.min_rank,
        threshold_secs = config.tracker.inactivity_threshold.as_secs(),
        poll_secs = config.tracker.poll_interval.as_secs(),
        throttle_secs = config.tracker.throttle_window.as_secs(),
        "listening"
    );
    let listener = tokio::net::TcpListener::bind(config.server_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
