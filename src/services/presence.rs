//! Receiver-side presence: who is currently in the game.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

#[derive(Clone, Default)]
pub struct PresenceState {
    in_game: Arc<RwLock<HashMap<u64, bool>>>,
}

impl PresenceState {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn mark_join(&self, member_id: u64) {
        self.in_game.write().await.insert(member_id, true);
        info!(member_id, "presence: in game");
    }

    pub async fn mark_leave(&self, member_id: u64) {
        self.in_game.write().await.insert(member_id, false);
        info!(member_id, "presence: left game");
    }

    /// Unknown members are not in game.
    pub async fn is_in_game(&self, member_id: u64) -> bool {
        self.in_game
            .read()
            .await
            .get(&member_id)
            .copied()
            .unwrap_or(false)
    }
}
