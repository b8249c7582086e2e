//! Presence notifier: fire-and-forget POST of `{roblox_id, event}` for tracked actors.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::NotifyError;
use crate::middleware::auth::HEADER_GAME_SECRET;
use crate::models::{ActorId, PresenceEventKind, PresencePayload};
use crate::services::rank::RankCache;

/// Delivers an already-encoded JSON body.
#[async_trait]
pub trait PresenceTransport: Send + Sync {
    async fn post(&self, body: String) -> Result<(), NotifyError>;
}

/// Single POST per event with the shared secret header. No timeout, no retry.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
    secret: String,
}

impl HttpTransport {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            secret: secret.into(),
        }
    }
}

#[async_trait]
impl PresenceTransport for HttpTransport {
    async fn post(&self, body: String) -> Result<(), NotifyError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(HEADER_GAME_SECRET, &self.secret)
            .body(body)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(NotifyError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct PresenceNotifier {
    ranks: RankCache,
    transport: Arc<dyn PresenceTransport>,
}

impl PresenceNotifier {
    pub fn new(ranks: RankCache, transport: Arc<dyn PresenceTransport>) -> Self {
        Self { ranks, transport }
    }

    /// Skips untracked actors silently. Failures are logged and the event is dropped.
    pub async fn notify(&self, actor: ActorId, event: PresenceEventKind) {
        if !self.ranks.is_tracked(actor).await {
            debug!(actor = %actor, event = %event, "not tracked; notification skipped");
            return;
        }

        let body = match serde_json::to_string(&PresencePayload::new(actor, event)) {
            Ok(body) => body,
            Err(e) => {
                warn!(actor = %actor, event = %event, error = %NotifyError::from(e), "notification dropped");
                return;
            }
        };

        match self.transport.post(body).await {
            Ok(()) => info!(actor = %actor, event = %event, "presence sent"),
            Err(e) => warn!(actor = %actor, event = %event, error = %e, "notification dropped"),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::services::rank::tests::FixedRanks;
    use std::sync::Mutex;

    /// Captures every body it is asked to post.
    #[derive(Default)]
    pub(crate) struct RecordingTransport {
        pub sent: Mutex<Vec<PresencePayload>>,
        pub fail: bool,
    }

    impl RecordingTransport {
        pub fn events_for(&self, actor: ActorId) -> Vec<PresenceEventKind> {
            let id = actor.to_string();
            self.sent
                .lock()
                .unwrap()
                .iter()
                .filter(|p| p.roblox_id == id)
                .map(|p| p.event)
                .collect()
        }

        pub fn total(&self) -> usize {
            self.sent.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl PresenceTransport for RecordingTransport {
        async fn post(&self, body: String) -> Result<(), NotifyError> {
            let payload: PresencePayload = serde_json::from_str(&body)?;
            self.sent.lock().unwrap().push(payload);
            if self.fail {
                return Err(NotifyError::Status {
                    status: 500,
                    body: "boom".to_string(),
                });
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn untracked_actor_is_skipped() {
        let ranks = RankCache::new(Arc::new(FixedRanks::with(&[(2, 50)])), 7, 121);
        let transport = Arc::new(RecordingTransport::default());
        let notifier = PresenceNotifier::new(ranks, transport.clone());

        notifier.notify(ActorId(2), PresenceEventKind::Join).await;
        assert_eq!(transport.total(), 0);
    }

    #[tokio::test]
    async fn tracked_actor_is_posted() {
        let ranks = RankCache::new(Arc::new(FixedRanks::with(&[(1, 121)])), 7, 121);
        let transport = Arc::new(RecordingTransport::default());
        let notifier = PresenceNotifier::new(ranks, transport.clone());

        notifier.notify(ActorId(1), PresenceEventKind::Join).await;
        assert_eq!(transport.events_for(ActorId(1)), vec![PresenceEventKind::Join]);
    }

    #[tokio::test]
    async fn transport_failure_is_swallowed() {
        let ranks = RankCache::new(Arc::new(FixedRanks::with(&[(1, 121)])), 7, 121);
        let transport = Arc::new(RecordingTransport {
            fail: true,
            ..Default::default()
        });
        let notifier = PresenceNotifier::new(ranks, transport.clone());

        notifier.notify(ActorId(1), PresenceEventKind::Leave).await;
        notifier.notify(ActorId(1), PresenceEventKind::Leave).await;
        assert_eq!(transport.total(), 2);
    }
}
