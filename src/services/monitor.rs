//! Inactivity monitor: one lightweight task per tracked actor.
//!
//! Each task sleeps for the poll interval, then asks the activity tracker whether the idle
//! threshold was crossed. The task stops as soon as its actor's entry is gone or replaced by
//! a newer session, and `stop` also aborts it outright.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::models::{generate_session_id, ActorId, PresenceEventKind, SessionId};
use crate::services::activity::ActivityTracker;
use crate::services::notifier::PresenceNotifier;

struct MonitorEntry {
    session: SessionId,
    handle: JoinHandle<()>,
}

#[derive(Clone)]
pub struct InactivityMonitor {
    activity: ActivityTracker,
    notifier: PresenceNotifier,
    poll_interval: Duration,
    threshold: Duration,
    tasks: Arc<RwLock<HashMap<ActorId, MonitorEntry>>>,
}

impl InactivityMonitor {
    pub fn new(
        activity: ActivityTracker,
        notifier: PresenceNotifier,
        poll_interval: Duration,
        threshold: Duration,
    ) -> Self {
        Self {
            activity,
            notifier,
            poll_interval,
            threshold,
            tasks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Start monitoring `actor`, replacing any monitor left over from an earlier session.
    pub async fn start(&self, actor: ActorId) -> SessionId {
        let session = generate_session_id();
        let mut tasks = self.tasks.write().await;

        let this = self.clone();
        let handle = tokio::spawn(async move { this.run(actor, session).await });

        if let Some(old) = tasks.insert(actor, MonitorEntry { session, handle }) {
            old.handle.abort();
            debug!(actor = %actor, "replaced stale monitor");
        }
        info!(actor = %actor, session = %session, "monitor started");
        session
    }

    /// Drop the actor's monitor entry and abort its task.
    pub async fn stop(&self, actor: ActorId) {
        if let Some(entry) = self.tasks.write().await.remove(&actor) {
            entry.handle.abort();
            debug!(actor = %actor, session = %entry.session, "monitor stopped");
        }
    }

    pub async fn is_running(&self, actor: ActorId) -> bool {
        self.tasks.read().await.contains_key(&actor)
    }

    /// One poll. `None` once `session` is no longer the actor's current monitor.
    ///
    /// The session check and the idle check share one read guard on `tasks`, so `stop`
    /// cannot land between them and a stopped monitor never re-creates an activity record.
    async fn check(&self, actor: ActorId, session: SessionId) -> Option<bool> {
        let tasks = self.tasks.read().await;
        if !tasks.get(&actor).is_some_and(|entry| entry.session == session) {
            return None;
        }
        Some(self.activity.poll_idle(actor, self.threshold).await)
    }

    async fn run(self, actor: ActorId, session: SessionId) {
        loop {
            tokio::time::sleep(self.poll_interval).await;
            let Some(idle) = self.check(actor, session).await else {
                break;
            };
            if idle {
                info!(actor = %actor, threshold_secs = self.threshold.as_secs(), "actor inactive");
                self.notifier.notify(actor, PresenceEventKind::Inactive).await;
            }
        }
        debug!(actor = %actor, session = %session, "monitor exited");
    }
}
