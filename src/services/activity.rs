//! Last-seen bookkeeping for tracked actors.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::models::ActorId;
use crate::services::rank::RankCache;

/// Per-actor idle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityRecord {
    pub last_seen: Instant,
    /// Set once an `inactive` notification went out for the current idle period.
    pub inactive_notified: bool,
}

impl ActivityRecord {
    fn fresh(now: Instant) -> Self {
        Self {
            last_seen: now,
            inactive_notified: false,
        }
    }
}

#[derive(Clone)]
pub struct ActivityTracker {
    ranks: RankCache,
    records: Arc<RwLock<HashMap<ActorId, ActivityRecord>>>,
}

impl ActivityTracker {
    pub fn new(ranks: RankCache) -> Self {
        Self {
            ranks,
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Sets last-seen to now and re-arms the inactive notification. No effect for untracked
    /// actors; returns whether anything was recorded.
    pub async fn mark_activity(&self, actor: ActorId) -> bool {
        if !self.ranks.is_tracked(actor).await {
            return false;
        }
        self.records
            .write()
            .await
            .insert(actor, ActivityRecord::fresh(Instant::now()));
        trace!(actor = %actor, "activity");
        true
    }

    /// One monitor check. Returns `true` exactly when the caller should send `inactive`.
    ///
    /// A missing record counts as activity: it is created with last-seen = now.
    pub async fn poll_idle(&self, actor: ActorId, threshold: Duration) -> bool {
        let now = Instant::now();
        let mut records = self.records.write().await;
        let record = match records.entry(actor) {
            Entry::Occupied(slot) => slot.into_mut(),
            Entry::Vacant(slot) => {
                slot.insert(ActivityRecord::fresh(now));
                debug!(actor = %actor, "no activity record at poll; starting one");
                return false;
            }
        };

        // Whole seconds, like the host clock.
        let idle_secs = now.saturating_duration_since(record.last_seen).as_secs();
        if idle_secs >= threshold.as_secs() && !record.inactive_notified {
            record.inactive_notified = true;
            debug!(actor = %actor, idle_secs, "idle threshold crossed");
            return true;
        }
        false
    }

    pub async fn record(&self, actor: ActorId) -> Option<ActivityRecord> {
        self.records.read().await.get(&actor).copied()
    }

    pub async fn forget(&self, actor: ActorId) {
        self.records.write().await.remove(&actor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::rank::tests::FixedRanks;

    fn tracker() -> ActivityTracker {
        let ranks = RankCache::new(Arc::new(FixedRanks::with(&[(1, 121), (2, 10)])), 7, 121);
        ActivityTracker::new(ranks)
    }

    const THRESHOLD: Duration = Duration::from_secs(600);

    #[tokio::test]
    async fn untracked_activity_is_ignored() {
        let t = tracker();
        assert!(!t.mark_activity(ActorId(2)).await);
        assert!(t.record(ActorId(2)).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_per_idle_period() {
        let t = tracker();
        t.mark_activity(ActorId(1)).await;

        tokio::time::advance(Duration::from_secs(599)).await;
        assert!(!t.poll_idle(ActorId(1), THRESHOLD).await);

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(t.poll_idle(ActorId(1), THRESHOLD).await);
        assert!(!t.poll_idle(ActorId(1), THRESHOLD).await);

        tokio::time::advance(Duration::from_secs(900)).await;
        assert!(!t.poll_idle(ActorId(1), THRESHOLD).await);
    }

    #[tokio::test(start_paused = true)]
    async fn activity_rearms() {
        let t = tracker();
        t.mark_activity(ActorId(1)).await;
        tokio::time::advance(THRESHOLD).await;
        assert!(t.poll_idle(ActorId(1), THRESHOLD).await);

        t.mark_activity(ActorId(1)).await;
        let record = t.record(ActorId(1)).await.unwrap();
        assert!(!record.inactive_notified);

        tokio::time::advance(THRESHOLD).await;
        assert!(t.poll_idle(ActorId(1), THRESHOLD).await);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_record_counts_as_activity() {
        let t = tracker();
        assert!(!t.poll_idle(ActorId(1), THRESHOLD).await);
        assert!(t.record(ActorId(1)).await.is_some());

        tokio::time::advance(Duration::from_secs(300)).await;
        assert!(!t.poll_idle(ActorId(1), THRESHOLD).await);
    }
}
