//! Session lifecycle hooks: the only entry points the host calls.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

use crate::config::TrackerSettings;
use crate::models::{Actor, ActorId, PresenceEventKind};
use crate::services::activity::ActivityTracker;
use crate::services::monitor::InactivityMonitor;
use crate::services::notifier::{PresenceNotifier, PresenceTransport};
use crate::services::rank::{RankCache, RankLookup};

type Gate = Arc<Mutex<()>>;

/// Wires rank cache, activity tracker, notifier and monitor together.
///
/// Hooks for one actor run one at a time, in arrival order, so a leave can never be
/// overtaken by a join that is still waiting on its rank lookup.
#[derive(Clone)]
pub struct SessionHooks {
    ranks: RankCache,
    activity: ActivityTracker,
    notifier: PresenceNotifier,
    monitor: InactivityMonitor,
    gates: Arc<Mutex<HashMap<ActorId, Gate>>>,
}

impl SessionHooks {
    pub fn new(
        lookup: Arc<dyn RankLookup>,
        transport: Arc<dyn PresenceTransport>,
        group_id: u64,
        min_rank: u8,
        settings: TrackerSettings,
    ) -> Self {
        let ranks = RankCache::new(lookup, group_id, min_rank);
        let activity = ActivityTracker::new(ranks.clone());
        let notifier = PresenceNotifier::new(ranks.clone(), transport);
        let monitor = InactivityMonitor::new(
            activity.clone(),
            notifier.clone(),
            settings.poll_interval,
            settings.inactivity_threshold,
        );
        Self {
            ranks,
            activity,
            notifier,
            monitor,
            gates: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    async fn gate(&self, actor: ActorId) -> Gate {
        self.gates.lock().await.entry(actor).or_default().clone()
    }

    /// Drop the actor's gate unless another hook is holding or waiting on it.
    async fn release_gate(&self, actor: ActorId, gate: Gate) {
        let mut gates = self.gates.lock().await;
        // One reference in the map, one here.
        if Arc::strong_count(&gate) == 2 {
            gates.remove(&actor);
        }
    }

    pub fn ranks(&self) -> &RankCache {
        &self.ranks
    }

    pub fn activity(&self) -> &ActivityTracker {
        &self.activity
    }

    pub fn monitor(&self) -> &InactivityMonitor {
        &self.monitor
    }

    /// Tracked actors get an activity record, a `join` notification and a monitor.
    /// `join` goes out before the monitor exists, so it always precedes `inactive`.
    #[instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn on_join(&self, actor: &Actor) -> bool {
        let gate = self.gate(actor.id).await;
        let _turn = gate.lock().await;

        if !self.ranks.is_tracked(actor.id).await {
            debug!(name = %actor.name, "joined (not tracked)");
            return false;
        }
        self.activity.mark_activity(actor.id).await;
        self.notifier.notify(actor.id, PresenceEventKind::Join).await;
        self.monitor.start(actor.id).await;
        info!(name = %actor.name, "tracked actor joined");
        true
    }

    /// Inbound activity signal from the client emitter.
    pub async fn on_activity(&self, actor: ActorId) -> bool {
        let gate = self.gate(actor).await;
        let recorded = {
            let _turn = gate.lock().await;
            self.activity.mark_activity(actor).await
        };
        if !recorded {
            self.release_gate(actor, gate).await;
        }
        recorded
    }

    /// Sends `leave` for tracked actors, then clears all per-actor state regardless of
    /// whether the notification went through.
    #[instrument(skip(self))]
    pub async fn on_leave(&self, actor: ActorId) -> bool {
        let gate = self.gate(actor).await;
        let tracked = {
            let _turn = gate.lock().await;
            let tracked = self.ranks.is_tracked(actor).await;
            if tracked {
                self.notifier.notify(actor, PresenceEventKind::Leave).await;
            }

            self.monitor.stop(actor).await;
            self.activity.forget(actor).await;
            self.ranks.forget(actor).await;
            tracked
        };
        self.release_gate(actor, gate).await;
        info!(tracked, "actor left; state purged");
        tracked
    }

    /// Forward zero-payload signals from `signals` into `on_activity` until the sender is dropped.
    pub fn route_signals(&self, actor: ActorId, mut signals: mpsc::UnboundedReceiver<()>) -> JoinHandle<()> {
        let hooks = self.clone();
        tokio::spawn(async move {
            while signals.recv().await.is_some() {
                hooks.on_activity(actor).await;
            }
            debug!(actor = %actor, "signal channel closed");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LookupError;
    use crate::services::emitter::ActivityEmitter;
    use crate::services::notifier::tests::RecordingTransport;
    use crate::services::rank::tests::FixedRanks;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use crate::models::PresenceEventKind::{Inactive, Join, Leave};

    const A: u64 = 1;
    const B: u64 = 2;

    fn hooks() -> (SessionHooks, Arc<RecordingTransport>, Arc<FixedRanks>) {
        let lookup = Arc::new(FixedRanks::with(&[(A, 121), (B, 50)]));
        let transport = Arc::new(RecordingTransport::default());
        let hooks = SessionHooks::new(
            lookup.clone(),
            transport.clone(),
            7,
            121,
            TrackerSettings::default(),
        );
        (hooks, transport, lookup)
    }

    async fn sleep_until(start: tokio::time::Instant, secs: u64) {
        tokio::time::sleep_until(start + Duration::from_secs(secs)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn tracked_actor_full_timeline() {
        let (hooks, transport, _) = hooks();
        let a = Actor::new(A, "alice");
        let t0 = tokio::time::Instant::now();

        assert!(hooks.on_join(&a).await);
        assert_eq!(transport.events_for(a.id), vec![Join]);

        sleep_until(t0, 599).await;
        assert_eq!(transport.events_for(a.id), vec![Join]);

        sleep_until(t0, 631).await;
        assert_eq!(transport.events_for(a.id), vec![Join, Inactive]);

        sleep_until(t0, 700).await;
        assert!(hooks.on_activity(a.id).await);
        assert!(!hooks.activity().record(a.id).await.unwrap().inactive_notified);

        sleep_until(t0, 1285).await;
        assert_eq!(transport.events_for(a.id), vec![Join, Inactive]);

        sleep_until(t0, 1331).await;
        assert_eq!(transport.events_for(a.id), vec![Join, Inactive, Inactive]);

        sleep_until(t0, 1400).await;
        assert!(hooks.on_leave(a.id).await);
        assert_eq!(transport.events_for(a.id), vec![Join, Inactive, Inactive, Leave]);

        assert_eq!(hooks.ranks().cached(a.id).await, None);
        assert!(hooks.activity().record(a.id).await.is_none());
        assert!(!hooks.monitor().is_running(a.id).await);

        sleep_until(t0, 3000).await;
        assert_eq!(transport.total(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn steady_activity_never_goes_inactive() {
        let (hooks, transport, _) = hooks();
        let a = Actor::new(A, "alice");

        hooks.on_join(&a).await;
        for _ in 0..10 {
            tokio::time::sleep(Duration::from_secs(300)).await;
            hooks.on_activity(a.id).await;
        }
        assert_eq!(transport.events_for(a.id), vec![Join]);
    }

    #[tokio::test(start_paused = true)]
    async fn untracked_actor_sends_nothing_and_is_looked_up_once() {
        let (hooks, transport, lookup) = hooks();
        let b = Actor::new(B, "bob");

        assert!(!hooks.on_join(&b).await);
        assert!(!hooks.on_activity(b.id).await);
        tokio::time::sleep(Duration::from_secs(1200)).await;
        assert!(!hooks.on_leave(b.id).await);

        assert_eq!(transport.total(), 0);
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 1);
        assert!(!hooks.monitor().is_running(b.id).await);
    }

    #[tokio::test(start_paused = true)]
    async fn rejoin_is_a_fresh_session() {
        let (hooks, transport, lookup) = hooks();
        let a = Actor::new(A, "alice");

        hooks.on_join(&a).await;
        hooks.on_leave(a.id).await;
        hooks.on_join(&a).await;

        assert_eq!(lookup.calls.load(Ordering::SeqCst), 2);
        assert_eq!(transport.events_for(a.id), vec![Join, Leave, Join]);
        let record = hooks.activity().record(a.id).await.unwrap();
        assert!(!record.inactive_notified);
    }

    #[tokio::test(start_paused = true)]
    async fn leave_purges_even_when_notifier_fails() {
        let lookup = Arc::new(FixedRanks::with(&[(A, 200)]));
        let transport = Arc::new(RecordingTransport {
            fail: true,
            ..Default::default()
        });
        let hooks = SessionHooks::new(lookup, transport, 7, 121, TrackerSettings::default());
        let a = Actor::new(A, "alice");

        hooks.on_join(&a).await;
        hooks.on_leave(a.id).await;

        assert_eq!(hooks.ranks().cached(a.id).await, None);
        assert!(hooks.activity().record(a.id).await.is_none());
        assert!(!hooks.monitor().is_running(a.id).await);
    }

    #[tokio::test(start_paused = true)]
    async fn emitter_signals_reach_the_tracker() {
        let (hooks, transport, _) = hooks();
        let a = Actor::new(A, "alice");
        hooks.on_join(&a).await;

        let (tx, rx) = mpsc::unbounded_channel();
        let router = hooks.route_signals(a.id, rx);
        let mut emitter = ActivityEmitter::from_settings(&TrackerSettings::default(), tx);

        // Input every 5 minutes keeps the actor active.
        for _ in 0..6 {
            tokio::time::sleep(Duration::from_secs(300)).await;
            emitter.input();
        }
        tokio::task::yield_now().await;
        assert_eq!(transport.events_for(a.id), vec![Join]);

        drop(emitter);
        router.await.unwrap();
    }

    /// First lookup takes 3s, later ones 100ms.
    #[derive(Default)]
    struct SlowFirstLookup {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RankLookup for SlowFirstLookup {
        async fn rank_in_group(&self, _actor: ActorId, _group_id: u64) -> Result<u8, LookupError> {
            let delay = if self.calls.fetch_add(1, Ordering::SeqCst) == 0 { 3000 } else { 100 };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(200)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn leave_waits_for_join_still_looking_up_rank() {
        let transport = Arc::new(RecordingTransport::default());
        let hooks = SessionHooks::new(
            Arc::new(SlowFirstLookup::default()),
            transport.clone(),
            7,
            121,
            TrackerSettings::default(),
        );
        let a = Actor::new(A, "alice");

        let joining = {
            let hooks = hooks.clone();
            let a = a.clone();
            tokio::spawn(async move { hooks.on_join(&a).await })
        };
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(hooks.on_leave(a.id).await);
        assert!(joining.await.unwrap());

        tokio::time::sleep(Duration::from_secs(700)).await;
        assert_eq!(transport.events_for(a.id), vec![Join, Leave]);
        assert!(!hooks.monitor().is_running(a.id).await);
        assert_eq!(hooks.ranks().cached(a.id).await, None);
        assert!(hooks.activity().record(a.id).await.is_none());
        assert!(hooks.gates.lock().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn activity_for_unknown_actor_leaves_no_gate() {
        let (hooks, _, _) = hooks();
        assert!(!hooks.on_activity(ActorId(99)).await);
        assert!(hooks.gates.lock().await.is_empty());
    }
}
