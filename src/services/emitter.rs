//! Client-side activity emitter: throttles local input into at most one signal per window.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::debug;

use crate::config::TrackerSettings;

pub struct ActivityEmitter {
    window: Duration,
    last_sent: Option<Instant>,
    signals: mpsc::UnboundedSender<()>,
}

impl ActivityEmitter {
    pub fn new(window: Duration, signals: mpsc::UnboundedSender<()>) -> Self {
        Self {
            window,
            last_sent: None,
            signals,
        }
    }

    /// Emitter throttled by the configured client window.
    pub fn from_settings(settings: &TrackerSettings, signals: mpsc::UnboundedSender<()>) -> Self {
        Self::new(settings.throttle_window, signals)
    }

    /// Record one local input event. Returns `true` if a signal was forwarded.
    pub fn input(&mut self) -> bool {
        let now = Instant::now();
        if let Some(last) = self.last_sent {
            if now.saturating_duration_since(last) < self.window {
                return false;
            }
        }
        self.last_sent = Some(now);
        if self.signals.send(()).is_err() {
            debug!("activity signal dropped: receiver closed");
        }
        true
    }
}
