//! Staff shift clock, ended automatically when the game reports leave or inactivity.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use crate::error::{AppError, AppResult};
use crate::models::{fmt_duration, ActiveShift, ShiftSummary};
use crate::services::presence::PresenceState;

#[derive(Clone)]
pub struct ShiftService {
    presence: PresenceState,
    active: Arc<RwLock<HashMap<u64, ActiveShift>>>,
}

impl ShiftService {
    pub fn new(presence: PresenceState) -> Self {
        Self {
            presence,
            active: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Only members currently in the game may clock in, and only once.
    #[instrument(skip(self))]
    pub async fn start(&self, member_id: u64, manual: bool) -> AppResult<ActiveShift> {
        if !self.presence.is_in_game(member_id).await {
            return Err(AppError::Conflict(
                "not in the game; join the game first, then start the clock".to_string(),
            ));
        }

        let mut active = self.active.write().await;
        if let Some(existing) = active.get(&member_id) {
            return Err(AppError::Conflict(format!(
                "member {} already has an active shift (started {})",
                member_id,
                existing.started_at.to_rfc3339()
            )));
        }

        let shift = ActiveShift {
            member_id,
            started_at: Utc::now(),
            manual,
        };
        active.insert(member_id, shift.clone());
        info!(member_id, manual, "shift started");
        Ok(shift)
    }

    pub async fn end(&self, member_id: u64, reason: &str) -> Option<ShiftSummary> {
        let shift = self.active.write().await.remove(&member_id)?;
        let ended_at = Utc::now();
        let duration_secs = (ended_at - shift.started_at).num_seconds();

        info!(member_id, duration_secs, reason, "shift ended");
        Some(ShiftSummary {
            member_id,
            started_at: shift.started_at,
            ended_at,
            duration_secs,
            duration: fmt_duration(duration_secs),
            reason: reason.to_string(),
        })
    }

    /// Ends the member's shift if one is running; otherwise does nothing.
    pub async fn auto_end_for_inactivity(&self, member_id: u64, reason: &str) -> Option<ShiftSummary> {
        let summary = self.end(member_id, reason).await;
        if summary.is_none() {
            debug!(member_id, "auto-end: no active shift");
        }
        summary
    }

    pub async fn list(&self) -> Vec<ActiveShift> {
        let mut shifts: Vec<_> = self.active.read().await.values().cloned().collect();
        shifts.sort_by_key(|s| s.started_at);
        shifts
    }
}
