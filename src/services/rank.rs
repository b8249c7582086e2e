//! Rank cache: decides once per session whether an actor is tracked.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use crate::error::LookupError;
use crate::models::ActorId;

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// External privilege lookup: the actor's rank inside a group.
#[async_trait]
pub trait RankLookup: Send + Sync {
    /// Rank of `actor` in `group_id`, or 0 when the actor is not a member.
    async fn rank_in_group(&self, actor: ActorId, group_id: u64) -> Result<u8, LookupError>;
}

/// Looks ranks up through the Roblox groups API (`/v2/users/{id}/groups/roles`).
#[derive(Clone)]
pub struct GroupRankLookup {
    client: reqwest::Client,
    base_url: String,
}

impl GroupRankLookup {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GroupRolesResponse {
    #[serde(default)]
    data: Vec<GroupMembership>,
}

#[derive(Debug, Deserialize)]
struct GroupMembership {
    group: GroupRef,
    role: RoleRef,
}

#[derive(Debug, Deserialize)]
struct GroupRef {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct RoleRef {
    rank: u8,
}

fn rank_from_roles(roles: &GroupRolesResponse, group_id: u64) -> u8 {
    roles
        .data
        .iter()
        .find(|m| m.group.id == group_id)
        .map(|m| m.role.rank)
        .unwrap_or(0)
}

#[async_trait]
impl RankLookup for GroupRankLookup {
    async fn rank_in_group(&self, actor: ActorId, group_id: u64) -> Result<u8, LookupError> {
        let url = format!(
            "{}/v2/users/{}/groups/roles",
            self.base_url.trim_end_matches('/'),
            actor
        );
        let resp = self.client.get(url).timeout(LOOKUP_TIMEOUT).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LookupError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let roles: GroupRolesResponse = resp.json().await.map_err(LookupError::Decode)?;
        Ok(rank_from_roles(&roles, group_id))
    }
}

/// Memoizes "is this actor tracked" for the actor's session.
#[derive(Clone)]
pub struct RankCache {
    lookup: Arc<dyn RankLookup>,
    group_id: u64,
    min_rank: u8,
    tracked: Arc<RwLock<HashMap<ActorId, bool>>>,
}

impl RankCache {
    pub fn new(lookup: Arc<dyn RankLookup>, group_id: u64, min_rank: u8) -> Self {
        Self {
            lookup,
            group_id,
            min_rank,
            tracked: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// First call per actor performs the lookup; a failed lookup counts as "not tracked"
    /// and is cached like any other answer.
    #[instrument(skip(self))]
    pub async fn is_tracked(&self, actor: ActorId) -> bool {
        if let Some(tracked) = self.cached(actor).await {
            return tracked;
        }

        let tracked = match self.lookup.rank_in_group(actor, self.group_id).await {
            Ok(rank) => rank >= self.min_rank,
            Err(e) => {
                warn!(actor = %actor, error = %e, "rank lookup failed; treating as not tracked");
                false
            }
        };

        let mut map = self.tracked.write().await;
        match map.entry(actor) {
            Entry::Occupied(existing) => *existing.get(),
            Entry::Vacant(slot) => {
                slot.insert(tracked);
                info!(actor = %actor, tracked, group_id = self.group_id, "rank checked");
                tracked
            }
        }
    }

    /// Cached decision, without triggering a lookup.
    pub async fn cached(&self, actor: ActorId) -> Option<bool> {
        self.tracked.read().await.get(&actor).copied()
    }

    pub async fn forget(&self, actor: ActorId) {
        self.tracked.write().await.remove(&actor);
    }
}
