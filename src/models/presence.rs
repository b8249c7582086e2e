//! Actors whose presence may be tracked.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable, host-provided actor identifier (a Roblox user id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub u64);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u64> for ActorId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// A connected actor as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub name: String,
}

impl Actor {
    pub fn new(id: impl Into<ActorId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Identifies one join..leave span of an actor. A monitor only runs while its session is current.
pub type SessionId = Uuid;

/// Generate a fresh session id.
pub fn generate_session_id() -> SessionId {
    Uuid::new_v4()
}
