//! Presence events on the wire and the gateway request bodies.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use super::presence::ActorId;

/// Presence event names sent to the receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceEventKind {
    Join,
    Leave,
    Inactive,
}

impl PresenceEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PresenceEventKind::Join => "join",
            PresenceEventKind::Leave => "leave",
            PresenceEventKind::Inactive => "inactive",
        }
    }
}

impl fmt::Display for PresenceEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PresenceEventKind {
    type Err = ();

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "join" => Ok(PresenceEventKind::Join),
            "leave" => Ok(PresenceEventKind::Leave),
            "inactive" => Ok(PresenceEventKind::Inactive),
            _ => Err(()),
        }
    }
}

/// Outbound notification body: `{"roblox_id": "<string>", "event": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresencePayload {
    pub roblox_id: String,
    pub event: PresenceEventKind,
}

impl PresencePayload {
    pub fn new(actor: ActorId, event: PresenceEventKind) -> Self {
        Self {
            roblox_id: actor.to_string(),
            event,
        }
    }
}

/// Inbound webhook body as received. Fields are loose on purpose; the handler validates them
/// so that bad input maps to 400 with a specific message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PresenceWebhook {
    #[serde(default, alias = "discord_id")]
    pub roblox_id: Option<serde_json::Value>,
    #[serde(default)]
    pub event: Option<String>,
}

/// POST /game/players/:id/join body.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct JoinRequest {
    #[validate(length(min = 1, max = 64))]
    pub name: String,
}
