//! Business logic: the in-game presence tracker and the receiver's shift clock.

pub mod activity;
pub mod emitter;
pub mod monitor;
pub mod notifier;
pub mod presence;
pub mod rank;
pub mod session;
pub mod shift;

pub use activity::{ActivityRecord, ActivityTracker};
pub use emitter::ActivityEmitter;
pub use monitor::InactivityMonitor;
pub use notifier::{HttpTransport, PresenceNotifier, PresenceTransport};
pub use presence::PresenceState;
pub use rank::{GroupRankLookup, RankCache, RankLookup};
pub use session::SessionHooks;
pub use shift::ShiftService;
