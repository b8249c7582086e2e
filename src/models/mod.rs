//! Data models for actors, presence events, and shifts.

pub mod event;
pub mod presence;
pub mod shift;

pub use event::*;
pub use presence::*;
pub use shift::*;
