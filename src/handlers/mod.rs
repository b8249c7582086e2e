//! HTTP request handlers.

pub mod game;
pub mod http;

pub use game::*;
pub use http::*;
