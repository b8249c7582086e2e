//! Request guards shared by the gateway, webhook and shift routes.

pub mod auth;

pub use auth::GameSecret;
