pub mod api;
pub mod app;
pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod resources;
pub mod search;
pub mod store;
pub mod views;

// Re-export core components
pub use crate::api::ApiClient;
pub use crate::app::Desk;
pub use crate::auth::{Credentials, Registration, SessionController, TokenPair, TokenStore};
pub use crate::config::Config;
pub use crate::error::{DeskError, DeskResult};
pub use crate::search::SearchContext;
pub use crate::views::{ListView, ViewOutcome};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
