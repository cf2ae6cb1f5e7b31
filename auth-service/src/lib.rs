pub mod admin_handlers;
pub mod app;
pub mod config;
pub mod credentials;
pub mod error;
pub mod filter;
pub mod metrics;
pub mod resolver;
pub mod seed;
pub mod store;
pub mod user_handlers;

pub use app::{build_router, AppState};
