//! Username/email/password accounts over SQLite, with an actix-web front.

pub mod account_requests;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod password;
pub mod schema;
pub mod store;

pub use config::Config;
pub use error::AccountError;
pub use models::Account;
pub use password::PasswordHasher;
pub use store::AccountStore;

use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber. `RUST_LOG` overrides the
/// default `info` level. `log` records (actix-web's access log) are
/// forwarded too.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
