pub mod config;
pub mod db;
pub mod engine;
pub mod models;

use tracing_subscriber::EnvFilter;

/// Initialize tracing for an embedding application.
///
/// `RUST_LOG` takes precedence; otherwise the crate default filter is used.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}
