pub mod config;
pub mod models;
pub mod db;
pub mod validation;
pub mod catalog;
pub mod activity;
pub mod i18n;
pub mod theme;
pub mod auth;
pub mod booking; // 3-step appointment wizard
pub mod queue; // Virtual queue simulation
pub mod appointment; // My appointments
pub mod history; // Medical history
pub mod home; // Dashboard
pub mod router;
pub mod core_state;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

pub use core_state::{Clock, CoreError, PortalDeps, PortalState};

/// Install the global tracing subscriber. `RUST_LOG` overrides the default
/// filter. Calling it twice is harmless.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();
}

/// Initialize logging and open the portal over the default on-disk storage.
pub fn start() -> Result<Arc<PortalState>, CoreError> {
    init_tracing();
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
    Ok(Arc::new(PortalState::open_default()?))
}
