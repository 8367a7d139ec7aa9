//! Mixer Runtime - driver layer for the Mixer framework.
//!
//! This crate provides:
//! - The [`Router`], which runs accept and process for each item
//! - Per-item timeouts and shutdown through cancellation tokens
//! - Layered configuration (`mixer.toml`, `MIXER_*` environment variables)
//! - Logging configuration
//! - A [`TracingSink`] turning traversal diagnostics into `tracing` events
//!
//! ```ignore
//! use mixer_runtime::{ConfigLoader, Router, logging};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = ConfigLoader::new().load()?;
//!     logging::init_from_config(&settings.logging);
//!
//!     let router = Router::from_config(Arc::new(build_tree()), &settings.routing);
//!     for line in std::io::stdin().lines() {
//!         router.route(line?).await?;
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod router;
pub mod sink;

// Re-exports
pub use config::{ConfigError, ConfigLoader, ConfigResult, MixerSettings, RoutingConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use router::{Routed, Router};
pub use sink::TracingSink;

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
///
/// This provides all the commonly used logging macros:
/// - `trace!`, `debug!`, `info!`, `warn!`, `error!`
/// - `span`, `event`
/// - `instrument` attribute
/// - `Level` for span creation
pub mod prelude {
    pub use tracing::{Level, debug, error, event, info, instrument, span, trace, warn};
}
