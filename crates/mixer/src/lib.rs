//! # Mixer
//!
//! Composite accept/process routing trees.
//!
//! ## Overview
//!
//! A mixer tree routes each incoming item to exactly one handler. Composites
//! search their children depth-first and stop at the first one that accepts;
//! hooks on a composite can claim an item before its children see it, or
//! after none of them wanted it. Only the mixer that claimed the item then
//! processes it.
//!
//! ```text
//! ┌────────┐     ┌──────────────────────────────┐
//! │ Router │────▶│ root (pre hook)              │
//! └────────┘     │   ├── leaf "ping"            │
//!                │   ├── composite "admin"      │
//!                │   │     └── leaf "kick"  ✓   │──▶ process
//!                │   └── leaf "echo"            │
//!                │ root (post hook)             │
//!                └──────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mixer::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let tree = CompositeMixer::new("root")
//!         .with_child(
//!             LeafMixer::new("ping")
//!                 .accept_when(|line: &String| line == "ping")
//!                 .process_with(|ctx| {
//!                     ctx.set_state("pong".to_string());
//!                     Ok(())
//!                 }),
//!         )
//!         .with_behavior(Fallback::new(|_| Ok(())));
//!
//!     let router = Router::new(tree);
//!     router.route("ping".to_string()).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config`: Load `mixer.toml` files (default)
//! - `yaml-config`: Load `mixer.yaml` files
//! - `json-log`: JSON log output

pub use mixer_core as core;
pub use mixer_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use mixer::prelude::*;
/// ```
pub mod prelude {
    // Tree building
    pub use mixer_core::{
        CompositeBehavior, CompositeMixer, Fallback, Intercept, LeafMixer, Mixer, MixerConfig,
        Override, Passthrough,
    };

    // Contexts and results
    pub use mixer_core::{
        AcceptContext, AcceptState, CancellationToken, MixError, MixResult, ProcessContext, Route,
    };

    // Diagnostics
    pub use mixer_core::{DiagnosticSink, MemorySink};

    // Runtime
    pub use mixer_runtime::{
        ConfigLoader, MixerSettings, Routed, Router, RuntimeError, RuntimeResult, TracingSink,
        logging::LoggingBuilder,
    };

    // Logging macros
    pub use mixer_runtime::prelude::*;
}
