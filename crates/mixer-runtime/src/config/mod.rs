//! Configuration module for the Mixer runtime.
//!
//! Settings are loaded with figment from defaults, `mixer.toml` /
//! `mixer.yaml` files and `MIXER_` environment variables, then validated.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile};
pub use schema::{
    LogFormat, LogLevel, LogOutput, LoggingConfig, MixerSettings, RoutingConfig, SpanEventConfig,
};
pub use validation::validate_config;
