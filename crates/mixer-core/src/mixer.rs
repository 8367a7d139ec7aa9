//! The [`Mixer`] capability.
//!
//! A mixer can try to accept an item during the accept traversal and, if it
//! (or a descendant) claimed the item, process it afterwards. Leaves decide
//! acceptance with domain logic; [`CompositeMixer`](crate::CompositeMixer)
//! delegates to its children.
//!
//! # Example
//!
//! ```rust,ignore
//! use mixer_core::{AcceptContext, Mixer, MixerConfig, MixResult, ProcessContext};
//!
//! struct Uppercase {
//!     config: MixerConfig,
//! }
//!
//! #[async_trait::async_trait]
//! impl Mixer<String> for Uppercase {
//!     fn config(&self) -> &MixerConfig {
//!         &self.config
//!     }
//!
//!     async fn accept(&self, ctx: &mut AcceptContext<String>) -> MixResult<()> {
//!         if ctx.item().starts_with('!') {
//!             ctx.accept();
//!         }
//!         Ok(())
//!     }
//!
//!     async fn process(&self, ctx: &mut ProcessContext<String>) -> MixResult<()> {
//!         let upper = ctx.item().to_uppercase();
//!         ctx.set_state(upper);
//!         Ok(())
//!     }
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::MixerConfig;
use crate::context::{AcceptContext, ProcessContext};
use crate::error::MixResult;

/// A shared, type-erased mixer.
///
/// Trees are read-only once built, so the same mixer can serve concurrent
/// inputs.
pub type BoxedMixer<T> = Arc<dyn Mixer<T>>;

/// A type-erased acceptance predicate.
pub type CheckFn<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// A type-erased process action.
pub type ProcessFn<T> = Arc<dyn Fn(&mut ProcessContext<T>) -> MixResult<()> + Send + Sync>;

/// Something that can claim an item and then process it.
#[async_trait]
pub trait Mixer<T: Send + 'static>: Send + Sync {
    /// Returns the identity of this mixer.
    fn config(&self) -> &MixerConfig;

    /// Shorthand for the display name.
    fn name(&self) -> &str {
        self.config().display_name()
    }

    /// Tries to claim the item. Acceptance is recorded in `ctx`.
    async fn accept(&self, ctx: &mut AcceptContext<T>) -> MixResult<()>;

    /// Processes an item this mixer (or one of its descendants) claimed.
    async fn process(&self, ctx: &mut ProcessContext<T>) -> MixResult<()>;
}
