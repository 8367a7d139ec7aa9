//! Ready-made composite behaviors.
//!
//! - [`Intercept`]: claims matching items before any child sees them
//! - [`Fallback`]: claims whatever no child claimed
//! - [`Override`]: takes over matching items even after a child claimed them
//!
//! Each one pairs its claim with a process action, so a composite using them
//! always has something to run for the items it claims itself.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::composite::CompositeBehavior;
use crate::config::MixerConfig;
use crate::context::{AcceptContext, ProcessContext};
use crate::error::MixResult;
use crate::mixer::{CheckFn, ProcessFn};

/// Pre-accept hook claiming items that pass a check.
pub struct Intercept<T> {
    check_fn: CheckFn<T>,
    process_fn: ProcessFn<T>,
}

impl<T> Intercept<T> {
    /// Claims items for which `check` returns `true` and processes them with
    /// `process`.
    pub fn new<C, P>(check: C, process: P) -> Self
    where
        C: Fn(&T) -> bool + Send + Sync + 'static,
        P: Fn(&mut ProcessContext<T>) -> MixResult<()> + Send + Sync + 'static,
    {
        Self {
            check_fn: Arc::new(check),
            process_fn: Arc::new(process),
        }
    }
}

#[async_trait]
impl<T: Send + 'static> CompositeBehavior<T> for Intercept<T> {
    async fn pre_accept(&self, mixer: &MixerConfig, ctx: &mut AcceptContext<T>) -> MixResult<()> {
        if (self.check_fn)(ctx.item()) && ctx.accept() {
            debug!(mixer = mixer.display_name(), "Intercepted item");
            ctx.note(mixer.display_name(), "intercepted")?;
        }
        Ok(())
    }

    async fn process(&self, _mixer: &MixerConfig, ctx: &mut ProcessContext<T>) -> MixResult<()> {
        (self.process_fn)(ctx)
    }
}

/// Post-accept hook claiming items no child claimed.
pub struct Fallback<T> {
    process_fn: ProcessFn<T>,
}

impl<T> Fallback<T> {
    /// Processes unclaimed items with `process`.
    pub fn new<P>(process: P) -> Self
    where
        P: Fn(&mut ProcessContext<T>) -> MixResult<()> + Send + Sync + 'static,
    {
        Self {
            process_fn: Arc::new(process),
        }
    }
}

#[async_trait]
impl<T: Send + 'static> CompositeBehavior<T> for Fallback<T> {
    async fn post_accept(&self, mixer: &MixerConfig, ctx: &mut AcceptContext<T>) -> MixResult<()> {
        if ctx.accept() {
            debug!(mixer = mixer.display_name(), "Fallback claimed item");
            ctx.note(mixer.display_name(), "fallback")?;
        }
        Ok(())
    }

    async fn process(&self, _mixer: &MixerConfig, ctx: &mut ProcessContext<T>) -> MixResult<()> {
        (self.process_fn)(ctx)
    }
}

/// Post-accept hook redirecting matching items to this composite.
pub struct Override<T> {
    check_fn: CheckFn<T>,
    process_fn: ProcessFn<T>,
}

impl<T> Override<T> {
    /// Takes over items for which `check` returns `true`, whoever claimed
    /// them, and processes them with `process`.
    pub fn new<C, P>(check: C, process: P) -> Self
    where
        C: Fn(&T) -> bool + Send + Sync + 'static,
        P: Fn(&mut ProcessContext<T>) -> MixResult<()> + Send + Sync + 'static,
    {
        Self {
            check_fn: Arc::new(check),
            process_fn: Arc::new(process),
        }
    }
}

#[async_trait]
impl<T: Send + 'static> CompositeBehavior<T> for Override<T> {
    async fn post_accept(&self, mixer: &MixerConfig, ctx: &mut AcceptContext<T>) -> MixResult<()> {
        if (self.check_fn)(ctx.item()) {
            let previous = ctx.claim().map(ToString::to_string);
            ctx.redirect();
            debug!(
                mixer = mixer.display_name(),
                previous = previous.as_deref().unwrap_or("none"),
                "Override redirected claim"
            );
            ctx.note(mixer.display_name(), "override")?;
        }
        Ok(())
    }

    async fn process(&self, _mixer: &MixerConfig, ctx: &mut ProcessContext<T>) -> MixResult<()> {
        (self.process_fn)(ctx)
    }
}
