//! Composite mixers.
//!
//! A [`CompositeMixer`] owns an ordered list of children and runs the accept
//! traversal over them:
//!
//! 1. Open a diagnostic scope named after the composite (if a sink is set)
//! 2. Run the behavior's [`pre_accept`](CompositeBehavior::pre_accept) hook
//! 3. If still unaccepted, try children in order, depth-first, stopping at
//!    the first one that accepts
//! 4. Run the behavior's [`post_accept`](CompositeBehavior::post_accept) hook,
//!    exactly once per call
//! 5. Close the diagnostic scope
//!
//! Processing follows the claim route recorded during acceptance: a plain
//! composite hands the item to the child on the route, and only runs its
//! behavior's [`process`](CompositeBehavior::process) when one of its own
//! hooks claimed the item.
//!
//! # Example
//!
//! ```rust,ignore
//! use mixer_core::{CompositeMixer, LeafMixer};
//!
//! let root = CompositeMixer::new("commands")
//!     .with_child(LeafMixer::new("ping").accept_when(|s: &String| s == "ping").process_with(pong))
//!     .with_child(LeafMixer::new("echo").accept_all().process_with(echo));
//! ```
//!
//! Each cancellation check and each hook/child call is a separate step; a
//! failure in any of them ends the traversal immediately and the post-accept
//! hook does not run.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, trace};

use crate::config::MixerConfig;
use crate::context::{AcceptContext, ProcessContext};
use crate::error::{MixError, MixResult};
use crate::mixer::{BoxedMixer, Mixer};

// ============================================================================
// CompositeBehavior
// ============================================================================

/// Extension points of a [`CompositeMixer`].
///
/// Every method has a default. The hooks default to doing nothing. The
/// default [`process`](Self::process) is only reached when a hook claimed the
/// item at this composite without providing a process action, and reports
/// that as [`MixError::UnprocessedClaim`] instead of dropping the item.
#[async_trait]
pub trait CompositeBehavior<T: Send + 'static>: Send + Sync {
    /// Runs before any child. Accepting here skips the children.
    async fn pre_accept(&self, _mixer: &MixerConfig, _ctx: &mut AcceptContext<T>) -> MixResult<()> {
        Ok(())
    }

    /// Runs after the children (or after `pre_accept` claimed the item).
    ///
    /// Use [`AcceptContext::accept`] for fallback semantics and
    /// [`AcceptContext::redirect`] to take over a claim made by a child.
    async fn post_accept(&self, _mixer: &MixerConfig, _ctx: &mut AcceptContext<T>) -> MixResult<()> {
        Ok(())
    }

    /// Processes an item claimed by one of the hooks above.
    async fn process(&self, mixer: &MixerConfig, _ctx: &mut ProcessContext<T>) -> MixResult<()> {
        Err(MixError::UnprocessedClaim {
            mixer: mixer.display_name().to_string(),
        })
    }
}

/// The behavior of a plain composite: no hooks.
///
/// Processing a claim that ends at a plain composite does nothing. That only
/// happens when the caller hands in a context that was already accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

#[async_trait]
impl<T: Send + 'static> CompositeBehavior<T> for Passthrough {
    async fn process(&self, _mixer: &MixerConfig, _ctx: &mut ProcessContext<T>) -> MixResult<()> {
        Ok(())
    }
}

// ============================================================================
// CompositeMixer
// ============================================================================

/// A mixer that delegates to an ordered list of children.
///
/// Built by value; once built the children cannot change.
pub struct CompositeMixer<T: Send + 'static> {
    config: MixerConfig,
    children: Vec<BoxedMixer<T>>,
    behavior: Arc<dyn CompositeBehavior<T>>,
}

impl<T: Send + 'static> CompositeMixer<T> {
    /// Creates a composite with no children and no hooks.
    pub fn new(config: impl Into<MixerConfig>) -> Self {
        Self {
            config: config.into(),
            children: Vec::new(),
            behavior: Arc::new(Passthrough),
        }
    }

    /// Appends a child. Children are tried in the order they are added.
    pub fn with_child<M>(mut self, child: M) -> Self
    where
        M: Mixer<T> + 'static,
    {
        self.children.push(Arc::new(child));
        self
    }

    /// Appends a pre-built boxed child.
    pub fn with_boxed_child(mut self, child: BoxedMixer<T>) -> Self {
        self.children.push(child);
        self
    }

    /// Appends several boxed children in order.
    pub fn with_children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = BoxedMixer<T>>,
    {
        self.children.extend(children);
        self
    }

    /// Sets the hooks of this composite.
    pub fn with_behavior<B>(mut self, behavior: B) -> Self
    where
        B: CompositeBehavior<T> + 'static,
    {
        self.behavior = Arc::new(behavior);
        self
    }

    /// Returns the number of children.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Steps 2 to 4 of the traversal. Scope handling lives in `accept`.
    async fn traverse(&self, ctx: &mut AcceptContext<T>) -> MixResult<()> {
        let name = self.config.display_name();

        ctx.checkpoint()?;
        self.behavior.pre_accept(&self.config, ctx).await?;

        if ctx.is_accepted() {
            trace!(mixer = name, "Pre-accept hook claimed item, skipping children");
        } else {
            for (index, child) in self.children.iter().enumerate() {
                ctx.checkpoint()?;
                trace!(mixer = name, child = child.name(), index, "Trying child");

                ctx.descend(index);
                let result = child.accept(ctx).await;
                ctx.ascend();
                result?;

                if ctx.is_accepted() {
                    debug!(
                        mixer = name,
                        child = child.name(),
                        index,
                        "Child accepted item, skipping remaining children"
                    );
                    break;
                }
            }
        }

        ctx.checkpoint()?;
        self.behavior.post_accept(&self.config, ctx).await?;

        if ctx.is_claimed_here() {
            debug!(mixer = name, "Composite claimed item through its hooks");
        }
        Ok(())
    }
}

#[async_trait]
impl<T: Send + 'static> Mixer<T> for CompositeMixer<T> {
    fn config(&self) -> &MixerConfig {
        &self.config
    }

    async fn accept(&self, ctx: &mut AcceptContext<T>) -> MixResult<()> {
        let name = self.config.display_name();
        let sink = ctx.sink().cloned();
        if let Some(sink) = &sink {
            sink.open_scope(name)?;
        }

        let result = self.traverse(ctx).await;

        if let Some(sink) = &sink {
            sink.close_scope(name);
        }
        result
    }

    async fn process(&self, ctx: &mut ProcessContext<T>) -> MixResult<()> {
        ctx.checkpoint()?;
        let name = self.config.display_name();

        let Some(index) = ctx.next_hop() else {
            debug!(mixer = name, "Processing claim with composite behavior");
            return self.behavior.process(&self.config, ctx).await;
        };

        let child = self
            .children
            .get(index)
            .ok_or_else(|| MixError::InvalidRoute {
                mixer: name.to_string(),
                index,
                children: self.children.len(),
            })?;

        trace!(mixer = name, child = child.name(), index, "Delegating process");
        child.process(ctx).await
    }
}

impl<T: Send + 'static> fmt::Debug for CompositeMixer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeMixer")
            .field("config", &self.config)
            .field("child_count", &self.children.len())
            .finish_non_exhaustive()
    }
}
