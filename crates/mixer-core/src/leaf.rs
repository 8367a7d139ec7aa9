//! Leaf mixers built from closures.
//!
//! A [`LeafMixer`] accepts when its check passes and runs its processor when
//! the item it claimed is processed. A leaf without a check accepts nothing.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::trace;

use crate::config::MixerConfig;
use crate::context::{AcceptContext, ProcessContext};
use crate::error::{MixError, MixResult};
use crate::mixer::{CheckFn, Mixer, ProcessFn};

/// A mixer whose decision and action are plain closures.
pub struct LeafMixer<T> {
    config: MixerConfig,
    check_fn: Option<CheckFn<T>>,
    process_fn: Option<ProcessFn<T>>,
}

impl<T> LeafMixer<T> {
    /// Creates a leaf that accepts nothing.
    pub fn new(config: impl Into<MixerConfig>) -> Self {
        Self {
            config: config.into(),
            check_fn: None,
            process_fn: None,
        }
    }

    /// Accepts items for which `f` returns `true`.
    pub fn accept_when<F>(mut self, f: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.check_fn = Some(Arc::new(f));
        self
    }

    /// Accepts every item.
    pub fn accept_all(self) -> Self {
        self.accept_when(|_| true)
    }

    /// Sets the action run on claimed items.
    pub fn process_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut ProcessContext<T>) -> MixResult<()> + Send + Sync + 'static,
    {
        self.process_fn = Some(Arc::new(f));
        self
    }

    /// Returns `true` if `item` passes the check.
    pub fn matches(&self, item: &T) -> bool {
        self.check_fn.as_ref().is_some_and(|f| f(item))
    }
}

#[async_trait]
impl<T: Send + 'static> Mixer<T> for LeafMixer<T> {
    fn config(&self) -> &MixerConfig {
        &self.config
    }

    async fn accept(&self, ctx: &mut AcceptContext<T>) -> MixResult<()> {
        if self.matches(ctx.item()) {
            trace!(mixer = self.config.display_name(), "Leaf check passed");
            ctx.accept();
        }
        Ok(())
    }

    async fn process(&self, ctx: &mut ProcessContext<T>) -> MixResult<()> {
        if let Some(&index) = ctx.remaining_hops().first() {
            return Err(MixError::InvalidRoute {
                mixer: self.config.display_name().to_string(),
                index,
                children: 0,
            });
        }
        ctx.checkpoint()?;

        match &self.process_fn {
            Some(f) => f(ctx),
            None => Err(MixError::UnprocessedClaim {
                mixer: self.config.display_name().to_string(),
            }),
        }
    }
}

impl<T> fmt::Debug for LeafMixer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeafMixer")
            .field("config", &self.config)
            .field("has_check", &self.check_fn.is_some())
            .field("has_process", &self.process_fn.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composite::CompositeMixer;

    #[derive(Debug)]
    struct Reply(String);

    fn reply_with(
        text: &'static str,
    ) -> impl Fn(&mut ProcessContext<String>) -> MixResult<()> + Send + Sync + 'static {
        move |ctx| {
            ctx.set_state(Reply(format!("{text}:{}", ctx.item())));
            Ok(())
        }
    }

    #[test]
    fn test_leaf_without_check_accepts_nothing() {
        let leaf = LeafMixer::<String>::new("idle");
        let mut ctx = AcceptContext::new("ping".to_string());

        tokio_test::block_on(leaf.accept(&mut ctx)).unwrap();
        assert!(!ctx.is_accepted());
    }

    #[tokio::test]
    async fn test_leaves_route_by_predicate() {
        let root = CompositeMixer::new("commands")
            .with_child(
                LeafMixer::new("ping")
                    .accept_when(|s: &String| s == "ping")
                    .process_with(reply_with("pong")),
            )
            .with_child(
                LeafMixer::new("echo")
                    .accept_all()
                    .process_with(reply_with("echo")),
            );

        for (input, expected) in [("ping", "pong:ping"), ("hello", "echo:hello")] {
            let mut ctx = AcceptContext::new(input.to_string());
            root.accept(&mut ctx).await.unwrap();
            let mut process = ctx.into_process().unwrap();
            root.process(&mut process).await.unwrap();
            assert_eq!(
                process.get_state::<Reply>().map(|r| r.0.as_str()),
                Some(expected)
            );
        }
    }

    #[tokio::test]
    async fn test_accepting_leaf_without_processor_is_reported() {
        let leaf = LeafMixer::<String>::new("mute").accept_all();
        let mut ctx = AcceptContext::new("x".to_string());
        leaf.accept(&mut ctx).await.unwrap();

        let mut process = ctx.into_process().unwrap();
        let err = leaf.process(&mut process).await.unwrap_err();
        assert!(matches!(err, MixError::UnprocessedClaim { ref mixer } if mixer == "mute"));
    }

    #[tokio::test]
    async fn test_processor_errors_propagate_verbatim() {
        let leaf = LeafMixer::<String>::new("strict")
            .accept_all()
            .process_with(|_| Err(MixError::handler("quota exceeded")));
        let mut ctx = AcceptContext::new("x".to_string());
        leaf.accept(&mut ctx).await.unwrap();

        let mut process = ctx.into_process().unwrap();
        let err = leaf.process(&mut process).await.unwrap_err();
        assert_eq!(err.to_string(), "quota exceeded");
    }
}
