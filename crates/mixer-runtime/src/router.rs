//! Router: drives a mixer tree for each incoming item.
//!
//! For every item the [`Router`]:
//!
//! 1. Creates an [`AcceptContext`] with its own child cancellation token
//! 2. Runs the accept traversal on the root mixer
//! 3. If some mixer claimed the item, moves to a [`ProcessContext`] and runs
//!    the process phase along the claim route
//!
//! The whole run is optionally bounded by a timeout. Independent items can be
//! routed concurrently; they never share a context.
//!
//! ```rust,ignore
//! use mixer_runtime::{Router, Routed};
//!
//! let router = Router::new(root).with_timeout(Duration::from_secs(1));
//! match router.route(item).await? {
//!     Routed::Processed(ctx) => println!("handled by {}", ctx.route()),
//!     Routed::Unclaimed(item) => println!("nobody wanted {item:?}"),
//! }
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Level, debug, span, trace, warn};

use crate::config::RoutingConfig;
use crate::error::{RuntimeError, RuntimeResult};
use crate::sink::TracingSink;
use mixer_core::{AcceptContext, BoxedMixer, BoxedSink, Mixer, ProcessContext};

/// Outcome of routing one item.
#[derive(Debug)]
pub enum Routed<T> {
    /// A mixer claimed and processed the item.
    Processed(ProcessContext<T>),
    /// No mixer claimed the item; it is handed back untouched.
    Unclaimed(T),
}

impl<T> Routed<T> {
    /// Returns `true` if the item was processed.
    pub fn is_processed(&self) -> bool {
        matches!(self, Self::Processed(_))
    }

    /// Returns the process context, if the item was processed.
    pub fn into_processed(self) -> Option<ProcessContext<T>> {
        match self {
            Self::Processed(ctx) => Some(ctx),
            Self::Unclaimed(_) => None,
        }
    }
}

/// Drives accept and process for each item against a fixed mixer tree.
pub struct Router<T: Send + 'static> {
    root: BoxedMixer<T>,
    sink: Option<BoxedSink>,
    timeout: Option<Duration>,
    concurrency: usize,
    shutdown: CancellationToken,
}

impl<T: Send + 'static> Router<T> {
    /// Creates a router over `root` with no sink and no timeout.
    pub fn new<M>(root: M) -> Self
    where
        M: Mixer<T> + 'static,
    {
        Self::from_boxed(Arc::new(root))
    }

    /// Creates a router over an already shared root.
    pub fn from_boxed(root: BoxedMixer<T>) -> Self {
        Self {
            root,
            sink: None,
            timeout: None,
            concurrency: RoutingConfig::default().concurrency,
            shutdown: CancellationToken::new(),
        }
    }

    /// Creates a router configured from [`RoutingConfig`].
    ///
    /// `diagnostics = true` attaches a [`TracingSink`].
    pub fn from_config(root: BoxedMixer<T>, config: &RoutingConfig) -> Self {
        let mut router = Self::from_boxed(root).with_concurrency(config.concurrency);
        router.timeout = config.timeout();
        if config.diagnostics {
            router.sink = Some(Arc::new(TracingSink::new()));
        }
        router
    }

    /// Attaches a diagnostic sink to every accept traversal.
    pub fn with_sink(mut self, sink: BoxedSink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Bounds each accept + process run.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets how many items [`route_all`](Self::route_all) keeps in flight.
    /// Values below 1 are treated as 1.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Returns the root mixer.
    pub fn root(&self) -> &BoxedMixer<T> {
        &self.root
    }

    /// Cancels every in-flight and future run.
    ///
    /// Runs observe the signal at their next step boundary and fail with
    /// [`MixError::Cancelled`](mixer_core::MixError::Cancelled).
    pub fn shutdown(&self) {
        debug!(root = self.root.name(), "Router shutting down");
        self.shutdown.cancel();
    }

    /// Returns `true` once [`shutdown`](Self::shutdown) was called.
    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Routes one item through the tree.
    pub async fn route(&self, item: T) -> RuntimeResult<Routed<T>> {
        let token = self.shutdown.child_token();
        let span = span!(Level::DEBUG, "route", root = self.root.name());
        let run = self.run(item, token.clone()).instrument(span);

        let Some(limit) = self.timeout else {
            return run.await;
        };

        match tokio::time::timeout(limit, run).await {
            Ok(result) => result,
            Err(_) => {
                token.cancel();
                warn!(root = self.root.name(), timeout = ?limit, "Routing timed out");
                Err(RuntimeError::TimedOut(limit))
            }
        }
    }

    /// Routes independent items concurrently.
    ///
    /// Results come back in input order. A failure for one item does not
    /// affect the others.
    pub async fn route_all<I>(&self, items: I) -> Vec<RuntimeResult<Routed<T>>>
    where
        I: IntoIterator<Item = T>,
    {
        stream::iter(items)
            .map(|item| self.route(item))
            .buffered(self.concurrency)
            .collect()
            .await
    }

    async fn run(&self, item: T, token: CancellationToken) -> RuntimeResult<Routed<T>> {
        let mut ctx = AcceptContext::new(item).with_cancellation(token);
        if let Some(sink) = &self.sink {
            ctx = ctx.with_sink(Arc::clone(sink));
        }

        self.root.accept(&mut ctx).await?;

        if !ctx.is_accepted() {
            debug!("No mixer accepted item");
            return Ok(Routed::Unclaimed(ctx.into_item()));
        }

        let mut process = ctx.into_process()?;
        trace!(claim = %process.route(), "Processing claimed item");
        self.root.process(&mut process).await?;

        debug!(claim = %process.route(), "Item processed");
        Ok(Routed::Processed(process))
    }
}

impl<T: Send + 'static> fmt::Debug for Router<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("root", &self.root.name())
            .field("has_sink", &self.sink.is_some())
            .field("timeout", &self.timeout)
            .field("concurrency", &self.concurrency)
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mixer_core::{
        CompositeMixer, DiagnosticEntry, Fallback, LeafMixer, MemorySink, MixError, MixResult,
        MixerConfig,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, PartialEq)]
    struct Label(&'static str);

    fn label(name: &'static str) -> impl Fn(&mut ProcessContext<i64>) -> MixResult<()> + Send + Sync + 'static {
        move |ctx| {
            ctx.set_state(Label(name));
            Ok(())
        }
    }

    fn numbers() -> CompositeMixer<i64> {
        CompositeMixer::new("numbers")
            .with_child(
                LeafMixer::new("negative")
                    .accept_when(|n: &i64| *n < 0)
                    .process_with(label("negative")),
            )
            .with_child(
                CompositeMixer::new("positive").with_child(
                    LeafMixer::new("even")
                        .accept_when(|n: &i64| *n > 0 && n % 2 == 0)
                        .process_with(label("even")),
                ),
            )
    }

    /// Leaf that sleeps before accepting and counts how often it ran.
    struct Slow {
        config: MixerConfig,
        delay: Duration,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Mixer<i64> for Slow {
        fn config(&self) -> &MixerConfig {
            &self.config
        }

        async fn accept(&self, ctx: &mut AcceptContext<i64>) -> MixResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            ctx.accept();
            Ok(())
        }

        async fn process(&self, ctx: &mut ProcessContext<i64>) -> MixResult<()> {
            ctx.set_state(Label("slow"));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_route_processes_claimed_item() {
        let router = Router::new(numbers());

        let routed = router.route(4).await.unwrap();
        let ctx = routed.into_processed().unwrap();
        assert_eq!(ctx.get_state::<Label>(), Some(&Label("even")));
        assert_eq!(ctx.route().to_string(), "/1/0");

        let routed = router.route(-3).await.unwrap();
        assert_eq!(
            routed.into_processed().unwrap().get_state::<Label>(),
            Some(&Label("negative"))
        );
    }

    #[tokio::test]
    async fn test_route_returns_unclaimed_item() {
        let router = Router::new(numbers());

        match router.route(7).await.unwrap() {
            Routed::Unclaimed(item) => assert_eq!(item, 7),
            Routed::Processed(_) => panic!("odd numbers have no claimant"),
        }
    }

    #[tokio::test]
    async fn test_route_with_fallback() {
        let router = Router::new(numbers().with_behavior(Fallback::new(label("fallback"))));

        let ctx = router.route(7).await.unwrap().into_processed().unwrap();
        assert_eq!(ctx.get_state::<Label>(), Some(&Label("fallback")));
        assert!(ctx.route().is_root());
    }

    #[tokio::test]
    async fn test_route_all_keeps_input_order() {
        let router = Router::new(numbers()).with_concurrency(2);

        let results = router.route_all([2, 7, -1, 8]).await;
        let processed: Vec<bool> = results
            .iter()
            .map(|r| r.as_ref().unwrap().is_processed())
            .collect();
        assert_eq!(processed, vec![true, false, true, true]);
    }

    #[tokio::test]
    async fn test_sink_receives_scopes() {
        let sink = Arc::new(MemorySink::new());
        let router = Router::new(numbers()).with_sink(sink.clone());

        router.route(2).await.unwrap();
        assert_eq!(sink.opened_scopes(), vec!["numbers", "positive"]);
        assert_eq!(
            sink.entries().last(),
            Some(&DiagnosticEntry::Close("numbers".into()))
        );
    }

    #[tokio::test]
    async fn test_shutdown_cancels_runs() {
        let router = Router::new(numbers());
        router.shutdown();

        let err = router.route(2).await.unwrap_err();
        assert!(err.is_cancelled());
        assert!(router.is_shut_down());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_bounds_a_run() {
        let calls = Arc::new(AtomicUsize::new(0));
        let slow = Slow {
            config: MixerConfig::new("slow"),
            delay: Duration::from_secs(5),
            calls: Arc::clone(&calls),
        };
        let router = Router::new(CompositeMixer::new("root").with_child(slow))
            .with_timeout(Duration::from_millis(100));

        let err = router.route(1).await.unwrap_err();
        assert!(matches!(err, RuntimeError::TimedOut(d) if d == Duration::from_millis(100)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_within_timeout_succeeds() {
        let slow = Slow {
            config: MixerConfig::new("slow"),
            delay: Duration::from_millis(10),
            calls: Arc::new(AtomicUsize::new(0)),
        };
        let router = Router::new(CompositeMixer::new("root").with_child(slow))
            .with_timeout(Duration::from_secs(1));

        let ctx = router.route(1).await.unwrap().into_processed().unwrap();
        assert_eq!(ctx.get_state::<Label>(), Some(&Label("slow")));
    }

    #[tokio::test]
    async fn test_from_config() {
        let config = RoutingConfig {
            timeout_ms: Some(500),
            diagnostics: true,
            concurrency: 0,
        };
        let router = Router::from_config(Arc::new(numbers()), &config);

        assert_eq!(router.timeout, Some(Duration::from_millis(500)));
        assert!(router.sink.is_some());
        assert_eq!(router.concurrency, 1);
        assert!(router.route(4).await.unwrap().is_processed());
    }

    #[tokio::test]
    async fn test_mixer_errors_are_wrapped() {
        let router = Router::new(
            CompositeMixer::new("root").with_child(
                LeafMixer::new("boom")
                    .accept_all()
                    .process_with(|_: &mut ProcessContext<i64>| Err(MixError::handler("boom"))),
            ),
        );

        let err = router.route(1).await.unwrap_err();
        assert!(matches!(err, RuntimeError::Mix(MixError::Handler(_))));
        assert_eq!(err.to_string(), "boom");
    }
}
