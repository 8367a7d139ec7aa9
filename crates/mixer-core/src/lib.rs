//! # Mixer Core
//!
//! Composite accept/process routing.
//!
//! An item is routed through a tree of [`Mixer`]s in two phases:
//!
//! - **Accept**: a depth-first, first-match-wins search. A
//!   [`CompositeMixer`] runs its pre-accept hook, tries its children in order
//!   until one accepts, then runs its post-accept hook. The result lives in
//!   the [`AcceptContext`]: an accepted flag that flips at most once, and the
//!   [`Route`] of the claimant.
//! - **Process**: only reachable from an accepted context, through
//!   [`AcceptContext::into_process`]. The [`ProcessContext`] replays the claim
//!   route so that exactly the claimant processes the item.
//!
//! ```text
//! AcceptContext ──accept──▶ root ──▶ pre hook
//!                                ──▶ child 0 ──▶ ... (depth-first)
//!                                ──▶ child 1  ✓ accepted, stop
//!                                ──▶ post hook
//!        │ into_process()
//!        ▼
//! ProcessContext ──process──▶ root ──route /1──▶ child 1
//! ```
//!
//! Every step is an `.await`; the cancellation token in the context is checked
//! between steps.
//!
//! Leaf decision logic, diagnostic sinks and item shapes are supplied by the
//! caller. [`LeafMixer`], the behaviors in [`hooks`] and [`MemorySink`] are
//! small ready-made implementations.

pub mod composite;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod error;
pub mod hooks;
pub mod leaf;
pub mod mixer;

pub use composite::{CompositeBehavior, CompositeMixer, Passthrough};
pub use config::MixerConfig;
pub use context::{AcceptContext, AcceptState, ProcessContext, Route};
pub use diagnostics::{BoxedSink, DiagnosticEntry, DiagnosticSink, MemorySink};
pub use error::{BoxError, MixError, MixResult};
pub use hooks::{Fallback, Intercept, Override};
pub use leaf::LeafMixer;
pub use mixer::{BoxedMixer, CheckFn, Mixer, ProcessFn};

pub use tokio_util::sync::CancellationToken;
