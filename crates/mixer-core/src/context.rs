//! Per-input contexts for the two phases of routing.
//!
//! - [`AcceptContext`] lives for exactly one accept traversal. It carries the
//!   accepted flag, the [`Route`] of whichever mixer claimed the item, the
//!   optional diagnostic sink and the cancellation token.
//! - [`ProcessContext`] can only be obtained from an accepted
//!   [`AcceptContext`] through [`AcceptContext::into_process`]. It replays the
//!   claim route so that processing reaches exactly the claimant.
//!
//! Both are passed by `&mut`, so only the mixer currently executing can touch
//! them.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

use tokio_util::sync::CancellationToken;

use crate::diagnostics::BoxedSink;
use crate::error::{MixError, MixResult};

// =============================================================================
// Route
// =============================================================================

/// Path of child indices from the root mixer to a mixer in the tree.
///
/// The empty route designates the root itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Route(Vec<usize>);

impl Route {
    /// The route of the root mixer.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Returns the child indices of this route.
    pub fn hops(&self) -> &[usize] {
        &self.0
    }

    /// Returns how deep below the root the route ends.
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` for the root route.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<usize>> for Route {
    fn from(hops: Vec<usize>) -> Self {
        Self(hops)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("/");
        }
        for hop in &self.0 {
            write!(f, "/{hop}")?;
        }
        Ok(())
    }
}

// =============================================================================
// AcceptContext
// =============================================================================

/// Acceptance state of one traversal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AcceptState {
    /// Nobody claimed the item yet.
    #[default]
    Unaccepted,
    /// Terminal for this traversal.
    Accepted,
}

/// Mutable state threaded through one accept traversal.
pub struct AcceptContext<T> {
    item: T,
    state: AcceptState,
    claim: Option<Route>,
    /// Position of the mixer currently executing.
    cursor: Vec<usize>,
    sink: Option<BoxedSink>,
    cancel: CancellationToken,
}

impl<T> AcceptContext<T> {
    /// Creates an unaccepted context for `item`.
    pub fn new(item: T) -> Self {
        Self {
            item,
            state: AcceptState::Unaccepted,
            claim: None,
            cursor: Vec::new(),
            sink: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Attaches a diagnostic sink.
    pub fn with_sink(mut self, sink: BoxedSink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Uses `token` as the ambient cancellation signal.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Returns the item being routed.
    pub fn item(&self) -> &T {
        &self.item
    }

    /// Gives the item back, dropping the traversal state.
    pub fn into_item(self) -> T {
        self.item
    }

    /// Returns the current acceptance state.
    pub fn state(&self) -> AcceptState {
        self.state
    }

    /// Returns `true` once some mixer claimed the item.
    pub fn is_accepted(&self) -> bool {
        self.state == AcceptState::Accepted
    }

    /// Claims the item for the mixer currently executing.
    ///
    /// Only the first call in a traversal has an effect; the return value says
    /// whether this call was it.
    pub fn accept(&mut self) -> bool {
        if self.is_accepted() {
            return false;
        }
        self.state = AcceptState::Accepted;
        self.claim = Some(Route(self.cursor.clone()));
        true
    }

    /// Claims the item for the mixer currently executing, replacing any
    /// earlier claim.
    ///
    /// The state still moves to [`AcceptState::Accepted`] at most once; only
    /// the processing target changes.
    pub fn redirect(&mut self) {
        self.state = AcceptState::Accepted;
        self.claim = Some(Route(self.cursor.clone()));
    }

    /// Returns the route of the claimant, if any.
    pub fn claim(&self) -> Option<&Route> {
        self.claim.as_ref()
    }

    /// Returns `true` if the claim points at the mixer currently executing.
    pub fn is_claimed_here(&self) -> bool {
        self.claim
            .as_ref()
            .is_some_and(|route| route.hops() == self.cursor.as_slice())
    }

    /// Returns the position of the mixer currently executing.
    pub fn position(&self) -> &[usize] {
        &self.cursor
    }

    /// Returns the diagnostic sink, if one is attached.
    pub fn sink(&self) -> Option<&BoxedSink> {
        self.sink.as_ref()
    }

    /// Records a note in the diagnostic sink. No-op without a sink.
    pub fn note(&self, scope: &str, message: &str) -> MixResult<()> {
        match &self.sink {
            Some(sink) => sink.note(scope, message),
            None => Ok(()),
        }
    }

    /// Returns the ambient cancellation token.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Fails with [`MixError::Cancelled`] if cancellation was requested.
    pub fn checkpoint(&self) -> MixResult<()> {
        if self.cancel.is_cancelled() {
            Err(MixError::Cancelled)
        } else {
            Ok(())
        }
    }

    pub(crate) fn descend(&mut self, index: usize) {
        self.cursor.push(index);
    }

    pub(crate) fn ascend(&mut self) {
        self.cursor.pop();
    }

    /// Moves an accepted context into the process phase.
    ///
    /// Fails fast with [`MixError::NotAccepted`] otherwise, so an unclaimed
    /// item can never be processed.
    pub fn into_process(self) -> MixResult<ProcessContext<T>> {
        let Some(route) = self.claim else {
            return Err(MixError::NotAccepted);
        };
        Ok(ProcessContext {
            item: self.item,
            route,
            hop: 0,
            state: HashMap::new(),
            sink: self.sink,
            cancel: self.cancel,
        })
    }
}

impl<T: fmt::Debug> fmt::Debug for AcceptContext<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AcceptContext")
            .field("item", &self.item)
            .field("state", &self.state)
            .field("claim", &self.claim)
            .field("has_sink", &self.sink.is_some())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// ProcessContext
// =============================================================================

/// Mutable state threaded through the process phase.
pub struct ProcessContext<T> {
    item: T,
    route: Route,
    /// Number of route hops already taken.
    hop: usize,
    state: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
    sink: Option<BoxedSink>,
    cancel: CancellationToken,
}

impl<T> ProcessContext<T> {
    /// Returns the item being processed.
    pub fn item(&self) -> &T {
        &self.item
    }

    /// Returns the item mutably.
    pub fn item_mut(&mut self) -> &mut T {
        &mut self.item
    }

    /// Gives the item back.
    pub fn into_item(self) -> T {
        self.item
    }

    /// Returns the full route of the claimant.
    pub fn route(&self) -> &Route {
        &self.route
    }

    /// Returns the hops not taken yet.
    pub fn remaining_hops(&self) -> &[usize] {
        &self.route.hops()[self.hop..]
    }

    /// Returns `true` when the mixer currently executing is the claimant.
    pub fn is_at_claimant(&self) -> bool {
        self.hop == self.route.depth()
    }

    /// Takes the next hop towards the claimant.
    pub fn next_hop(&mut self) -> Option<usize> {
        let index = *self.route.hops().get(self.hop)?;
        self.hop += 1;
        Some(index)
    }

    /// Returns the diagnostic sink, if one is attached.
    pub fn sink(&self) -> Option<&BoxedSink> {
        self.sink.as_ref()
    }

    /// Returns the ambient cancellation token.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Fails with [`MixError::Cancelled`] if cancellation was requested.
    pub fn checkpoint(&self) -> MixResult<()> {
        if self.cancel.is_cancelled() {
            Err(MixError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Stores a value in the process state. One value per type; later calls
    /// overwrite.
    pub fn set_state<S: Send + Sync + 'static>(&mut self, value: S) {
        self.state.insert(TypeId::of::<S>(), Box::new(value));
    }

    /// Returns a reference to a stored value.
    pub fn get_state<S: 'static>(&self) -> Option<&S> {
        self.state
            .get(&TypeId::of::<S>())
            .and_then(|v| v.downcast_ref::<S>())
    }

    /// Returns `true` if a value of type `S` is stored.
    pub fn has_state<S: 'static>(&self) -> bool {
        self.state.contains_key(&TypeId::of::<S>())
    }

    /// Removes and returns a stored value.
    pub fn take_state<S: 'static>(&mut self) -> Option<S> {
        self.state
            .remove(&TypeId::of::<S>())
            .and_then(|v| v.downcast::<S>().ok())
            .map(|v| *v)
    }
}

impl<T: fmt::Debug> fmt::Debug for ProcessContext<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessContext")
            .field("item", &self.item)
            .field("route", &self.route)
            .field("hop", &self.hop)
            .field("state_len", &self.state.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accept_transitions_once() {
        let mut ctx = AcceptContext::new("item");
        assert_eq!(ctx.state(), AcceptState::Unaccepted);

        ctx.descend(1);
        assert!(ctx.accept());
        ctx.ascend();
        ctx.descend(2);
        assert!(!ctx.accept());
        ctx.ascend();

        assert!(ctx.is_accepted());
        assert_eq!(ctx.claim(), Some(&Route::from(vec![1])));
    }

    #[test]
    fn test_redirect_overrides_claim_without_reset() {
        let mut ctx = AcceptContext::new(());
        ctx.descend(0);
        ctx.accept();
        ctx.ascend();

        assert!(!ctx.is_claimed_here());
        ctx.redirect();
        assert!(ctx.is_claimed_here());
        assert_eq!(ctx.claim(), Some(&Route::root()));
        assert!(ctx.is_accepted());
    }

    #[test]
    fn test_unaccepted_context_cannot_be_processed() {
        let ctx = AcceptContext::new(7u32);
        assert!(matches!(ctx.into_process(), Err(MixError::NotAccepted)));
    }

    #[test]
    fn test_process_context_replays_route() {
        let mut ctx = AcceptContext::new(());
        ctx.descend(2);
        ctx.descend(0);
        ctx.accept();

        let mut process = ctx.into_process().unwrap();
        assert_eq!(process.route().to_string(), "/2/0");
        assert!(!process.is_at_claimant());
        assert_eq!(process.next_hop(), Some(2));
        assert_eq!(process.remaining_hops(), &[0]);
        assert_eq!(process.next_hop(), Some(0));
        assert!(process.is_at_claimant());
        assert_eq!(process.next_hop(), None);
    }

    #[test]
    fn test_process_state_is_type_keyed() {
        let mut ctx = AcceptContext::new(());
        ctx.accept();
        let mut process = ctx.into_process().unwrap();

        process.set_state(String::from("reply"));
        process.set_state(3u8);
        assert_eq!(process.get_state::<String>().map(String::as_str), Some("reply"));
        assert!(process.has_state::<u8>());
        assert_eq!(process.take_state::<u8>(), Some(3));
        assert!(!process.has_state::<u8>());
    }

    #[test]
    fn test_checkpoint_reports_cancellation() {
        let token = CancellationToken::new();
        let ctx = AcceptContext::new(()).with_cancellation(token.clone());
        assert!(ctx.checkpoint().is_ok());
        token.cancel();
        assert!(matches!(ctx.checkpoint(), Err(MixError::Cancelled)));
    }
}
