//! Diagnostic sinks.
//!
//! A [`DiagnosticSink`] receives named scopes around each composite traversal
//! and free-form notes from hooks. It is optional: an accept context without a
//! sink behaves exactly the same, minus the entries.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::MixResult;

/// A shared, type-erased diagnostic sink.
pub type BoxedSink = Arc<dyn DiagnosticSink>;

/// Receives scoped, named diagnostic entries.
pub trait DiagnosticSink: Send + Sync {
    /// Opens a scope named after the mixer that is about to traverse.
    fn open_scope(&self, scope: &str) -> MixResult<()>;

    /// Closes the scope opened by the matching [`open_scope`](Self::open_scope).
    fn close_scope(&self, scope: &str);

    /// Records a message inside the current scope.
    fn note(&self, scope: &str, message: &str) -> MixResult<()> {
        let _ = (scope, message);
        Ok(())
    }
}

/// A single entry recorded by [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticEntry {
    /// A scope was opened.
    Open(String),
    /// A scope was closed.
    Close(String),
    /// A note was recorded in a scope.
    Note {
        /// The scope the note belongs to.
        scope: String,
        /// The note text.
        message: String,
    },
}

/// A sink that keeps every entry in memory.
///
/// Useful to inspect traversal order after the fact.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<DiagnosticEntry>>,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all recorded entries.
    pub fn entries(&self) -> Vec<DiagnosticEntry> {
        self.entries.lock().clone()
    }

    /// Returns the names of opened scopes, in order.
    pub fn opened_scopes(&self) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .filter_map(|entry| match entry {
                DiagnosticEntry::Open(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    /// Drops all recorded entries.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl DiagnosticSink for MemorySink {
    fn open_scope(&self, scope: &str) -> MixResult<()> {
        self.entries
            .lock()
            .push(DiagnosticEntry::Open(scope.to_string()));
        Ok(())
    }

    fn close_scope(&self, scope: &str) {
        self.entries
            .lock()
            .push(DiagnosticEntry::Close(scope.to_string()));
    }

    fn note(&self, scope: &str, message: &str) -> MixResult<()> {
        self.entries.lock().push(DiagnosticEntry::Note {
            scope: scope.to_string(),
            message: message.to_string(),
        });
        Ok(())
    }
}
