//! A diagnostic sink backed by `tracing`.

use mixer_core::{DiagnosticSink, MixResult};
use tracing::{Level, debug, event};

/// Turns diagnostic scopes and notes into `tracing` events under the
/// `mixer::diagnostics` target.
///
/// Stateless, so a single instance can be shared by every routed item.
#[derive(Debug, Clone, Copy)]
pub struct TracingSink {
    level: Level,
}

impl Default for TracingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl TracingSink {
    /// Creates a sink emitting notes at DEBUG.
    pub fn new() -> Self {
        Self {
            level: Level::DEBUG,
        }
    }

    /// Sets the level used for notes. Scope events are always TRACE.
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }
}

impl DiagnosticSink for TracingSink {
    fn open_scope(&self, scope: &str) -> MixResult<()> {
        event!(target: "mixer::diagnostics", Level::TRACE, scope, "open");
        Ok(())
    }

    fn close_scope(&self, scope: &str) {
        event!(target: "mixer::diagnostics", Level::TRACE, scope, "close");
    }

    fn note(&self, scope: &str, message: &str) -> MixResult<()> {
        // `event!` needs a constant level.
        if self.level == Level::ERROR {
            event!(target: "mixer::diagnostics", Level::ERROR, scope, "{message}");
        } else if self.level == Level::WARN {
            event!(target: "mixer::diagnostics", Level::WARN, scope, "{message}");
        } else if self.level == Level::INFO {
            event!(target: "mixer::diagnostics", Level::INFO, scope, "{message}");
        } else if self.level == Level::DEBUG {
            debug!(target: "mixer::diagnostics", scope, "{message}");
        } else {
            event!(target: "mixer::diagnostics", Level::TRACE, scope, "{message}");
        }
        Ok(())
    }
}
