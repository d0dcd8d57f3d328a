//! Optional observability hook into the trim pipeline (spec §4.4: "The tracer
//! (if provided) records the initial `begin_turn`, the final
//! `record_injection`, and any `record_trim`").

/// Implemented by callers that want to observe context composition, e.g. to
/// log trim decisions or feed C10's telemetry bus. A no-op default is
/// provided via [`NullTracer`].
pub trait MemoryTracer: Send + Sync {
    /// Called once at the start of composition with the raw user input.
    fn begin_turn(&self, user_input: &str);
    /// Called once a section has survived trimming and is being injected.
    fn record_injection(&self, section: &str, char_len: usize);
    /// Called each time a section is trimmed or dropped to fit the budget.
    fn record_trim(&self, section: &str, reason: &str);
}

/// A [`MemoryTracer`] that discards every event, used when no tracer is
/// supplied.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTracer;

impl MemoryTracer for NullTracer {
    fn begin_turn(&self, _user_input: &str) {}
    fn record_injection(&self, _section: &str, _char_len: usize) {}
    fn record_trim(&self, _section: &str, _reason: &str) {}
}

/// A [`MemoryTracer`] that logs every event via `tracing`, useful as a quick
/// default for binaries that don't wire up C10.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTracer;

impl MemoryTracer for TracingTracer {
    fn begin_turn(&self, user_input: &str) {
        tracing::debug!(chars = user_input.len(), "context: begin_turn");
    }

    fn record_injection(&self, section: &str, char_len: usize) {
        tracing::debug!(section, char_len, "context: inject section");
    }

    fn record_trim(&self, section: &str, reason: &str) {
        tracing::debug!(section, reason, "context: trim section");
    }
}
