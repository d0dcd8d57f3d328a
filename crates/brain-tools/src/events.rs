//! The narrow seam C8 publishes through. Kept local rather than depending on
//! the event bus crate directly, so this crate doesn't have to know C10's
//! shape — an adapter in the runtime wires a [`ToolEventSink`] onto the real
//! bus.

use crate::types::ToolCallRecord;

/// Receives `tool.executed` / `tool.failed` notifications (spec §4.7 step 4).
pub trait ToolEventSink: Send + Sync {
    /// Called once per handler invocation, after the result is known.
    fn on_tool_call(&self, event_type: &str, record: &ToolCallRecord);
}

/// A sink that discards everything — the default for callers that don't
/// care about tool-call observability (tests, one-off scripts).
#[derive(Debug, Default)]
pub struct NullEventSink;

impl ToolEventSink for NullEventSink {
    fn on_tool_call(&self, _event_type: &str, _record: &ToolCallRecord) {}
}
