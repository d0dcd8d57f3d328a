//! Adapter wiring C8's narrow [`ToolEventSink`] seam onto the real
//! [`EventBus`], as `brain_tools::events` itself anticipates.

use brain_telemetry::EventBus;
use brain_tools::{ToolCallRecord, ToolEventSink};

/// Publishes every tool-call record onto a shared [`EventBus`].
pub struct EventBusSink<'a> {
    bus: &'a EventBus,
    source: &'a str,
}

impl<'a> EventBusSink<'a> {
    #[must_use]
    pub fn new(bus: &'a EventBus, source: &'a str) -> Self {
        Self { bus, source }
    }
}

impl ToolEventSink for EventBusSink<'_> {
    fn on_tool_call(&self, event_type: &str, record: &ToolCallRecord) {
        let data = serde_json::json!({
            "tool_name": record.tool_name,
            "ok": record.ok,
            "elapsed_ms": record.elapsed_ms,
            "confirmed": record.confirmed,
            "risk_level": format!("{:?}", record.risk_level),
        });
        self.bus.publish(event_type, data, self.source, None);
    }
}
