//! Tool handler dispatch table, grounded on `astrid-tools::ToolRegistry`'s
//! name-keyed lookup idiom (the capability surface itself — calendar/Gmail
//! backends — isn't in the retrieval pack, so handlers here are plugged in by
//! the caller rather than shipped as concrete calendar/Gmail clients).

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

/// One tool implementation: takes the step's params, returns either the raw
/// success payload or a user-safe error message (spec §4.7's `runner_fn`
/// contract, matched to `brain_tools::ToolExecutor::execute`).
pub type ToolHandler = Arc<dyn Fn(&BTreeMap<String, Value>) -> Result<Value, String> + Send + Sync>;

/// Name-keyed table of tool implementations, consulted once per plan step.
#[derive(Clone, Default)]
pub struct ToolHandlerRegistry {
    handlers: BTreeMap<String, ToolHandler>,
}

impl ToolHandlerRegistry {
    /// Build an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self { handlers: BTreeMap::new() }
    }

    /// Register `handler` under `name`, replacing any prior registration.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        handler: impl Fn(&BTreeMap<String, Value>) -> Result<Value, String> + Send + Sync + 'static,
    ) {
        self.handlers.insert(name.into(), Arc::new(handler));
    }

    /// Dispatch `name` with `params`. Unregistered tool names fail with a
    /// user-safe message rather than panicking — a stale `tool_plan` entry
    /// (e.g. from a router upgrade dropping a tool) shouldn't take the whole
    /// turn down.
    #[must_use]
    pub fn dispatch(&self, name: &str, params: &BTreeMap<String, Value>) -> Result<Value, String> {
        match self.handlers.get(name) {
            Some(handler) => handler(params),
            None => Err(format!("bilinmeyen araç: {name}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatches_to_registered_handler() {
        let mut registry = ToolHandlerRegistry::new();
        registry.register("calendar_query", |_| Ok(serde_json::json!({"events": []})));
        let result = registry.dispatch("calendar_query", &BTreeMap::new());
        assert_eq!(result.unwrap(), serde_json::json!({"events": []}));
    }

    #[test]
    fn unregistered_tool_fails_with_safe_message() {
        let registry = ToolHandlerRegistry::new();
        let result = registry.dispatch("mystery_tool", &BTreeMap::new());
        assert!(result.unwrap_err().contains("mystery_tool"));
    }
}
