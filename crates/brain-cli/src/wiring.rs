//! Wires every crate together into one [`Runtime`], the way `astrid-cli`'s
//! daemon bootstrap builds a `GatewayRuntime` from a `GatewayConfig`. This is
//! demo wiring only — a real embedder would register its own tool handlers
//! and choose its own provider endpoints.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use brain_approval::ToolRiskRegistry;
use brain_config::BrainConfig;
use brain_context::{ContextBudget, ContextBuilder};
use brain_core::ids::SessionId;
use brain_core::types::OrchestratorState;
use brain_gating::GatingPolicy;
use brain_idempotency::{create_with_idempotency, IdempotencyStore};
use brain_llm::{LlmProvider, OpenAiCompatProvider, ProviderConfig};
use brain_memory::PersistentDialogSummaryManager;
use brain_orchestrator::HybridOrchestrator;
use brain_runtime::{ToolHandlerRegistry, TurnDeps};
use brain_telemetry::{EventBus, RunTracker};
use brain_tools::ToolExecutor;

/// Every long-lived subsystem one `brain chat`/`brain doctor` process needs,
/// owned so [`TurnDeps`] can borrow from it per turn.
pub struct Runtime {
    pub hybrid: HybridOrchestrator,
    pub tool_executor: ToolExecutor,
    pub tool_handlers: ToolHandlerRegistry,
    pub memory: PersistentDialogSummaryManager,
    pub context_builder: ContextBuilder,
    pub telemetry: RunTracker,
    pub event_bus: EventBus,
    pub session_id: SessionId,
}

fn router_provider() -> Box<dyn LlmProvider> {
    let base_url = std::env::var("ROUTER_BASE_URL")
        .unwrap_or_else(|_| "http://localhost:8000/v1/chat/completions".to_string());
    let model = std::env::var("ROUTER_MODEL").unwrap_or_else(|_| "local-router".to_string());
    let mut config = ProviderConfig::new(base_url, model);
    if let Ok(key) = std::env::var("ROUTER_API_KEY") {
        config = config.with_api_key(key);
    }
    Box::new(OpenAiCompatProvider::new(config))
}

fn finalizer_provider(config: &BrainConfig) -> Option<Box<dyn LlmProvider>> {
    if !config.finalizer.finalizer_usable() {
        return None;
    }
    let base_url = std::env::var("FINALIZER_BASE_URL")
        .unwrap_or_else(|_| "https://generativelanguage.googleapis.com/v1beta/chat/completions".to_string());
    let model = config.finalizer.model.clone().unwrap_or_else(|| "gemini-1.5-flash".to_string());
    let mut provider_config = ProviderConfig::new(base_url, model);
    if let Ok(key) = std::env::var("FINALIZER_API_KEY") {
        provider_config = provider_config.with_api_key(key);
    }
    Some(Box::new(OpenAiCompatProvider::new(provider_config)))
}

fn register_demo_handlers(registry: &mut ToolHandlerRegistry, idempotency: Arc<IdempotencyStore>) {
    registry.register("calendar_query", |_params| Ok(serde_json::json!({ "events": [] })));
    registry.register("calendar_create", move |params| {
        let title = params.get("title").and_then(|v| v.as_str()).unwrap_or("Untitled").to_string();
        let start = params.get("start").and_then(|v| v.as_str()).unwrap_or("").to_string();
        let end = params.get("end").and_then(|v| v.as_str()).unwrap_or("").to_string();
        let calendar_id = params.get("calendar_id").and_then(|v| v.as_str()).unwrap_or("primary").to_string();
        let event_title = title.clone();
        let outcome = create_with_idempotency(&idempotency, &title, &start, &end, &calendar_id, || {
            Ok((brain_core::ids::RunId::new().to_string(), serde_json::json!({ "title": event_title })))
        })
        .map_err(|err| err.to_string())?;
        Ok(serde_json::json!({ "created": true, "duplicate": outcome.duplicate, "event": outcome.event }))
    });
    registry.register("calendar_modify", |params| {
        Ok(serde_json::json!({ "modified": true, "slots": params }))
    });
    registry.register("calendar_cancel", |_params| Ok(serde_json::json!({ "cancelled": true })));
    registry.register("gmail_search", |_params| Ok(serde_json::json!({ "messages": [] })));
    registry.register("gmail_send", |params| Ok(serde_json::json!({ "sent": true, "slots": params })));
}

impl Runtime {
    /// Build every subsystem from `config`, ready to process turns.
    pub fn build(config: &BrainConfig) -> Result<Self> {
        let router = router_provider();
        let finalizer = finalizer_provider(config);
        let gating = Arc::new(GatingPolicy::new(config.gating.clone()));
        let hybrid = HybridOrchestrator::new(router, finalizer, gating, config.finalizer.clone());

        let tool_executor = ToolExecutor::new(ToolRiskRegistry::default());
        let mut tool_handlers = ToolHandlerRegistry::new();
        if let Some(parent) = config.idempotency.store_path.parent() {
            std::fs::create_dir_all(parent).context("creating idempotency store directory")?;
        }
        let idempotency =
            Arc::new(IdempotencyStore::open(config.idempotency.store_path.clone(), config.idempotency.ttl_seconds as i64));
        register_demo_handlers(&mut tool_handlers, idempotency);

        if let Some(parent) = config.memory.db_path.parent() {
            std::fs::create_dir_all(parent).context("creating memory db directory")?;
        }
        let memory = PersistentDialogSummaryManager::create(&config.memory).context("loading dialog memory manager")?;

        let context_builder = ContextBuilder::new(ContextBudget::default());

        let telemetry_path = telemetry_db_path();
        if let Some(parent) = telemetry_path.parent() {
            std::fs::create_dir_all(parent).context("creating telemetry db directory")?;
        }
        let telemetry = RunTracker::open(&telemetry_path).context("opening run tracker")?;

        let event_bus = EventBus::default();
        let session_id = memory.session_id().clone();

        Ok(Self { hybrid, tool_executor, tool_handlers, memory, context_builder, telemetry, event_bus, session_id })
    }

    /// Borrow every subsystem for one `process_turn` call.
    pub fn deps(&mut self) -> TurnDeps<'_> {
        TurnDeps {
            hybrid: &self.hybrid,
            tool_executor: &self.tool_executor,
            tool_handlers: &self.tool_handlers,
            memory: &mut self.memory,
            context_builder: &mut self.context_builder,
            telemetry: &self.telemetry,
            event_bus: &self.event_bus,
        }
    }

    /// Fresh state for a new session, pinned to this process's session id.
    pub fn initial_state(&self) -> OrchestratorState {
        OrchestratorState::new(self.session_id.clone())
    }
}

fn telemetry_db_path() -> PathBuf {
    directories::BaseDirs::new()
        .map(|b| b.home_dir().join(".bantz").join("runs.db"))
        .unwrap_or_else(|| PathBuf::from(".bantz/runs.db"))
}
