//! Tool risk registry (spec §4.5 "register", "tools_by_risk", "get_tool_risk").

use std::collections::{HashMap, HashSet};

use brain_core::types::RiskLevel;

/// Static configuration for one registered tool: its risk tier and whether
/// it opts into a params fingerprint on its `PendingAction` when moderate
/// (DESIGN.md Open Question #2 — destructive tools always get one, safe
/// tools never do, moderate tools only when they ask for it here).
#[derive(Debug, Clone)]
pub struct ToolDefinition {
    /// Registered tool name.
    pub name: String,
    /// Risk tier.
    pub risk: RiskLevel,
    /// Whether a moderate-risk tool's pending action should carry a params
    /// fingerprint. Ignored for safe/destructive tools.
    pub idempotent: bool,
}

impl ToolDefinition {
    /// Build a new tool definition, defaulting `idempotent` to `false`.
    #[must_use]
    pub fn new(name: impl Into<String>, risk: RiskLevel) -> Self {
        Self { name: name.into(), risk, idempotent: false }
    }

    /// Mark this tool as opting into a moderate-tier fingerprint.
    #[must_use]
    pub fn idempotent(mut self) -> Self {
        self.idempotent = true;
        self
    }
}

/// In-memory registry of tool risk tiers, consulted by C8's confirmation
/// firewall independent of whatever the LLM itself claims about a tool.
#[derive(Debug, Clone)]
pub struct ToolRiskRegistry {
    tools: HashMap<String, ToolDefinition>,
    default_risk: RiskLevel,
}

impl ToolRiskRegistry {
    /// Build an empty registry with the given default risk for unregistered
    /// tools (spec: `get_tool_risk(name, default=moderate)`).
    #[must_use]
    pub fn new(default_risk: RiskLevel) -> Self {
        Self { tools: HashMap::new(), default_risk }
    }

    /// Register or overwrite a tool's definition.
    pub fn register(&mut self, def: ToolDefinition) {
        self.tools.insert(def.name.clone(), def);
    }

    /// Look up a tool's risk tier, falling back to the registry default.
    #[must_use]
    pub fn get_tool_risk(&self, name: &str) -> RiskLevel {
        self.tools.get(name).map_or(self.default_risk, |def| def.risk)
    }

    /// Whether `name` opted into a moderate-tier fingerprint.
    #[must_use]
    pub fn is_idempotent(&self, name: &str) -> bool {
        self.tools.get(name).is_some_and(|def| def.idempotent)
    }

    /// All tool names registered at the given risk tier.
    #[must_use]
    pub fn tools_by_risk(&self, risk: RiskLevel) -> HashSet<String> {
        self.tools.values().filter(|def| def.risk == risk).map(|def| def.name.clone()).collect()
    }
}

impl Default for ToolRiskRegistry {
    /// The default registry: calendar/gmail reads are safe, creates/modifies
    /// are moderate, deletions/cancellations are destructive.
    fn default() -> Self {
        let mut registry = Self::new(RiskLevel::Moderate);
        registry.register(ToolDefinition::new("calendar_query", RiskLevel::Safe));
        registry.register(ToolDefinition::new("gmail_search", RiskLevel::Safe));
        registry.register(ToolDefinition::new("gmail_read", RiskLevel::Safe));
        registry.register(ToolDefinition::new("calendar_create", RiskLevel::Moderate).idempotent());
        registry.register(ToolDefinition::new("calendar_modify", RiskLevel::Moderate).idempotent());
        registry.register(ToolDefinition::new("gmail_send", RiskLevel::Moderate).idempotent());
        registry.register(ToolDefinition::new("calendar_cancel", RiskLevel::Destructive));
        registry.register(ToolDefinition::new("gmail_delete", RiskLevel::Destructive));
        registry
    }
}
