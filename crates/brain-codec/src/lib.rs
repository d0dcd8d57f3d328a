//! C2: turns a router/finalizer's raw text response into a validated
//! [`brain_core::types::OrchestratorOutput`], tolerating markdown fencing,
//! trailing prose, wrong enum values, and coercible type mismatches before
//! falling back to an LLM-based repair pass.

pub mod error;
pub mod extract;
pub mod llm_repair;
pub mod repair;
pub mod validate;

pub use error::{CodecError, CodecResult};
pub use extract::extract_first_json_object;
pub use llm_repair::{build_repair_prompt, repair_to_json_object, RepairLlm, RepairResult};
pub use repair::{
    extract_json_from_text, get_repair_stats, repair_intent_enum, repair_json_structure,
    repair_route_enum, repair_tool_plan, reset_repair_stats, RepairStats,
};
pub use validate::{validate, validate_and_repair};
