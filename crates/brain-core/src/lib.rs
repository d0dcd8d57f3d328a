//! Foundation types and text utilities shared by every brain runtime crate.
//!
//! Mirrors the role `astrid-core` plays for the teacher runtime: no crate in
//! this workspace other than `brain-core` itself may be a dependency of this
//! crate.

pub mod error;
pub mod ids;
pub mod text;
pub mod types;

pub mod prelude {
    //! Common re-exports for downstream crates.
    pub use crate::error::{CoreError, CoreResult};
    pub use crate::ids::{ArtifactId, RunId, SessionId, ToolCallId};
    pub use crate::types::{
        CalendarIntent, CompactSummary, EntityRef, OrchestratorOutput, OrchestratorState,
        PendingAction, RiskLevel, Route, ToolResult, ToolStatus,
    };
}
