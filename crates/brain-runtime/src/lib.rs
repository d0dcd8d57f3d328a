//! C13: the turn-level runtime that ties every other module together (spec
//! §4.12, §6). [`turn::process_turn`] is the single entry point; everything
//! else in this crate is plumbing it depends on — a dispatch table for tool
//! handlers ([`handlers::ToolHandlerRegistry`]) and an adapter publishing
//! tool-call outcomes onto the shared event bus ([`event_sink::EventBusSink`]).

pub mod error;
pub mod event_sink;
pub mod handlers;
pub mod turn;

pub use error::{RuntimeError, RuntimeResult};
pub use event_sink::EventBusSink;
pub use handlers::{ToolHandler, ToolHandlerRegistry};
pub use turn::{process_turn, TurnDeps};
