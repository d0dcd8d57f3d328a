//! C3: the grounding guard. Verifies a finalized candidate reply introduces
//! no numeric, temporal, currency, or percentage fact that wasn't already
//! present in the turn's source texts.

pub mod extract;
pub mod guard;
pub mod types;

pub use extract::{
    extract_currencies, extract_dates, extract_durations, extract_numbers, extract_percentages,
    extract_times, extract_turkish_numbers, normalize_number, normalize_time,
};
pub use guard::{validate, GroundingGuard};
pub use types::{GuardResult, Violation, ViolationType};
