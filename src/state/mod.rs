//! State module for tracking run progress and stock verdicts
//!
//! # Components
//!
//! - `RunState`: the orchestrator's per-category state machine
//! - `StockStatus` / `Badge`: the verdict and category vocabulary
//! - `aggregate`: reduces variant counts into a parent verdict

mod run_state;
mod stock;

// Re-export main types
pub use run_state::RunState;
pub use stock::{aggregate, Badge, StockCounts, StockStatus};
