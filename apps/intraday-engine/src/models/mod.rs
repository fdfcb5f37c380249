//! Wire-level data types shared across the engine.

mod plan;
mod tick;

pub use plan::{Direction, Plan, PlanStatus, Tier};
pub use tick::{CleanTick, Tick};
