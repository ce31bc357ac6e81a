// src/domain/plan/mod.rs

pub mod entity;
pub mod invariants;

pub use entity::{Chip, LineupSwap, Plan, PlanStatus, Transfer};
pub use invariants::validate_plan;
