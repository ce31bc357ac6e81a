// src/services/mod.rs
//
// Application services. The execution service is the entry point; the
// executors and reconciler below it each own one step of applying a plan.

pub mod captaincy_executor;
pub mod chip_executor;
mod executor_support;
pub mod lineup_reconciler;
pub mod plan_execution_service;
pub mod plan_validator;
pub mod snapshot_service;
pub mod transfer_executor;

#[cfg(test)]
mod plan_execution_tests;

pub use captaincy_executor::CaptaincyExecutor;
pub use chip_executor::ChipExecutor;
pub use lineup_reconciler::LineupReconciler;
pub use plan_execution_service::{ExecutionResult, PlanExecutionService};
pub use plan_validator::{PlanValidator, ValidationError};
pub use snapshot_service::{Clock, SnapshotCache, SystemClock};
pub use transfer_executor::TransferExecutor;
