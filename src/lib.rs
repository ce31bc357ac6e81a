// src/lib.rs
//
// fplpilot: applies a user's approved fantasy-league plan (transfers,
// captaincy, chips) to the platform, with validation up front, an
// append-only audit ledger of every attempt, and a locally reconstructed
// lineup as the authoritative post-apply record.

pub mod db;
pub mod domain;
pub mod error;
pub mod integrations;
pub mod repositories;
pub mod services;

pub use error::{AppError, AppResult};
pub use services::{ExecutionResult, PlanExecutionService, SnapshotCache};
