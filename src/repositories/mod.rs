// src/repositories/mod.rs
//
// Persistence layer: trait per aggregate, SQLite implementation per trait.

pub mod audit_repository;
pub mod lineup_repository;
pub mod plan_repository;

pub use audit_repository::{AuditRepository, SqliteAuditRepository};
pub use lineup_repository::{LineupRepository, SqliteLineupRepository};
pub use plan_repository::{PlanRepository, SqlitePlanRepository};
