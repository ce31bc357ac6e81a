// src/domain/mod.rs
//
// Domain Root - The Single Source of Truth for Domain API
//
// This file declares all domain modules and re-exports their public API.
// All other modules import from `crate::domain::*`

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod audit;
pub mod league;
pub mod plan;
pub mod roster;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Plan Domain
pub use plan::{validate_plan, Chip, LineupSwap, Plan, PlanStatus, Transfer};

// Roster Domain
pub use roster::{
    validate_roster, AppliedLineup, RosterEntry, RosterMutation, SQUAD_SIZE, STARTING_ELEVEN,
};

// League Domain (read-only snapshot data)
pub use league::{FieldPosition, Fixture, Gameweek, Player, PlayerMetrics, Snapshot, Team};

// Audit Ledger
pub use audit::{AuditRecord, ChangeType};

// ============================================================================
// DOMAIN ERROR TYPES
// ============================================================================

use thiserror::Error;

/// Domain-level errors
/// These represent violations of business rules and invariants
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Entity not found: {0}")]
    NotFound(String),
}

/// Domain result type
pub type DomainResult<T> = Result<T, DomainError>;
