// src/domain/league/mod.rs

pub mod entity;

pub use entity::{FieldPosition, Fixture, Gameweek, Player, PlayerMetrics, Snapshot, Team};
