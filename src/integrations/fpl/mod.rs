// src/integrations/fpl/mod.rs

pub mod client;
pub mod models;

pub use client::{FplApi, FplClient};
pub use models::{
    BootstrapData, PickData, RosterPicks, RosterSubmission, TransferItem, TransferPayload,
};

#[cfg(test)]
pub use client::MockFplApi;
