// src/integrations/mod.rs
//
// External-facing boundary: the league API client plus the capability traits
// for collaborators this subsystem consumes but does not implement.

pub mod fpl;
pub mod metrics;
pub mod session;

pub use fpl::{FplApi, FplClient};
pub use metrics::MetricsProvider;
pub use session::{AuthHeaders, SessionProvider};
