pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::PlannerConfig;
pub use core::{engine::OrchestrationEngine, registry::CapabilityRegistry};
pub use domain::intent::{TripIntent, TripRequest};
pub use domain::model::{ErrorKind, ServiceKind, ServiceOutcome, TripResult, TripStatus};
pub use utils::error::{PlannerError, Result};
