pub mod aggregator;
pub mod dispatcher;
pub mod engine;
pub mod registry;
pub mod retry;
pub mod trip_calls;

#[cfg(test)]
pub(crate) mod test_support;

pub use crate::domain::model::{CapabilityCall, OutcomeMap, ServiceKind, ServiceOutcome, TripResult};
pub use crate::domain::ports::{CapabilityHandle, ConfigProvider, Interpreter};
pub use crate::utils::error::Result;
