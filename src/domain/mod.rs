// Domain layer: trip models and ports (interfaces). Only std/serde/chrono here.

pub mod agent_card;
pub mod intent;
pub mod model;
pub mod ports;
