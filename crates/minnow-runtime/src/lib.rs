//! Effect orchestration for minnow: the dependency coordinator that drives
//! package-manager operations through the per-project queue, and the event
//! bus that fans resulting core events out to observers.

pub mod bus;
pub mod coordinator;

pub use bus::{CoreEventBus, CoreEventBusConfig, CoreEventEnvelope};
pub use coordinator::DependencyCoordinator;
