//! Test harness utilities shared by the behavioural and unit suites.

mod bridge_world;
mod config_loader;
mod handlers;
mod reporter;
mod world;

pub use bridge_world::BridgeWorld;
pub use config_loader::{FailingConfigLoader, TestConfigLoader};
pub use handlers::probe_factory;
pub use reporter::{HealthEvent, RecordingHealthReporter};
pub use world::{TestWorld, world};
