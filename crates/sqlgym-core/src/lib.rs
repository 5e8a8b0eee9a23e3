pub mod catalog;
pub mod config;
pub mod engine;
pub mod errors;
pub mod model;
pub mod normalize;
pub mod report;

pub use engine::{InstancePool, PooledInstance, RunPolicy, Runner};
pub use errors::{ConfigError, GymError};
pub use model::{RunOutcome, SchemaId, TableResult};
