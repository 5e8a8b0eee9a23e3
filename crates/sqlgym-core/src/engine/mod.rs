pub mod instance;
pub mod pool;
pub mod runner;

pub use instance::EngineInstance;
pub use pool::{InstancePool, PoolStats, PooledInstance};
pub use runner::{RunPolicy, Runner};
