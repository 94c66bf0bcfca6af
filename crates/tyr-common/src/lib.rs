//! tyr-common: shared error taxonomy, engine configuration, partition IDs.

pub mod config;
pub mod error;
pub mod id;

pub use config::EngineConfig;
pub use error::{TyrError, TyrResult};
pub use id::PartitionId;
