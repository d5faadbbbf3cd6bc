pub mod database;
pub mod local_cache;

pub use database::{Database, PoolConfig, SharedDatabase};
pub use local_cache::LocalCache;
