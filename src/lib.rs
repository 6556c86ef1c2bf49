mod batch_function;
mod cache;
mod loader;
mod loader_op;
mod loader_worker;
mod stats;

pub mod association;
pub mod config;
pub mod context;
pub mod depth;
pub mod error;
pub mod gateway;
pub mod loaders;
pub mod memory_store;
pub mod model;
pub mod prefetch;
pub mod schema;
pub mod store;

pub use batch_function::BatchFunction;
pub use loader::{Dispatch, Loader};
pub use stats::LoaderStats;
