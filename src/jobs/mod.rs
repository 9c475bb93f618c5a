// Background jobs

pub mod sweeper;

pub use sweeper::{SharedCatalogPath, SweeperHandle, run_sweep, spawn_sweeper};
