// Stowage Library
// Cargo stowage bookkeeping - registries, placement, waste lifecycle and day simulation

pub mod config;
pub mod csv_io;
mod de;
pub mod error;
pub mod log_store;
pub mod placement;
pub mod registry;
pub mod server;
pub mod service;
pub mod simulation;
pub mod timestamp;
pub mod types;
pub mod waste;

pub use config::StowageConfig;
pub use error::{StowageError, StowageResult};
pub use service::Stowage;
