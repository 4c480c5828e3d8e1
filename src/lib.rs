// Library module for desiderata
// Re-exports modules for use in integration tests and the CLI

pub mod config;
pub mod hash;

pub use config::Config;
pub use hash::HashUtilityError;
