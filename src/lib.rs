//! Dremio runner - executes SQL against Dremio over ODBC and diagnoses
//! failed queries through the Dremio management API.
//!
//! This library exposes the core modules for the binary and integration tests.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod runner;

pub use error::{Result, RunnerError};
pub use runner::DremioRunner;
