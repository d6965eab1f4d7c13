//! Integration tests for the Dremio runner.

pub mod diagnose_test;
pub mod live_test;
pub mod runner_test;
