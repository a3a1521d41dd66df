//! Integration tests for sqlrun.

pub mod batch_test;
pub mod cli_test;
pub mod postgres_test;
