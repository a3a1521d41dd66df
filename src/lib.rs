//! sqlrun - Run a directory of SQL scripts and write each result set next to its script.
//!
//! This library exposes the core modules for use in integration tests.

pub mod cli;
pub mod config;
pub mod db;
pub mod discovery;
pub mod error;
pub mod executor;
pub mod gate;
pub mod logging;
pub mod operator;
pub mod output;
pub mod runner;
pub mod validator;
