//! anomaly-sweep — multi-pass anomaly ranking
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod types;
pub mod config;
pub mod cli;
pub mod capture;
pub mod extract;
pub mod engine;
pub mod aggregate;
pub mod runner;
pub mod report;
pub mod storage;
