//! # ERBench Library
//!
//! This library exposes the ERBench app modules for testing and integration.
//!
//! The main binary uses these modules through the `main.rs` entry point.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod loader;
pub mod runner;
pub mod source;

// Re-export erbench_core for convenience
pub use erbench_core;
