//! Run tracker CLI library.
//!
//! This crate provides the CLI interface for the run tracker.

mod cli;
pub mod commands;

pub use cli::{Cli, Commands};
