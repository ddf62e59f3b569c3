//! Tox bridge CLI library
//!
//! Command parsing, configuration loading and the command handlers behind the
//! `toxbridge` binary.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;

pub use cli::{Cli, Commands};
pub use config::AppConfig;
pub use error::{CliError, Result};
