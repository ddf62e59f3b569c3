//! Command-line interface definitions and parsing

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a bridge against scripted peers on the simulated network
    Simulate {
        /// Number of scripted peers
        #[arg(short, long, default_value_t = 3)]
        peers: usize,
        /// How long to run
        #[arg(short, long, default_value_t = 5)]
        seconds: u64,
        /// Preference file holding the saved network state
        #[arg(long)]
        state: Option<String>,
        /// Account option override, as NAME=VALUE (e.g. dht_server_port=33445)
        #[arg(short, long = "option", value_name = "NAME=VALUE")]
        options: Vec<String>,
    },
    /// Validate an identifier and print its normalized form
    Key {
        /// 64 hex digits
        hex: String,
    },
    /// Inspect a preference file holding saved network state
    State {
        /// Preference file path
        file: String,
    },
    /// Print what the bridge registers with the host client
    Info,
}
