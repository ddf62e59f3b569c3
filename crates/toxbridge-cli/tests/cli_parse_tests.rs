//! Argument parsing of the `toxbridge` binary

use clap::Parser;
use toxbridge_cli::{Cli, Commands};

#[test]
fn test_simulate_defaults() {
    let cli = Cli::try_parse_from(["toxbridge", "simulate"]).unwrap();
    match cli.command {
        Commands::Simulate {
            peers,
            seconds,
            state,
            options,
        } => {
            assert_eq!(peers, 3);
            assert_eq!(seconds, 5);
            assert!(state.is_none());
            assert!(options.is_empty());
        }
        _ => panic!("expected simulate"),
    }
    assert!(!cli.verbose);
}

#[test]
fn test_simulate_with_options_and_global_flags() {
    let cli = Cli::try_parse_from([
        "toxbridge",
        "simulate",
        "--peers",
        "7",
        "--seconds",
        "2",
        "--state",
        "prefs.json",
        "-o",
        "dht_server=10.0.0.1",
        "-o",
        "dht_server_port=4242",
        "--verbose",
        "--config",
        "bridge.toml",
    ])
    .unwrap();

    assert!(cli.verbose);
    assert_eq!(cli.config.as_deref(), Some("bridge.toml"));
    match cli.command {
        Commands::Simulate {
            peers,
            state,
            options,
            ..
        } => {
            assert_eq!(peers, 7);
            assert_eq!(state.as_deref(), Some("prefs.json"));
            assert_eq!(options.len(), 2);
        }
        _ => panic!("expected simulate"),
    }
}

#[test]
fn test_key_requires_argument() {
    assert!(Cli::try_parse_from(["toxbridge", "key"]).is_err());
    let cli = Cli::try_parse_from(["toxbridge", "key", "ABCD"]).unwrap();
    assert!(matches!(cli.command, Commands::Key { hex } if hex == "ABCD"));
}

#[test]
fn test_state_and_info() {
    let cli = Cli::try_parse_from(["toxbridge", "state", "prefs.json"]).unwrap();
    assert!(matches!(cli.command, Commands::State { file } if file == "prefs.json"));
    let cli = Cli::try_parse_from(["toxbridge", "info"]).unwrap();
    assert!(matches!(cli.command, Commands::Info));
}
