//! Command handlers for the bridge CLI

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::{debug, info, warn};

use toxbridge_core::capabilities::{self, AccountOption};
use toxbridge_core::persistence::decode_blob;
use toxbridge_core::{
    status_types, Command, FilePreferences, HostEvent, MemoryPreferences, Network,
    PreferenceStore, PublicKey, StatusType,
};
use toxbridge_harness::{Scenario, SimulatedNetwork};
use toxbridge_runtime::{BridgeBuilder, BridgeStats};

use crate::cli::{Cli, Commands};
use crate::config::AppConfig;
use crate::error::{CliError, Result};

/// How often scripted peers act during a simulation
const SCENARIO_TICK: Duration = Duration::from_millis(250);

/// Command dispatcher for handling CLI commands
pub struct CommandDispatcher;

impl CommandDispatcher {
    /// Execute a CLI command
    pub async fn execute(cli: Cli, config: AppConfig) -> Result<()> {
        match cli.command {
            Commands::Simulate {
                peers,
                seconds,
                state,
                options,
            } => Self::handle_simulate_command(config, peers, seconds, state, options).await,
            Commands::Key { hex } => Self::handle_key_command(&hex),
            Commands::State { file } => Self::handle_state_command(&config, &file),
            Commands::Info => Self::handle_info_command(),
        }
    }

    // ------------------------------------------------------------------------
    // simulate
    // ------------------------------------------------------------------------

    async fn handle_simulate_command(
        mut config: AppConfig,
        peers: usize,
        seconds: u64,
        state: Option<String>,
        options: Vec<String>,
    ) -> Result<()> {
        if !options.is_empty() {
            config.bridge.bootstrap = capabilities::bootstrap_from_options(&parse_options(&options)?)?;
        }

        // friends restored from the state file are the host's buddies
        let pref_key = config.bridge.persistence.preference_key.clone();
        let (preferences, buddies): (Box<dyn PreferenceStore>, Vec<PublicKey>) = match &state {
            Some(path) => {
                let buddies = match load_saved(Path::new(path), &pref_key)? {
                    Some((_, saved)) => saved.controller().friend_keys(),
                    None => Vec::new(),
                };
                let preferences: Box<dyn PreferenceStore> = Box::new(FilePreferences::open(path)?);
                (preferences, buddies)
            }
            None => {
                let preferences: Box<dyn PreferenceStore> = Box::new(MemoryPreferences::new());
                (preferences, Vec::new())
            }
        };

        let network = SimulatedNetwork::new(&config.account);
        let ctl = network.controller();
        let scenario = Scenario::new(peers);

        info!(account = %config.account, peers, seconds, "Starting simulation");
        let mut handle = BridgeBuilder::new(config.account.clone())
            .with_config(config.bridge.clone())
            .with_buddies(buddies.iter().map(|key| (key.to_hex(), None)))
            .spawn(network, preferences)?;

        let deadline = sleep(Duration::from_secs(seconds));
        tokio::pin!(deadline);
        let mut ticker = interval(SCENARIO_TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut tick = 0u64;

        loop {
            tokio::select! {
                _ = &mut deadline => break,
                _ = ticker.tick() => {
                    tick += 1;
                    for action in scenario.step(&ctl, tick) {
                        debug!(tick, action = ?action, "Peer acted");
                    }
                }
                event = handle.recv_event() => {
                    let Some(event) = event else {
                        warn!("Bridge stopped before the simulation ended");
                        break;
                    };
                    println!("{}", describe(&event));
                    if let HostEvent::FriendRequest { key, .. } = event {
                        handle.send(Command::AcceptRequest { key }).await?;
                    }
                }
            }
        }

        let exit = handle.shutdown().await?;
        let saved = exit.saved_bytes?;
        let summary = SimulationSummary {
            ticks: tick,
            saved_bytes: saved,
            friends: ctl.friend_count(),
            messages_sent: ctl.sent_messages().len(),
            stats: exit.task.stats().clone(),
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // key
    // ------------------------------------------------------------------------

    fn handle_key_command(hex: &str) -> Result<()> {
        let key: PublicKey = hex.trim().parse()?;
        println!("{}", key);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // state
    // ------------------------------------------------------------------------

    fn handle_state_command(config: &AppConfig, file: &str) -> Result<()> {
        let report = inspect_state(file, &config.bridge.persistence.preference_key)?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // info
    // ------------------------------------------------------------------------

    fn handle_info_command() -> Result<()> {
        let info = ProtocolInfo {
            id: capabilities::PROTOCOL_ID,
            name: capabilities::PROTOCOL_NAME,
            summary: capabilities::PROTOCOL_SUMMARY,
            list_icon: capabilities::list_icon(),
            file_transfer: capabilities::can_receive_file(""),
            offline_messages: capabilities::offline_message(),
            status_types: status_types(),
            account_options: capabilities::account_options(),
        };
        println!("{}", serde_json::to_string_pretty(&info)?);
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Reports
// ----------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct SimulationSummary {
    ticks: u64,
    saved_bytes: usize,
    friends: usize,
    messages_sent: usize,
    stats: BridgeStats,
}

#[derive(Debug, Serialize)]
struct ProtocolInfo {
    id: &'static str,
    name: &'static str,
    summary: &'static str,
    list_icon: &'static str,
    file_transfer: bool,
    offline_messages: bool,
    status_types: Vec<StatusType>,
    account_options: Vec<AccountOption>,
}

/// What a preference file says about a saved identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateReport {
    pub path: PathBuf,
    pub present: bool,
    pub bytes: usize,
    pub self_key: Option<PublicKey>,
    pub friends: usize,
}

/// Decode the saved identity in `file` without touching the file
pub fn inspect_state<P: AsRef<Path>>(file: P, preference_key: &str) -> Result<StateReport> {
    let path = file.as_ref().to_path_buf();
    let mut report = StateReport {
        path: path.clone(),
        present: false,
        bytes: 0,
        self_key: None,
        friends: 0,
    };

    if let Some((bytes, probe)) = load_saved(&path, preference_key)? {
        report.present = true;
        report.bytes = bytes;
        report.self_key = Some(probe.self_key());
        report.friends = probe.controller().friend_count();
    }
    Ok(report)
}

/// Saved identity in `file` loaded into a scratch network, with its blob size
fn load_saved(path: &Path, preference_key: &str) -> Result<Option<(usize, SimulatedNetwork)>> {
    if !path.exists() {
        return Ok(None);
    }

    let preferences = FilePreferences::open(path)?;
    let stored = preferences.get_string(preference_key)?.unwrap_or_default();
    if stored.trim().is_empty() {
        return Ok(None);
    }

    let bytes = decode_blob(&stored).map_err(|e| CliError::State(e.to_string()))?;
    let mut probe = SimulatedNetwork::new("probe");
    probe
        .load(&bytes)
        .map_err(|e| CliError::State(e.to_string()))?;
    Ok(Some((bytes.len(), probe)))
}

/// `NAME=VALUE` pairs as an option map
pub fn parse_options(options: &[String]) -> Result<BTreeMap<String, String>> {
    options
        .iter()
        .map(|option| {
            option
                .split_once('=')
                .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
                .ok_or_else(|| CliError::Config(format!("expected NAME=VALUE, got '{}'", option)))
        })
        .collect()
}

/// One line of simulation output
pub fn describe(event: &HostEvent) -> String {
    match event {
        HostEvent::StatusChanged { key, status } => format!("status   {} {}", key.short(), status),
        HostEvent::MessageReceived {
            key,
            body,
            known_buddy,
        } => {
            let marker = if *known_buddy { "" } else { " (not a buddy)" };
            format!("message  {}{}: {}", key.short(), marker, body)
        }
        HostEvent::AliasChanged { key, alias } => format!("alias    {} is now {}", key.short(), alias),
        HostEvent::FriendRequest { key, message } => format!(
            "request  {} says {}",
            key.short(),
            message.as_deref().unwrap_or("(nothing)")
        ),
        HostEvent::ConnectionProgress(progress) => format!("connect  {}", progress),
        HostEvent::Error { title, message } => format!("error    {}: {}", title, message),
        HostEvent::BuddyAdded { key, alias } => format!(
            "added    {}{}",
            key.short(),
            alias.as_ref().map(|a| format!(" ({})", a)).unwrap_or_default()
        ),
        HostEvent::BuddyRejected { name } => format!("rejected {}", name),
        HostEvent::AccountConnected { self_key } => format!("online   as {}", self_key),
        HostEvent::SiblingStatus {
            account, status_id, ..
        } => format!("sibling  {} is {}", account, status_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toxbridge_core::persistence::encode_blob;
    use toxbridge_harness::key_from_name;

    const PREF_KEY: &str = "/plugins/prpl/tox/messenger";

    #[test]
    fn test_missing_state_file() {
        let dir = tempfile::tempdir().unwrap();
        let report = inspect_state(dir.path().join("nope.json"), PREF_KEY).unwrap();
        assert!(!report.present);
        assert_eq!(report.friends, 0);
    }

    #[test]
    fn test_state_report_counts_friends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        let mut network = SimulatedNetwork::new("alice");
        network.add_friend(&key_from_name("bob"), b"hi").unwrap();
        network.add_friend(&key_from_name("carol"), b"hi").unwrap();

        let mut prefs = FilePreferences::open(&path).unwrap();
        prefs.set_string(PREF_KEY, &encode_blob(&network.save())).unwrap();

        let report = inspect_state(&path, PREF_KEY).unwrap();
        assert!(report.present);
        assert_eq!(report.friends, 2);
        assert_eq!(report.self_key, Some(key_from_name("alice")));
        assert_eq!(report.bytes, network.save().len());
    }

    #[test]
    fn test_parse_options() {
        let options = parse_options(&["dht_server_port = 4242".to_string()]).unwrap();
        assert_eq!(options.get("dht_server_port").map(String::as_str), Some("4242"));
        assert!(parse_options(&["no-equals".to_string()]).is_err());
    }

    #[test]
    fn test_describe_marks_strangers() {
        let line = describe(&HostEvent::MessageReceived {
            key: key_from_name("ghost"),
            body: "boo".to_string(),
            known_buddy: false,
        });
        assert!(line.contains("(not a buddy)"));
        assert!(line.ends_with("boo"));
    }
}
