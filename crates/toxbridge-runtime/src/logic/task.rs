//! Bridge Task Implementation
//!
//! [`BridgeTask`] owns one account's network identity and drives it from a
//! single `tokio::select!` loop over the pump timer, the connection poll timer
//! and the host command channel. Tests drive the same task tick by tick
//! through [`BridgeTask::pump_tick`], [`BridgeTask::poll_tick`] and
//! [`BridgeTask::handle_command`].

use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use toxbridge_core::persistence::{self, LoadOutcome};
use toxbridge_core::{
    create_network_event_channel, BootstrapNode, BridgeConfig, BridgeError, BridgeResult,
    BuddyList, CanonicalStatus, Command, CommandReceiver, ConnectionProgress, HostEvent,
    HostEventEmitter, HostEventSender, Network, NetworkEventReceiver, NetworkEventSender,
    PreferenceStore,
};

use super::handlers::{CommandHandlers, EventHandlers};
use super::state::{AccountStatus, BridgeState, BridgeStats};
use crate::broadcast::AccountDirectory;
use crate::managers::{ConnectionStats, PhaseTransition};

// ----------------------------------------------------------------------------
// Bridge Task
// ----------------------------------------------------------------------------

pub struct BridgeTask<N: Network, P: PreferenceStore> {
    config: BridgeConfig,
    network: N,
    preferences: P,
    state: BridgeState,
    /// Raw host buddy names, shared with sibling accounts
    host_buddies: Vec<String>,
    command_receiver: Option<CommandReceiver>,
    network_sender: NetworkEventSender,
    network_receiver: NetworkEventReceiver,
    emitter: HostEventEmitter,
    directory: Option<AccountDirectory>,
    running: bool,
}

impl<N: Network, P: PreferenceStore> BridgeTask<N, P> {
    /// Create a task for `account`
    ///
    /// `buddies` are the host's persisted buddy names with their aliases.
    /// Names that are not identifiers stay visible to sibling accounts but
    /// never reach the network.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        account: impl Into<String>,
        config: BridgeConfig,
        network: N,
        preferences: P,
        buddies: Vec<(String, Option<String>)>,
        command_receiver: CommandReceiver,
        host_sender: HostEventSender,
    ) -> BridgeResult<Self> {
        config.validate()?;

        let host_buddies: Vec<String> = buddies.iter().map(|(name, _)| name.clone()).collect();
        let state = BridgeState::new(account, &config, BuddyList::from_persisted(buddies));
        let (network_sender, network_receiver) = create_network_event_channel();

        Ok(Self {
            config,
            network,
            preferences,
            state,
            host_buddies,
            command_receiver: Some(command_receiver),
            network_sender,
            network_receiver,
            emitter: HostEventEmitter::new(host_sender),
            directory: None,
            running: true,
        })
    }

    /// Relay account status through a directory shared with sibling accounts
    pub fn with_directory(mut self, directory: AccountDirectory) -> Self {
        self.directory = Some(directory);
        self
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn account(&self) -> &str {
        &self.state.account
    }

    pub fn network(&self) -> &N {
        &self.network
    }

    pub fn preferences(&self) -> &P {
        &self.preferences
    }

    pub fn into_preferences(self) -> P {
        self.preferences
    }

    pub fn buddies(&self) -> &BuddyList {
        &self.state.buddies
    }

    pub fn pending_requests(&self) -> usize {
        self.state.pending.len()
    }

    pub fn account_status(&self) -> &AccountStatus {
        &self.state.status
    }

    pub fn is_logged_in(&self) -> bool {
        self.state.logged_in
    }

    pub fn is_connected(&self) -> bool {
        self.state.supervisor.is_connected()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn stats(&self) -> &BridgeStats {
        &self.state.stats
    }

    pub fn connection_stats(&self) -> &ConnectionStats {
        self.state.supervisor.stats()
    }

    /// Host events still waiting for room in the host channel
    pub fn host_backlog(&self) -> usize {
        self.emitter.backlog_len()
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Restore state, bootstrap and start connecting
    ///
    /// Only the first call does anything; `None` marks an ignored repeat.
    /// A restore failure keeps the account offline.
    pub fn login(&mut self) -> BridgeResult<Option<LoadOutcome>> {
        if self.state.logged_in {
            debug!(account = %self.state.account, "Already logged in");
            return Ok(None);
        }
        info!(account = %self.state.account, "Logging in");
        self.emit(HostEvent::ConnectionProgress(ConnectionProgress::connecting()));

        let outcome = match persistence::load(
            &mut self.network,
            &mut self.preferences,
            &self.config.persistence.preference_key,
        ) {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(account = %self.state.account, error = %e, "Unable to restore network state");
                self.emit(HostEvent::error("Unable to restore account", e.to_string()));
                return Err(e.into());
            }
        };

        self.state.logged_in = true;
        self.state.self_key = Some(self.network.self_key());
        self.bootstrap();

        if let Some(directory) = &self.directory {
            directory.register(
                &self.state.account,
                self.host_buddies.iter().cloned(),
                self.emitter.clone(),
            );
        }
        Ok(Some(outcome))
    }

    /// Stop, tell sibling accounts and persist the network state
    ///
    /// Returns the size of the saved blob; nothing is saved when the account
    /// never logged in.
    pub fn shutdown(&mut self) -> BridgeResult<usize> {
        self.running = false;
        if let Some(directory) = &self.directory {
            directory.report_close(&self.state.account);
        }
        if !self.state.logged_in {
            return Ok(0);
        }

        let saved = persistence::save(
            &self.network,
            &mut self.preferences,
            &self.config.persistence.preference_key,
        )?;
        self.state.logged_in = false;
        info!(account = %self.state.account, bytes = saved, "Bridge shut down");
        Ok(saved)
    }

    /// Run until a shutdown command arrives or the command channel closes
    pub async fn run(&mut self) -> BridgeResult<usize> {
        let mut commands = self
            .command_receiver
            .take()
            .ok_or_else(|| BridgeError::channel_error("Command receiver already taken"))?;

        self.login()?;

        let mut pump = interval(self.config.timers.pump_interval());
        pump.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut poll = interval(self.config.timers.poll_interval());
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(account = %self.state.account, "Bridge task starting");
        let mut failure = None;
        let emitter = self.emitter.clone();

        while self.running {
            tokio::select! {
                flushed = emitter.flush_one(), if emitter.has_backlog() => {
                    if let Err(e) = flushed {
                        debug!(error = %e, "Host stopped listening");
                    }
                }
                _ = pump.tick() => {
                    self.pump_tick();
                }
                _ = poll.tick() => {
                    self.poll_tick();
                }
                command = commands.recv() => match command {
                    Some(command) => {
                        if let Err(e) = self.handle_command(command) {
                            error!(error = %e, "Unrecoverable error processing command, shutting down");
                            failure = Some(e);
                            break;
                        }
                    }
                    None => {
                        info!("Command channel closed, shutting down");
                        break;
                    }
                }
            }
        }

        drop(pump);
        drop(poll);
        let saved = self.shutdown();
        match failure {
            Some(e) => Err(e),
            None => saved,
        }
    }

    // ------------------------------------------------------------------------
    // Ticks
    // ------------------------------------------------------------------------

    /// Pump the network once and dispatch everything it raised
    pub fn pump_tick(&mut self) -> usize {
        self.state.stats.pumps += 1;
        self.network.pump(&self.network_sender);

        let mut processed = 0;
        while let Ok(event) = self.network_receiver.try_recv() {
            let events = EventHandlers::dispatch(&mut self.state, &self.network, event);
            self.emit_all(events);
            processed += 1;
        }
        processed
    }

    /// Check liveness and act on a phase change
    pub fn poll_tick(&mut self) -> Option<PhaseTransition> {
        let live = self.network.is_connected();
        let transition = self.state.supervisor.poll(live)?;

        match transition {
            PhaseTransition::Connected => {
                self.emit(HostEvent::ConnectionProgress(ConnectionProgress::connected()));
                let self_key = self.network.self_key();
                if !self.state.announced {
                    info!(account = %self.state.account, id = %self_key, "Connected, own identifier");
                    self.state.announced = true;
                }
                self.emit(HostEvent::AccountConnected { self_key });
                self.reconcile();
            }
            PhaseTransition::Lost => {
                warn!(account = %self.state.account, "Connection lost");
                self.emit(HostEvent::ConnectionProgress(ConnectionProgress::connecting()));
                if self.config.rebootstrap_on_disconnect {
                    self.bootstrap();
                }
            }
        }
        Some(transition)
    }

    /// Push the current status of every buddy, returning how many were pushed
    fn reconcile(&mut self) -> usize {
        let keys = self.state.buddies.keys();
        let mut events = Vec::with_capacity(keys.len());

        for key in &keys {
            let Some(entry) = self.state.buddies.get_mut(key) else {
                continue;
            };
            let status = match self.state.friends.resolve_slot(&self.network, entry) {
                Some(slot) => self.state.friends.query_status(&self.network, slot),
                None => {
                    warn!(key = %key, "Buddy has no network friend, reporting offline");
                    CanonicalStatus::Offline
                }
            };
            events.push(HostEvent::StatusChanged { key: *key, status });
        }

        self.state.supervisor.record_reconciliation(keys.len());
        self.state.stats.status_pushes += events.len() as u64;
        debug!(buddies = keys.len(), "Reconciled buddy statuses");
        self.emit_all(events);
        keys.len()
    }

    fn bootstrap(&mut self) {
        let node = match BootstrapNode::from_config(&self.config.bootstrap) {
            Ok(node) => node,
            Err(e) => {
                error!(error = %e, "Invalid bootstrap node");
                return;
            }
        };
        match self.network.bootstrap(&node) {
            Ok(()) => info!(node = %node, "Will connect"),
            Err(e) => {
                warn!(node = %node, error = %e, "Bootstrap failed");
                self.emit(HostEvent::error("Unable to reach the network", e.to_string()));
            }
        }
    }

    // ------------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------------

    /// Process one host command
    ///
    /// Failures are logged and reported to the host; only fatal errors are
    /// returned.
    pub fn handle_command(&mut self, command: Command) -> BridgeResult<()> {
        self.state.stats.commands_processed += 1;

        let result = match command {
            Command::AddBuddy {
                name,
                alias,
                message,
            } => {
                let result = CommandHandlers::handle_add_buddy(
                    &mut self.state,
                    &mut self.network,
                    name.clone(),
                    alias,
                    message,
                );
                if let (Ok(events), Some(directory)) = (&result, &self.directory) {
                    if events.iter().any(|e| matches!(e, HostEvent::BuddyAdded { .. })) {
                        directory.add_buddy(&self.state.account, &name);
                    }
                }
                result
            }
            Command::RemoveBuddy { name } => {
                if let Some(directory) = &self.directory {
                    directory.remove_buddy(&self.state.account, &name);
                }
                CommandHandlers::handle_remove_buddy(&mut self.state, &mut self.network, &name)
            }
            Command::AcceptRequest { key } => {
                CommandHandlers::handle_accept_request(&mut self.state, &mut self.network, key)
            }
            Command::DeclineRequest { key } => CommandHandlers::handle_decline_request(&mut self.state, key),
            Command::SendMessage { name, body } => {
                CommandHandlers::handle_send_message(&mut self.state, &mut self.network, &name, &body)
            }
            Command::SetStatus { status_id, message } => self.handle_set_status(status_id, message),
            Command::Shutdown => {
                info!(account = %self.state.account, "Shutdown requested");
                self.running = false;
                Ok(Vec::new())
            }
        };

        match result {
            Ok(events) => {
                self.emit_all(events);
                Ok(())
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                warn!(error = %e, "Command failed");
                self.emit(HostEvent::error("Command failed", e.to_string()));
                Ok(())
            }
        }
    }

    fn handle_set_status(&mut self, status_id: String, message: Option<String>) -> BridgeResult<Vec<HostEvent>> {
        let Some(status) = CanonicalStatus::from_id(&status_id) else {
            error!(account = %self.state.account, status_id, "Unknown status");
            return Ok(Vec::new());
        };

        self.state.status = AccountStatus {
            status,
            message: message.clone(),
        };
        if let Some(directory) = &self.directory {
            directory.set_status(&self.state.account, &status_id, message);
        }
        Ok(Vec::new())
    }

    // ------------------------------------------------------------------------
    // Emission
    // ------------------------------------------------------------------------

    fn emit(&mut self, event: HostEvent) {
        if self.emitter.emit(event).is_ok() {
            self.state.stats.host_events_emitted += 1;
        }
    }

    fn emit_all(&mut self, events: Vec<HostEvent>) {
        for event in events {
            self.emit(event);
        }
    }
}
