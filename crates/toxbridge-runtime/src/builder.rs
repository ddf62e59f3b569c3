//! Bridge Builder API
//!
//! Lets consumers (CLI, tests) wire one account's bridge task to its network
//! and preference store, then drive it through command and host event
//! handles.

use tokio::task::JoinHandle;
use tracing::info;

use toxbridge_core::{
    create_command_channel, create_host_event_channel, BridgeConfig, BridgeError, BridgeResult,
    Command, CommandSender, HostEvent, HostEventReceiver, Network, PreferenceStore,
};

use crate::broadcast::AccountDirectory;
use crate::logic::BridgeTask;

// ----------------------------------------------------------------------------
// Bridge Builder
// ----------------------------------------------------------------------------

/// Builder for one account's bridge
pub struct BridgeBuilder {
    account: String,
    config: BridgeConfig,
    buddies: Vec<(String, Option<String>)>,
    directory: Option<AccountDirectory>,
}

impl BridgeBuilder {
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            config: BridgeConfig::default(),
            buddies: Vec::new(),
            directory: None,
        }
    }

    pub fn with_config(mut self, config: BridgeConfig) -> Self {
        self.config = config;
        self
    }

    /// Buddies persisted by the host, as `(name, alias)` pairs
    pub fn with_buddies<I, S>(mut self, buddies: I) -> Self
    where
        I: IntoIterator<Item = (S, Option<String>)>,
        S: Into<String>,
    {
        self.buddies
            .extend(buddies.into_iter().map(|(name, alias)| (name.into(), alias)));
        self
    }

    pub fn with_buddy(mut self, name: impl Into<String>, alias: Option<String>) -> Self {
        self.buddies.push((name.into(), alias));
        self
    }

    /// Share account status with sibling accounts
    pub fn with_directory(mut self, directory: AccountDirectory) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Create the task and its channel ends without starting it
    pub fn build<N, P>(
        self,
        network: N,
        preferences: P,
    ) -> BridgeResult<(BridgeTask<N, P>, CommandSender, HostEventReceiver)>
    where
        N: Network,
        P: PreferenceStore,
    {
        let (command_sender, command_receiver) = create_command_channel(&self.config.channels);
        let (host_sender, host_receiver) = create_host_event_channel(&self.config.channels);

        let mut task = BridgeTask::new(
            self.account,
            self.config,
            network,
            preferences,
            self.buddies,
            command_receiver,
            host_sender,
        )?;
        if let Some(directory) = self.directory {
            task = task.with_directory(directory);
        }
        Ok((task, command_sender, host_receiver))
    }

    /// Build the task and run it on the tokio runtime
    pub fn spawn<N, P>(self, network: N, preferences: P) -> BridgeResult<BridgeHandle<N, P>>
    where
        N: Network + 'static,
        P: PreferenceStore + 'static,
    {
        let account = self.account.clone();
        let (mut task, command_sender, host_receiver) = self.build(network, preferences)?;

        let join = tokio::spawn(async move {
            let saved_bytes = task.run().await;
            BridgeExit { saved_bytes, task }
        });
        info!(account = %account, "Bridge started");

        Ok(BridgeHandle {
            account,
            command_sender,
            host_receiver: Some(host_receiver),
            join: Some(join),
        })
    }
}

// ----------------------------------------------------------------------------
// Bridge Handle
// ----------------------------------------------------------------------------

/// Outcome of a finished bridge task
pub struct BridgeExit<N: Network, P: PreferenceStore> {
    /// Size of the state blob saved on shutdown, or why the task stopped
    pub saved_bytes: BridgeResult<usize>,
    pub task: BridgeTask<N, P>,
}

/// Handle to a running bridge
pub struct BridgeHandle<N: Network, P: PreferenceStore> {
    account: String,
    command_sender: CommandSender,
    host_receiver: Option<HostEventReceiver>,
    join: Option<JoinHandle<BridgeExit<N, P>>>,
}

impl<N: Network, P: PreferenceStore> BridgeHandle<N, P> {
    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn command_sender(&self) -> CommandSender {
        self.command_sender.clone()
    }

    /// Take the host event receiver (can only be called once)
    pub fn take_host_receiver(&mut self) -> Option<HostEventReceiver> {
        self.host_receiver.take()
    }

    pub async fn send(&self, command: Command) -> BridgeResult<()> {
        self.command_sender
            .send(command)
            .await
            .map_err(|_| BridgeError::channel_error("Failed to send command to bridge"))
    }

    /// Next host event, unless the receiver was taken or the task ended
    pub async fn recv_event(&mut self) -> Option<HostEvent> {
        self.host_receiver.as_mut()?.recv().await
    }

    pub fn is_running(&self) -> bool {
        self.join.as_ref().is_some_and(|join| !join.is_finished())
    }

    /// Ask the task to stop and wait for it
    pub async fn shutdown(mut self) -> BridgeResult<BridgeExit<N, P>> {
        // A closed channel means the task already stopped
        let _ = self.command_sender.send(Command::Shutdown).await;
        self.wait().await
    }

    /// Wait for the task to finish on its own
    pub async fn wait(&mut self) -> BridgeResult<BridgeExit<N, P>> {
        let join = self
            .join
            .take()
            .ok_or_else(|| BridgeError::channel_error("Bridge task already joined"))?;
        join.await
            .map_err(|e| BridgeError::channel_error(format!("Bridge task panicked: {}", e)))
    }
}
