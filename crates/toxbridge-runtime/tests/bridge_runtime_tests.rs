//! The spawned bridge driven through its handle

use tokio::time::{timeout, Duration};

use toxbridge_core::{
    BridgeConfig, CanonicalStatus, Command, ConnectionProgress, HostEvent, MemoryPreferences,
    PreferenceStore,
};
use toxbridge_harness::{key_from_name, SimulatedNetwork};
use toxbridge_runtime::{BridgeBuilder, BridgeHandle};

const WAIT: Duration = Duration::from_secs(5);

async fn next_matching<F>(handle: &mut BridgeHandle<SimulatedNetwork, MemoryPreferences>, mut pred: F) -> HostEvent
where
    F: FnMut(&HostEvent) -> bool,
{
    timeout(WAIT, async {
        loop {
            match handle.recv_event().await {
                Some(event) if pred(&event) => return event,
                Some(_) => continue,
                None => panic!("host event channel closed"),
            }
        }
    })
    .await
    .expect("timed out waiting for host event")
}

#[tokio::test]
async fn test_run_connects_and_shuts_down_with_saved_state() {
    let network = SimulatedNetwork::new("me");
    let ctl = network.controller();
    let mut handle = BridgeBuilder::new("me")
        .with_config(BridgeConfig::testing())
        .spawn(network, MemoryPreferences::new())
        .unwrap();

    next_matching(&mut handle, |e| {
        *e == HostEvent::ConnectionProgress(ConnectionProgress::connected())
    })
    .await;
    assert!(handle.is_running());
    assert!(ctl.is_connected());

    let exit = handle.shutdown().await.unwrap();
    let saved = exit.saved_bytes.unwrap();
    assert!(saved > 0);
    assert!(!exit.task.is_logged_in());
    let stored = exit
        .task
        .preferences()
        .get_string("/plugins/prpl/tox/messenger")
        .unwrap();
    assert!(stored.is_some_and(|s| !s.is_empty()));
}

#[tokio::test]
async fn test_run_delivers_commands_and_callbacks() {
    let bob = key_from_name("bob");
    let network = SimulatedNetwork::new("me");
    let ctl = network.controller();
    ctl.set_auto_accept(true);
    let mut handle = BridgeBuilder::new("me")
        .with_config(BridgeConfig::testing())
        .spawn(network, MemoryPreferences::new())
        .unwrap();

    next_matching(&mut handle, |e| matches!(e, HostEvent::AccountConnected { .. })).await;

    handle
        .send(Command::AddBuddy {
            name: bob.to_hex(),
            alias: None,
            message: Some("it's me".to_string()),
        })
        .await
        .unwrap();
    next_matching(&mut handle, |e| matches!(e, HostEvent::BuddyAdded { .. })).await;

    // auto accept brings the new friend online on a later pump
    next_matching(&mut handle, |e| {
        *e == HostEvent::StatusChanged {
            key: bob,
            status: CanonicalStatus::Online,
        }
    })
    .await;

    ctl.deliver_message(&bob, b"welcome");
    let event = next_matching(&mut handle, |e| matches!(e, HostEvent::MessageReceived { .. })).await;
    assert_eq!(
        event,
        HostEvent::MessageReceived {
            key: bob,
            body: "welcome".to_string(),
            known_buddy: true,
        }
    );

    let exit = handle.shutdown().await.unwrap();
    assert!(exit.saved_bytes.is_ok());
    assert_eq!(exit.task.stats().messages_received, 1);
    assert_eq!(ctl.outgoing_requests(), vec![(bob, b"it's me".to_vec())]);
}

#[tokio::test]
async fn test_run_delivers_every_status_past_the_host_buffer() {
    let keys: Vec<_> = (0..200).map(|n| key_from_name(&format!("buddy-{}", n))).collect();
    let network = SimulatedNetwork::new("me");
    let ctl = network.controller();
    for key in &keys {
        ctl.add_existing_friend(*key, "");
    }
    let mut config = BridgeConfig::testing();
    config.channels.host_event_buffer_size = 64;

    let mut handle = BridgeBuilder::new("me")
        .with_config(config)
        .with_buddies(keys.iter().map(|k| (k.to_hex(), None)))
        .spawn(network, MemoryPreferences::new())
        .unwrap();

    let mut pushed = std::collections::HashSet::new();
    while pushed.len() < keys.len() {
        if let HostEvent::StatusChanged { key, .. } =
            next_matching(&mut handle, |e| matches!(e, HostEvent::StatusChanged { .. })).await
        {
            pushed.insert(key);
        }
    }

    let exit = handle.shutdown().await.unwrap();
    assert!(exit.saved_bytes.is_ok());
    assert_eq!(exit.task.host_backlog(), 0);
    assert_eq!(exit.task.connection_stats().buddies_reconciled, 200);
}

#[tokio::test]
async fn test_closing_command_channel_stops_task() {
    let network = SimulatedNetwork::new("me");
    let (mut task, commands, _events) = BridgeBuilder::new("me")
        .with_config(BridgeConfig::testing())
        .build(network, MemoryPreferences::new())
        .unwrap();
    drop(commands);

    let saved = timeout(WAIT, task.run()).await.unwrap().unwrap();
    assert!(saved > 0);
    assert!(!task.is_running());
}

#[tokio::test]
async fn test_run_refuses_corrupt_state() {
    let mut prefs = MemoryPreferences::new();
    prefs
        .set_string("/plugins/prpl/tox/messenger", "AAAA")
        .unwrap();
    let network = SimulatedNetwork::new("me");
    let ctl = network.controller();
    let mut handle = BridgeBuilder::new("me")
        .with_config(BridgeConfig::testing())
        .spawn(network, prefs)
        .unwrap();

    let exit = timeout(WAIT, handle.wait()).await.unwrap().unwrap();
    assert!(exit.saved_bytes.is_err());
    assert_eq!(ctl.bootstrap_count(), 0);
}
