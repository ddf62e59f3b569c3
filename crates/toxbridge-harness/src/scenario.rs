//! Scripted remote peers
//!
//! A [`Scenario`] drives a [`SimController`] tick by tick: every peer asks to
//! become a friend, then once accepted it cycles through moods, renames itself,
//! sends messages and occasionally drops offline. The schedule depends only on
//! the tick number, so two runs with the same peer count behave identically.

use toxbridge_core::{Mood, PublicKey};

use crate::identity::key_from_name;
use crate::network::SimController;

/// One scripted remote peer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedPeer {
    pub name: String,
    pub key: PublicKey,
    offset: u64,
}

/// What a peer did on a tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerAction {
    Requested { peer: String },
    MoodChanged { peer: String, mood: Mood },
    Renamed { peer: String, name: String },
    Messaged { peer: String, body: String },
    WentOffline { peer: String },
    CameOnline { peer: String },
}

#[derive(Debug, Clone)]
pub struct Scenario {
    peers: Vec<ScriptedPeer>,
}

impl Scenario {
    /// Peers named `peer-0` .. `peer-{count-1}`
    pub fn new(count: usize) -> Self {
        let peers = (0..count)
            .map(|i| {
                let name = format!("peer-{}", i);
                ScriptedPeer {
                    key: key_from_name(&name),
                    name,
                    offset: i as u64,
                }
            })
            .collect();
        Self { peers }
    }

    pub fn peers(&self) -> &[ScriptedPeer] {
        &self.peers
    }

    /// Advance all peers by one tick
    pub fn step(&self, ctl: &SimController, tick: u64) -> Vec<PeerAction> {
        let mut actions = Vec::new();
        for peer in &self.peers {
            if tick == 1 + peer.offset {
                if !ctl.is_friend(&peer.key) {
                    let greeting = format!("Hi, this is {}", peer.name);
                    ctl.receive_request(peer.key, greeting.as_bytes());
                    actions.push(PeerAction::Requested {
                        peer: peer.name.clone(),
                    });
                }
                continue;
            }
            if !ctl.is_friend(&peer.key) {
                continue;
            }
            actions.extend(Self::step_friend(ctl, peer, tick));
        }
        actions
    }

    fn step_friend(ctl: &SimController, peer: &ScriptedPeer, tick: u64) -> Vec<PeerAction> {
        let phase = tick + peer.offset;
        let name = peer.name.clone();
        let mut actions = Vec::new();

        if phase % 13 == 0 {
            ctl.set_online(&peer.key, false);
            actions.push(PeerAction::WentOffline { peer: name });
            return actions;
        }
        if phase % 13 == 2 {
            ctl.set_online(&peer.key, true);
            actions.push(PeerAction::CameOnline { peer: name.clone() });
        }
        if phase % 5 == 0 {
            let mood = match (phase / 5) % 3 {
                0 => Mood::None,
                1 => Mood::Away,
                _ => Mood::Busy,
            };
            ctl.set_mood(&peer.key, mood);
            actions.push(PeerAction::MoodChanged {
                peer: name.clone(),
                mood,
            });
        }
        if phase % 7 == 0 {
            let body = format!("message {} from {}", tick, name);
            ctl.deliver_message(&peer.key, body.as_bytes());
            actions.push(PeerAction::Messaged {
                peer: name.clone(),
                body,
            });
        }
        if phase % 17 == 0 {
            let nick = format!("{} ({})", name, tick);
            ctl.rename(&peer.key, &nick);
            actions.push(PeerAction::Renamed { peer: name, name: nick });
        }
        actions
    }
}
