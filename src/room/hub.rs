// created = "2026-10-16"
// modified = "2026-10-16"
// driver = "Isaac Clayton"

//! An in-memory relay standing in for the real-time provider.
//!
//! The hub owns every session of one room and moves batches and presence
//! updates between them. Delivery preserves each sender's issue order.
//! It is synchronous: `flush` keeps delivering until no session has
//! anything left to send, which models "eventually" as "right now".

use crate::config::Config;
use crate::crdt::op::SignedBatch;
use crate::key::KeyPair;
use crate::key::KeyPub;
use crate::room::presence::SignedPresence;
use crate::room::session::Session;

/// Sessions of one room plus the relay between them.
pub struct Hub {
    room: String,
    config: Config,
    sessions: Vec<Session>,
}

impl Hub {
    pub fn new(room: &str, config: Config) -> Hub {
        return Hub {
            room: room.to_string(),
            config,
            sessions: Vec::new(),
        };
    }

    /// Connect a new session. It starts from a copy of the current room
    /// state, and every peer re-announces presence so it sees them.
    pub fn join(&mut self, name: &str) -> KeyPub {
        let mut session = Session::join(&self.room, name, KeyPair::generate(), self.config.clone());
        if let Some(first) = self.sessions.first() {
            session.sync_from(first.storage());
        }
        for peer in self.sessions.iter_mut() {
            peer.announce();
        }
        let id = session.id();
        self.sessions.push(session);
        return id;
    }

    /// Disconnect a session and drop its presence everywhere.
    pub fn leave(&mut self, id: &KeyPub) -> Option<Session> {
        let index = self.sessions.iter().position(|s| s.id() == *id)?;
        let mut session = self.sessions.remove(index);
        // Deliver what it already sent before it goes.
        let batches = session.drain_batches();
        self.deliver(*id, &batches, &[]);
        for peer in self.sessions.iter_mut() {
            peer.disconnect_peer(id);
        }
        log::debug!("{} left {:?}", id.short(), self.room);
        return Some(session);
    }

    pub fn get(&self, id: &KeyPub) -> Option<&Session> {
        return self.sessions.iter().find(|s| s.id() == *id);
    }

    pub fn get_mut(&mut self, id: &KeyPub) -> Option<&mut Session> {
        return self.sessions.iter_mut().find(|s| s.id() == *id);
    }

    pub fn sessions(&self) -> &[Session] {
        return &self.sessions;
    }

    fn deliver(&mut self, from: KeyPub, batches: &[SignedBatch], presence: &[SignedPresence]) {
        for peer in self.sessions.iter_mut().filter(|s| s.id() != from) {
            for batch in batches {
                if let Err(error) = peer.receive(batch) {
                    log::warn!("{} dropped batch from {}: {}", peer.id().short(), from.short(), error);
                }
            }
            for update in presence {
                if let Err(error) = peer.receive_presence(update) {
                    log::warn!("{} dropped presence from {}: {}", peer.id().short(), from.short(), error);
                }
            }
        }
    }

    /// Deliver everything every session has queued, until quiet.
    /// Returns the number of messages delivered.
    pub fn flush(&mut self) -> usize {
        let mut delivered = 0;
        loop {
            let mut round = 0;
            for index in 0..self.sessions.len() {
                let from = self.sessions[index].id();
                let batches = self.sessions[index].drain_batches();
                let presence = self.sessions[index].drain_presence();
                round += batches.len() + presence.len();
                self.deliver(from, &batches, &presence);
            }
            if round == 0 {
                return delivered;
            }
            delivered += round;
        }
    }
}
