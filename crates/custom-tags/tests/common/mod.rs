//! Minimal in-memory host server for integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};

use custom_tags::{CapabilityQuery, TagStore, UserDirectory, UserId};
use custom_tags_core::irc_fold;

/// Connection handle used by the fake host.
pub type ConnId = u32;

/// One server's view of the network: who is online, their tags, and what
/// each local connection negotiated.
#[derive(Default)]
pub struct TestServer {
    nicks: HashMap<String, UserId>,
    pub tags: HashMap<UserId, TagStore>,
    caps: HashSet<(ConnId, String)>,
}

impl TestServer {
    pub fn connect(&mut self, nick: &str, uuid: &str) -> UserId {
        let id = UserId::new(uuid);
        self.nicks.insert(irc_fold(nick), id.clone());
        id
    }

    pub fn quit(&mut self, nick: &str) -> Option<UserId> {
        self.nicks.remove(&irc_fold(nick))
    }

    pub fn enable_cap(&mut self, conn: ConnId, cap: &str) {
        self.caps.insert((conn, cap.to_string()));
    }
}

impl UserDirectory for TestServer {
    fn find_nick(&self, nick: &str) -> Option<UserId> {
        self.nicks.get(&irc_fold(nick)).cloned()
    }
}

impl CapabilityQuery<ConnId> for TestServer {
    fn is_enabled(&self, connection: &ConnId, capability: &str) -> bool {
        self.caps.contains(&(*connection, capability.to_string()))
    }
}
