use std::time::Duration;

use colocate_client::{Client, ClientConfig};
use colocate_server::{ConnectError, Server, ServerConfig};
use colocate_shared::PeerId;

struct TestPeer {
    peer: PeerId,
    connected: bool,
    client: Client,
}

/// One coordinator and any number of participants, connected by an
/// in-memory ordered channel. Every payload goes through the wire codec.
pub struct LocalNetwork {
    pub server: Server,
    peers: Vec<TestPeer>,
}

impl LocalNetwork {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            server: Server::new(config),
            peers: Vec::new(),
        }
    }

    /// Connect a new participant and deliver everything the coordinator
    /// sends it. Returns its index; a refused participant keeps its index
    /// but stays disconnected.
    pub fn add_client(&mut self) -> usize {
        let (peer, connected) = match self.server.connect() {
            Ok(peer) => (peer, true),
            Err(ConnectError::SessionFull { peer, .. }) => (peer, false),
        };
        self.peers.push(TestPeer {
            peer,
            connected,
            client: Client::new(ClientConfig::default()),
        });
        self.exchange();
        self.peers.len() - 1
    }

    pub fn disconnect(&mut self, index: usize) {
        let test_peer = &mut self.peers[index];
        test_peer.connected = false;
        self.server.disconnect(&test_peer.peer);
        self.exchange();
    }

    /// Deliver queued payloads both ways until nothing is left in flight
    pub fn exchange(&mut self) {
        loop {
            let mut delivered = false;

            for (to, payload) in self.server.take_outgoing() {
                if let Some(test_peer) = self.peers.iter_mut().find(|test_peer| test_peer.peer == to) {
                    test_peer.client.receive(&payload);
                    delivered = true;
                }
            }

            for test_peer in self.peers.iter_mut() {
                for payload in test_peer.client.take_outgoing() {
                    if test_peer.connected {
                        self.server.receive(&test_peer.peer, &payload);
                        delivered = true;
                    }
                }
            }

            if !delivered {
                break;
            }
        }
    }

    /// Advance every participant and the coordinator by one step, then
    /// exchange
    pub fn tick(&mut self, delta: Duration) {
        self.server.tick(delta);
        for test_peer in self.peers.iter_mut() {
            test_peer.client.tick(delta);
        }
        self.exchange();
    }

    pub fn tick_for(&mut self, total: Duration, step: Duration) {
        let mut elapsed = Duration::ZERO;
        while elapsed < total {
            self.tick(step);
            elapsed += step;
        }
    }

    pub fn peer(&self, index: usize) -> PeerId {
        self.peers[index].peer
    }

    pub fn client(&self, index: usize) -> &Client {
        &self.peers[index].client
    }

    pub fn client_mut(&mut self, index: usize) -> &mut Client {
        &mut self.peers[index].client
    }
}

impl Default for LocalNetwork {
    fn default() -> Self {
        Self::new(ServerConfig::default())
    }
}
