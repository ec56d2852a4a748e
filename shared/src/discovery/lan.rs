use std::net::{Ipv4Addr, SocketAddr};

use async_trait::async_trait;
use colocate_serde::{BitReader, BitWriter, Serde, SerdeErr};
use log::{debug, warn};
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;

use crate::discovery::{
    DiscoveryChannel, DiscoveryConfig, DiscoveryError, GroupId, SessionDescriptor,
};

const DATAGRAM_CAPACITY: usize = 512;

#[derive(Clone, Debug, PartialEq)]
enum LanDatagram {
    Request,
    Response {
        group_id: GroupId,
        host_address: String,
    },
}

impl LanDatagram {
    fn to_bytes(&self, protocol_tag: &str) -> Vec<u8> {
        let mut writer = BitWriter::new();
        protocol_tag.to_string().ser(&mut writer);
        match self {
            LanDatagram::Request => false.ser(&mut writer),
            LanDatagram::Response {
                group_id,
                host_address,
            } => {
                true.ser(&mut writer);
                group_id.ser(&mut writer);
                host_address.ser(&mut writer);
            }
        }
        writer.to_bytes()
    }

    /// `None` for datagrams published under another tag
    fn from_bytes(protocol_tag: &str, bytes: &[u8]) -> Result<Option<Self>, SerdeErr> {
        let mut reader = BitReader::new(bytes);
        if String::de(&mut reader)? != protocol_tag {
            return Ok(None);
        }
        if !bool::de(&mut reader)? {
            return Ok(Some(LanDatagram::Request));
        }
        let group_id = GroupId::de(&mut reader)?;
        let host_address = String::de(&mut reader)?;
        Ok(Some(LanDatagram::Response {
            group_id,
            host_address,
        }))
    }
}

/// Discovery by UDP broadcast on the local network. Joining peers broadcast
/// a request every `lan_request_interval`; advertising hosts answer with
/// their session descriptor.
pub struct LanChannel {
    config: DiscoveryConfig,
}

impl LanChannel {
    pub fn new(config: DiscoveryConfig) -> Self {
        Self { config }
    }

    fn advertise_error(error: std::io::Error) -> DiscoveryError {
        DiscoveryError::AdvertiseFailed {
            channel: "lan",
            reason: error.to_string(),
        }
    }

    fn discover_error(error: std::io::Error) -> DiscoveryError {
        DiscoveryError::DiscoveryFailed {
            channel: "lan",
            reason: error.to_string(),
        }
    }
}

#[async_trait]
impl DiscoveryChannel for LanChannel {
    fn name(&self) -> &'static str {
        "lan"
    }

    async fn advertise(
        &self,
        descriptor: SessionDescriptor,
        cancel: CancellationToken,
    ) -> Result<(), DiscoveryError> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, self.config.lan_port))
            .await
            .map_err(Self::advertise_error)?;
        let response = LanDatagram::Response {
            group_id: descriptor.group_id,
            host_address: descriptor.host_address.clone(),
        }
        .to_bytes(&self.config.protocol_tag);
        let mut buffer = [0u8; DATAGRAM_CAPACITY];

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                received = socket.recv_from(&mut buffer) => {
                    let (length, from) = match received {
                        Ok(received) => received,
                        Err(error) => {
                            warn!("LAN advertisement receive failed: {}", error);
                            continue;
                        }
                    };
                    match LanDatagram::from_bytes(&self.config.protocol_tag, &buffer[..length]) {
                        Ok(Some(LanDatagram::Request)) => {
                            if let Err(error) = socket.send_to(&response, from).await {
                                warn!("LAN advertisement reply to {} failed: {}", from, error);
                            }
                        }
                        Ok(_) => {}
                        Err(error) => debug!("Ignoring malformed LAN datagram from {}: {}", from, error),
                    }
                }
            }
        }
    }

    async fn discover(
        &self,
        cancel: CancellationToken,
    ) -> Result<SessionDescriptor, DiscoveryError> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
            .await
            .map_err(Self::discover_error)?;
        socket.set_broadcast(true).map_err(Self::discover_error)?;

        let target = SocketAddr::new(self.config.lan_broadcast_ip, self.config.lan_port);
        let request = LanDatagram::Request.to_bytes(&self.config.protocol_tag);
        let mut requests = tokio::time::interval(self.config.lan_request_interval);
        let mut buffer = [0u8; DATAGRAM_CAPACITY];

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return Err(DiscoveryError::Cancelled),
                _ = requests.tick() => {
                    if let Err(error) = socket.send_to(&request, target).await {
                        warn!("LAN discovery request to {} failed: {}", target, error);
                    }
                }
                received = socket.recv_from(&mut buffer) => {
                    let (length, from) = match received {
                        Ok(received) => received,
                        Err(error) => {
                            warn!("LAN discovery receive failed: {}", error);
                            continue;
                        }
                    };
                    match LanDatagram::from_bytes(&self.config.protocol_tag, &buffer[..length]) {
                        Ok(Some(LanDatagram::Response { group_id, host_address })) => {
                            return Ok(SessionDescriptor::new(group_id, host_address));
                        }
                        Ok(_) => {}
                        Err(error) => debug!("Ignoring malformed LAN datagram from {}: {}", from, error),
                    }
                }
            }
        }
    }
}
