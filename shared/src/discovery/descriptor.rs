use std::fmt;

use colocate_serde::{BitReader, BitWrite, Serde, SerdeErr};
use uuid::{Builder, Uuid};

/// Identifies one colocated session. Shared anchors are keyed by it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GroupId(Uuid);

impl GroupId {
    /// Fresh random (version 4) group id
    pub fn generate() -> Self {
        let bytes = fastrand::u128(..).to_le_bytes();
        Self(Builder::from_random_bytes(bytes).into_uuid())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl Serde for GroupId {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.0.as_u128().ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self(Uuid::from_u128(u128::de(reader)?)))
    }

    fn bit_length(&self) -> u32 {
        128
    }
}

/// What a joining peer needs to find the session: the group whose anchors it
/// must load and the host it must connect to. Immutable for the session.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionDescriptor {
    pub group_id: GroupId,
    pub host_address: String,
}

impl SessionDescriptor {
    pub fn new(group_id: GroupId, host_address: impl Into<String>) -> Self {
        Self {
            group_id,
            host_address: host_address.into(),
        }
    }
}

/// Proximity advertisement payload: UTF-8 `"<tag>|<host address>"`
pub fn encode_payload(protocol_tag: &str, host_address: &str) -> Vec<u8> {
    format!("{protocol_tag}|{host_address}").into_bytes()
}

/// Host address carried by `payload`, or `None` if the payload is malformed
/// or was published under another tag
pub fn decode_payload(protocol_tag: &str, payload: &[u8]) -> Option<String> {
    let text = std::str::from_utf8(payload).ok()?;
    let (tag, host_address) = text.split_once('|')?;
    if tag != protocol_tag || host_address.is_empty() {
        return None;
    }
    Some(host_address.to_string())
}
