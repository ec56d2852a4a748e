use colocate_serde::{BitReader, BitWrite, BitWriter, Serde, SerdeErr, UnsignedInteger};

use crate::{
    messages::{
        codec::{generation_bit_length, read_generation, write_generation},
        error::MessageError,
    },
    sync::DriveInputs,
    types::{Generation, ObjectId, ObjectKind, PeerId},
    Pose, PoseSample,
};

type ServerTag = UnsignedInteger<4>;

/// Messages the coordinator sends to participants
#[derive(Clone, Debug, PartialEq)]
pub enum ServerMessage {
    /// First message on a new connection, tells the peer its id
    Welcome {
        peer: PeerId,
    },
    /// The session reached capacity; the connection will be closed
    SessionFull,
    AuthorityChanged {
        object: ObjectId,
        holder: Option<PeerId>,
        generation: Generation,
        /// Whether the object's physics should be frozen on every peer
        kinematic: bool,
    },
    /// A holder's pose, relayed to everyone else
    PoseUpdate {
        object: ObjectId,
        generation: Generation,
        sample: PoseSample,
        inputs: Option<DriveInputs>,
    },
    /// Reply to the peer whose `SpawnRequest` created `object`
    SpawnAssigned {
        object: ObjectId,
    },
    Spawned {
        object: ObjectId,
        kind: ObjectKind,
        prefab: String,
        pose: Pose,
    },
    Despawned {
        object: ObjectId,
    },
    /// Snap an object to `pose` without interpolation
    Teleport {
        object: ObjectId,
        pose: Pose,
    },
    /// Re-root local space so that `marker` becomes the origin
    ReRoot {
        marker: Pose,
    },
}

impl ServerMessage {
    fn tag(&self) -> u8 {
        match self {
            ServerMessage::Welcome { .. } => 0,
            ServerMessage::SessionFull => 1,
            ServerMessage::AuthorityChanged { .. } => 2,
            ServerMessage::PoseUpdate { .. } => 3,
            ServerMessage::SpawnAssigned { .. } => 4,
            ServerMessage::Spawned { .. } => 5,
            ServerMessage::Despawned { .. } => 6,
            ServerMessage::Teleport { .. } => 7,
            ServerMessage::ReRoot { .. } => 8,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ServerMessage::Welcome { .. } => "Welcome",
            ServerMessage::SessionFull => "SessionFull",
            ServerMessage::AuthorityChanged { .. } => "AuthorityChanged",
            ServerMessage::PoseUpdate { .. } => "PoseUpdate",
            ServerMessage::SpawnAssigned { .. } => "SpawnAssigned",
            ServerMessage::Spawned { .. } => "Spawned",
            ServerMessage::Despawned { .. } => "Despawned",
            ServerMessage::Teleport { .. } => "Teleport",
            ServerMessage::ReRoot { .. } => "ReRoot",
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = BitWriter::new();
        self.ser(&mut writer);
        writer.to_bytes()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MessageError> {
        let mut reader = BitReader::new(bytes);
        let message = Self::de(&mut reader).map_err(|source| MessageError::Decode {
            direction: "server",
            source,
        })?;
        let trailing_bits = reader.bits_remaining();
        if trailing_bits >= 8 {
            return Err(MessageError::TrailingData {
                direction: "server",
                trailing_bits,
            });
        }
        Ok(message)
    }
}

impl Serde for ServerMessage {
    fn ser(&self, writer: &mut dyn BitWrite) {
        ServerTag::new(self.tag()).ser(writer);
        match self {
            ServerMessage::Welcome { peer } => peer.ser(writer),
            ServerMessage::SessionFull => {}
            ServerMessage::AuthorityChanged {
                object,
                holder,
                generation,
                kinematic,
            } => {
                object.ser(writer);
                holder.ser(writer);
                write_generation(*generation, writer);
                kinematic.ser(writer);
            }
            ServerMessage::PoseUpdate {
                object,
                generation,
                sample,
                inputs,
            } => {
                object.ser(writer);
                write_generation(*generation, writer);
                sample.ser(writer);
                inputs.ser(writer);
            }
            ServerMessage::SpawnAssigned { object } | ServerMessage::Despawned { object } => {
                object.ser(writer);
            }
            ServerMessage::Spawned {
                object,
                kind,
                prefab,
                pose,
            } => {
                object.ser(writer);
                kind.ser(writer);
                prefab.ser(writer);
                pose.ser(writer);
            }
            ServerMessage::Teleport { object, pose } => {
                object.ser(writer);
                pose.ser(writer);
            }
            ServerMessage::ReRoot { marker } => marker.ser(writer),
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let tag = ServerTag::de(reader)?.get();
        match tag {
            0 => Ok(ServerMessage::Welcome {
                peer: PeerId::de(reader)?,
            }),
            1 => Ok(ServerMessage::SessionFull),
            2 => Ok(ServerMessage::AuthorityChanged {
                object: ObjectId::de(reader)?,
                holder: Option::<PeerId>::de(reader)?,
                generation: read_generation(reader)?,
                kinematic: bool::de(reader)?,
            }),
            3 => Ok(ServerMessage::PoseUpdate {
                object: ObjectId::de(reader)?,
                generation: read_generation(reader)?,
                sample: PoseSample::de(reader)?,
                inputs: Option::<DriveInputs>::de(reader)?,
            }),
            4 => Ok(ServerMessage::SpawnAssigned {
                object: ObjectId::de(reader)?,
            }),
            5 => Ok(ServerMessage::Spawned {
                object: ObjectId::de(reader)?,
                kind: ObjectKind::de(reader)?,
                prefab: String::de(reader)?,
                pose: Pose::de(reader)?,
            }),
            6 => Ok(ServerMessage::Despawned {
                object: ObjectId::de(reader)?,
            }),
            7 => Ok(ServerMessage::Teleport {
                object: ObjectId::de(reader)?,
                pose: Pose::de(reader)?,
            }),
            8 => Ok(ServerMessage::ReRoot {
                marker: Pose::de(reader)?,
            }),
            _ => Err(SerdeErr::UnknownTag {
                what: "server message",
                tag: u64::try_from(tag).unwrap_or(u64::MAX),
            }),
        }
    }

    fn bit_length(&self) -> u32 {
        let body = match self {
            ServerMessage::Welcome { peer } => peer.bit_length(),
            ServerMessage::SessionFull => 0,
            ServerMessage::AuthorityChanged {
                object,
                holder,
                generation,
                kinematic,
            } => {
                object.bit_length()
                    + holder.bit_length()
                    + generation_bit_length(*generation)
                    + kinematic.bit_length()
            }
            ServerMessage::PoseUpdate {
                object,
                generation,
                sample,
                inputs,
            } => {
                object.bit_length()
                    + generation_bit_length(*generation)
                    + sample.bit_length()
                    + inputs.bit_length()
            }
            ServerMessage::SpawnAssigned { object } | ServerMessage::Despawned { object } => {
                object.bit_length()
            }
            ServerMessage::Spawned {
                object,
                kind,
                prefab,
                pose,
            } => object.bit_length() + kind.bit_length() + prefab.bit_length() + pose.bit_length(),
            ServerMessage::Teleport { object, pose } => object.bit_length() + pose.bit_length(),
            ServerMessage::ReRoot { marker } => marker.bit_length(),
        };
        4 + body
    }
}
