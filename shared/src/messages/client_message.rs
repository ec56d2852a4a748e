use colocate_serde::{BitReader, BitWrite, BitWriter, Serde, SerdeErr, UnsignedInteger};

use crate::{
    messages::{
        codec::{generation_bit_length, read_generation, write_generation},
        error::MessageError,
    },
    sync::DriveInputs,
    types::{Generation, ObjectId},
    Pose, PoseSample,
};

type ClientTag = UnsignedInteger<3>;

/// Messages a participant sends to the coordinator
#[derive(Clone, Debug, PartialEq)]
pub enum ClientMessage {
    RequestHold {
        object: ObjectId,
    },
    Release {
        object: ObjectId,
    },
    /// A pose authored by the holder under authority `generation`
    PoseUpdate {
        object: ObjectId,
        generation: Generation,
        sample: PoseSample,
        inputs: Option<DriveInputs>,
    },
    SpawnRequest {
        prefab: String,
        pose: Pose,
        /// Hand the new object straight to the requester
        grab: bool,
    },
    /// A placeable marker was released onto the floor
    CommitPlacement {
        marker: ObjectId,
        pose: Pose,
    },
}

impl ClientMessage {
    fn tag(&self) -> u8 {
        match self {
            ClientMessage::RequestHold { .. } => 0,
            ClientMessage::Release { .. } => 1,
            ClientMessage::PoseUpdate { .. } => 2,
            ClientMessage::SpawnRequest { .. } => 3,
            ClientMessage::CommitPlacement { .. } => 4,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ClientMessage::RequestHold { .. } => "RequestHold",
            ClientMessage::Release { .. } => "Release",
            ClientMessage::PoseUpdate { .. } => "PoseUpdate",
            ClientMessage::SpawnRequest { .. } => "SpawnRequest",
            ClientMessage::CommitPlacement { .. } => "CommitPlacement",
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
            direction: "client",
            source,
        })?;
        let trailing_bits = reader.bits_remaining();
        if trailing_bits >= 8 {
            return Err(MessageError::TrailingData {
                direction: "client",
                trailing_bits,
            });
        }
        Ok(message)
    }
}

impl Serde for ClientMessage {
    fn ser(&self, writer: &mut dyn BitWrite) {
        ClientTag::new(self.tag()).ser(writer);
        match self {
            ClientMessage::RequestHold { object } | ClientMessage::Release { object } => {
                object.ser(writer);
            }
            ClientMessage::PoseUpdate {
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
            ClientMessage::SpawnRequest { prefab, pose, grab } => {
                prefab.ser(writer);
                pose.ser(writer);
                grab.ser(writer);
            }
            ClientMessage::CommitPlacement { marker, pose } => {
                marker.ser(writer);
                pose.ser(writer);
            }
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let tag = ClientTag::de(reader)?.get();
        match tag {
            0 => Ok(ClientMessage::RequestHold {
                object: ObjectId::de(reader)?,
            }),
            1 => Ok(ClientMessage::Release {
                object: ObjectId::de(reader)?,
            }),
            2 => Ok(ClientMessage::PoseUpdate {
                object: ObjectId::de(reader)?,
                generation: read_generation(reader)?,
                sample: PoseSample::de(reader)?,
                inputs: Option::<DriveInputs>::de(reader)?,
            }),
            3 => Ok(ClientMessage::SpawnRequest {
                prefab: String::de(reader)?,
                pose: Pose::de(reader)?,
                grab: bool::de(reader)?,
            }),
            4 => Ok(ClientMessage::CommitPlacement {
                marker: ObjectId::de(reader)?,
                pose: Pose::de(reader)?,
            }),
            _ => Err(SerdeErr::UnknownTag {
                what: "client message",
                tag: u64::try_from(tag).unwrap_or(u64::MAX),
            }),
        }
    }

    fn bit_length(&self) -> u32 {
        let body = match self {
            ClientMessage::RequestHold { object } | ClientMessage::Release { object } => {
                object.bit_length()
            }
            ClientMessage::PoseUpdate {
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
            ClientMessage::SpawnRequest { prefab, pose, grab } => {
                prefab.bit_length() + pose.bit_length() + grab.bit_length()
            }
            ClientMessage::CommitPlacement { marker, pose } => {
                marker.bit_length() + pose.bit_length()
            }
        };
        3 + body
    }
}
