//! Wire representation of the domain types carried by messages.
//!
//! Positions are quantized to millimetres, rotation components to four
//! decimal places (renormalized after decoding), input axes to hundredths
//! and timestamps to milliseconds.

use std::time::Duration;

use colocate_serde::{
    BitReader, BitWrite, Serde, SerdeErr, SignedFloat, SignedVariableFloat, UnsignedFloat,
    UnsignedInteger, UnsignedVariableInteger,
};
use glam::{Quat, Vec3};
use log::warn;

use crate::{
    math::normalize_rotation,
    sync::DriveInputs,
    types::{Generation, ObjectId, ObjectKind, PeerId},
    Pose, PoseSample,
};

type PositionComponent = SignedVariableFloat<11, 3>;
type RotationComponent = SignedFloat<14, 4>;
type AxisComponent = SignedFloat<7, 2>;
type BrakeComponent = UnsignedFloat<7, 2>;
type Millis = UnsignedVariableInteger<10>;

fn to_u32(value: i128, bits: u8) -> Result<u32, SerdeErr> {
    u32::try_from(value).map_err(|_| SerdeErr::OutOfRange {
        value,
        bits,
        signed: false,
    })
}

fn to_u64(value: i128, bits: u8) -> Result<u64, SerdeErr> {
    u64::try_from(value).map_err(|_| SerdeErr::OutOfRange {
        value,
        bits,
        signed: false,
    })
}

/// Largest distance from the origin, in metres, that a position component
/// may carry on the wire
const POSITION_LIMIT: f32 = 100_000.0;

/// Non-finite components become 0 and components beyond `POSITION_LIMIT`
/// are clamped to it
fn quantize_position(component: f32) -> PositionComponent {
    let clamped = if component.is_finite() {
        component.clamp(-POSITION_LIMIT, POSITION_LIMIT)
    } else {
        0.0
    };
    if clamped != component {
        warn!("Clamping position component {} to {}", component, clamped);
    }
    PositionComponent::try_new(clamped).unwrap_or_else(|_| PositionComponent::new(0.0f32))
}

pub(crate) fn write_position(position: Vec3, writer: &mut dyn BitWrite) {
    for component in position.to_array() {
        quantize_position(component).ser(writer);
    }
}

pub(crate) fn read_position(reader: &mut BitReader) -> Result<Vec3, SerdeErr> {
    let x = PositionComponent::de(reader)?.get();
    let y = PositionComponent::de(reader)?.get();
    let z = PositionComponent::de(reader)?.get();
    Ok(Vec3::new(x, y, z))
}

fn position_bit_length(position: Vec3) -> u32 {
    position
        .to_array()
        .iter()
        .map(|component| quantize_position(*component).bit_length())
        .sum()
}

pub(crate) fn write_rotation(rotation: Quat, writer: &mut dyn BitWrite) {
    for component in normalize_rotation(rotation).to_array() {
        RotationComponent::try_new(component)
            .unwrap_or_else(|_| RotationComponent::new(0.0f32))
            .ser(writer);
    }
}

pub(crate) fn read_rotation(reader: &mut BitReader) -> Result<Quat, SerdeErr> {
    let x = RotationComponent::de(reader)?.get();
    let y = RotationComponent::de(reader)?.get();
    let z = RotationComponent::de(reader)?.get();
    let w = RotationComponent::de(reader)?.get();
    Ok(normalize_rotation(Quat::from_xyzw(x, y, z, w)))
}

const ROTATION_BITS: u32 = 4 * 15;

fn write_timestamp(timestamp: Duration, writer: &mut dyn BitWrite) {
    let millis = u64::try_from(timestamp.as_millis()).unwrap_or(u64::MAX);
    Millis::new(millis).ser(writer);
}

fn read_timestamp(reader: &mut BitReader) -> Result<Duration, SerdeErr> {
    let millis = to_u64(Millis::de(reader)?.get(), 10)?;
    Ok(Duration::from_millis(millis))
}

fn timestamp_bit_length(timestamp: Duration) -> u32 {
    let millis = u64::try_from(timestamp.as_millis()).unwrap_or(u64::MAX);
    Millis::new(millis).bit_length()
}

pub(crate) fn write_generation(generation: Generation, writer: &mut dyn BitWrite) {
    UnsignedVariableInteger::<7>::new(generation).ser(writer);
}

pub(crate) fn read_generation(reader: &mut BitReader) -> Result<Generation, SerdeErr> {
    to_u64(UnsignedVariableInteger::<7>::de(reader)?.get(), 7)
}

pub(crate) fn generation_bit_length(generation: Generation) -> u32 {
    UnsignedVariableInteger::<7>::new(generation).bit_length()
}

impl Serde for ObjectId {
    fn ser(&self, writer: &mut dyn BitWrite) {
        UnsignedVariableInteger::<7>::new(self.to_u32()).ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let value = UnsignedVariableInteger::<7>::de(reader)?.get();
        Ok(ObjectId::new(to_u32(value, 7)?))
    }

    fn bit_length(&self) -> u32 {
        UnsignedVariableInteger::<7>::new(self.to_u32()).bit_length()
    }
}

impl Serde for PeerId {
    fn ser(&self, writer: &mut dyn BitWrite) {
        UnsignedVariableInteger::<4>::new(self.to_u32()).ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let value = UnsignedVariableInteger::<4>::de(reader)?.get();
        Ok(PeerId::new(to_u32(value, 4)?))
    }

    fn bit_length(&self) -> u32 {
        UnsignedVariableInteger::<4>::new(self.to_u32()).bit_length()
    }
}

impl Serde for ObjectKind {
    fn ser(&self, writer: &mut dyn BitWrite) {
        let tag: u8 = match self {
            ObjectKind::Grabbable => 0,
            ObjectKind::Vehicle => 1,
            ObjectKind::Marker => 2,
        };
        UnsignedInteger::<2>::new(tag).ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        match UnsignedInteger::<2>::de(reader)?.get() {
            0 => Ok(ObjectKind::Grabbable),
            1 => Ok(ObjectKind::Vehicle),
            2 => Ok(ObjectKind::Marker),
            tag => Err(SerdeErr::UnknownTag {
                what: "object kind",
                tag: to_u64(tag, 2)?,
            }),
        }
    }

    fn bit_length(&self) -> u32 {
        2
    }
}

impl Serde for Pose {
    fn ser(&self, writer: &mut dyn BitWrite) {
        write_position(self.position, writer);
        write_rotation(self.rotation, writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let position = read_position(reader)?;
        let rotation = read_rotation(reader)?;
        Ok(Pose::new(position, rotation))
    }

    fn bit_length(&self) -> u32 {
        position_bit_length(self.position) + ROTATION_BITS
    }
}

impl Serde for PoseSample {
    fn ser(&self, writer: &mut dyn BitWrite) {
        write_position(self.position, writer);
        write_rotation(self.rotation, writer);
        write_timestamp(self.timestamp, writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let position = read_position(reader)?;
        let rotation = read_rotation(reader)?;
        let timestamp = read_timestamp(reader)?;
        Ok(PoseSample::new(position, rotation, timestamp))
    }

    fn bit_length(&self) -> u32 {
        position_bit_length(self.position) + ROTATION_BITS + timestamp_bit_length(self.timestamp)
    }
}

impl Serde for DriveInputs {
    fn ser(&self, writer: &mut dyn BitWrite) {
        let inputs = DriveInputs::with_brake(self.steering, self.throttle, self.brake);
        for axis in [inputs.steering, inputs.throttle] {
            AxisComponent::try_new(axis)
                .unwrap_or_else(|_| AxisComponent::new(0.0f32))
                .ser(writer);
        }
        BrakeComponent::try_new(inputs.brake)
            .unwrap_or_else(|_| BrakeComponent::new(0.0f32))
            .ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let steering = AxisComponent::de(reader)?.get();
        let throttle = AxisComponent::de(reader)?.get();
        let brake = BrakeComponent::de(reader)?.get();
        Ok(DriveInputs::with_brake(steering, throttle, brake))
    }

    fn bit_length(&self) -> u32 {
        8 + 8 + 7
    }
}
