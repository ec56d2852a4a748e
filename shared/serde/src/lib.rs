//! # Colocate Serde
//! Bit-level serialization used by the colocate wire protocol: a growable
//! bit writer, a bounds-checked bit reader, fixed/variable-length integers
//! and fixed-point quantized floats.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod bit_reader;
mod bit_writer;
mod error;
mod float;
mod integer;
mod serde;

pub use bit_reader::BitReader;
pub use bit_writer::{BitWrite, BitWriter};
pub use error::SerdeErr;
pub use float::{
    SerdeFloat, SignedFloat, SignedVariableFloat, UnsignedFloat, UnsignedVariableFloat,
};
pub use integer::{
    SerdeInteger, SignedInteger, SignedVariableInteger, UnsignedInteger, UnsignedVariableInteger,
};
pub use serde::{ConstBitLength, Serde};
