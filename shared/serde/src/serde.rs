use crate::{
    bit_reader::BitReader, bit_writer::BitWrite, error::SerdeErr, integer::UnsignedVariableInteger,
};

/// A type that can be written to and read from the bit stream
pub trait Serde: Sized + Clone + PartialEq {
    /// Serialize Self to a BitWriter
    fn ser(&self, writer: &mut dyn BitWrite);

    /// Parse Self from a BitReader
    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr>;

    /// Number of bits `ser` will write for this value
    fn bit_length(&self) -> u32;
}

/// Types whose encoded size does not depend on the value
pub trait ConstBitLength {
    fn const_bit_length() -> u32;
}

impl Serde for bool {
    fn ser(&self, writer: &mut dyn BitWrite) {
        writer.write_bit(*self);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        reader.read_bit()
    }

    fn bit_length(&self) -> u32 {
        1
    }
}

impl ConstBitLength for bool {
    fn const_bit_length() -> u32 {
        1
    }
}

macro_rules! impl_serde_for_unsigned {
    ($($ty:ty => $bits:expr),*) => {
        $(
            impl Serde for $ty {
                fn ser(&self, writer: &mut dyn BitWrite) {
                    writer.write_bits(u64::from(*self), $bits);
                }

                fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
                    let value = reader.read_bits($bits)?;
                    <$ty>::try_from(value).map_err(|_| SerdeErr::OutOfRange {
                        value: i128::from(value),
                        bits: $bits,
                        signed: false,
                    })
                }

                fn bit_length(&self) -> u32 {
                    $bits
                }
            }

            impl ConstBitLength for $ty {
                fn const_bit_length() -> u32 {
                    $bits
                }
            }
        )*
    };
}

impl_serde_for_unsigned!(u8 => 8, u16 => 16, u32 => 32, u64 => 64);

impl Serde for u128 {
    fn ser(&self, writer: &mut dyn BitWrite) {
        writer.write_bits(*self as u64, 64);
        writer.write_bits((*self >> 64) as u64, 64);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let low = reader.read_bits(64)? as u128;
        let high = reader.read_bits(64)? as u128;
        Ok(low | (high << 64))
    }

    fn bit_length(&self) -> u32 {
        128
    }
}

impl<T: Serde> Serde for Option<T> {
    fn ser(&self, writer: &mut dyn BitWrite) {
        match self {
            Some(value) => {
                writer.write_bit(true);
                value.ser(writer);
            }
            None => writer.write_bit(false),
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        if reader.read_bit()? {
            Ok(Some(T::de(reader)?))
        } else {
            Ok(None)
        }
    }

    fn bit_length(&self) -> u32 {
        match self {
            Some(value) => 1 + value.bit_length(),
            None => 1,
        }
    }
}

// Strings are length-prefixed with a variable-length byte count.
impl Serde for String {
    fn ser(&self, writer: &mut dyn BitWrite) {
        let length = UnsignedVariableInteger::<5>::new(self.len() as u64);
        length.ser(writer);
        for byte in self.as_bytes() {
            writer.write_byte(*byte);
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let length = UnsignedVariableInteger::<5>::de(reader)?.get() as usize;
        if length > reader.bits_remaining() / 8 {
            return Err(SerdeErr::UnexpectedEnd {
                bit_index: reader.bits_remaining(),
            });
        }
        let mut bytes = Vec::with_capacity(length);
        for _ in 0..length {
            bytes.push(reader.read_byte()?);
        }
        String::from_utf8(bytes).map_err(|_| SerdeErr::InvalidUtf8)
    }

    fn bit_length(&self) -> u32 {
        let length = UnsignedVariableInteger::<5>::new(self.len() as u64);
        length.bit_length() + (self.len() as u32) * 8
    }
}
