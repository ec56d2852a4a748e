use crate::{
    bit_reader::BitReader, bit_writer::BitWrite, error::SerdeErr, integer::SerdeInteger,
    serde::Serde, ConstBitLength,
};

pub type UnsignedFloat<const BITS: u8, const FRACTION_DIGITS: u8> =
    SerdeFloat<false, false, BITS, FRACTION_DIGITS>;
pub type SignedFloat<const BITS: u8, const FRACTION_DIGITS: u8> =
    SerdeFloat<true, false, BITS, FRACTION_DIGITS>;
pub type UnsignedVariableFloat<const BITS: u8, const FRACTION_DIGITS: u8> =
    SerdeFloat<false, true, BITS, FRACTION_DIGITS>;
pub type SignedVariableFloat<const BITS: u8, const FRACTION_DIGITS: u8> =
    SerdeFloat<true, true, BITS, FRACTION_DIGITS>;

/// Fixed-point float. The value is multiplied by `10^FRACTION_DIGITS`,
/// rounded, and written as a `SerdeInteger` of the same shape.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct SerdeFloat<
    const SIGNED: bool,
    const VARIABLE: bool,
    const BITS: u8,
    const FRACTION_DIGITS: u8,
> {
    scaled: SerdeInteger<SIGNED, VARIABLE, BITS>,
}

impl<const SIGNED: bool, const VARIABLE: bool, const BITS: u8, const FRACTION_DIGITS: u8>
    SerdeFloat<SIGNED, VARIABLE, BITS, FRACTION_DIGITS>
{
    fn scale() -> f32 {
        10f32.powi(i32::from(FRACTION_DIGITS))
    }

    /// Quantize a float, returning an error if it is not finite or its
    /// scaled value does not fit.
    pub fn try_new<T: Into<f32>>(value: T) -> Result<Self, SerdeErr> {
        let value: f32 = value.into();
        if !value.is_finite() {
            return Err(SerdeErr::InvalidValue {
                field: "float",
                reason: "value is not finite",
            });
        }
        let scaled = (value * Self::scale()).round() as i128;
        Ok(Self {
            scaled: SerdeInteger::try_new(scaled)?,
        })
    }

    /// Quantize a float
    ///
    /// # Panics
    ///
    /// Panics if the value is not finite or does not fit in the declared width.
    pub fn new<T: Into<f32>>(value: T) -> Self {
        Self::try_new(value).expect("float value does not fit its declared bit width")
    }

    pub fn get(&self) -> f32 {
        self.scaled.get() as f32 / Self::scale()
    }
}

impl<const SIGNED: bool, const VARIABLE: bool, const BITS: u8, const FRACTION_DIGITS: u8> Serde
    for SerdeFloat<SIGNED, VARIABLE, BITS, FRACTION_DIGITS>
{
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.scaled.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            scaled: SerdeInteger::de(reader)?,
        })
    }

    fn bit_length(&self) -> u32 {
        self.scaled.bit_length()
    }
}

impl<const SIGNED: bool, const BITS: u8, const FRACTION_DIGITS: u8> ConstBitLength
    for SerdeFloat<SIGNED, false, BITS, FRACTION_DIGITS>
{
    fn const_bit_length() -> u32 {
        SerdeInteger::<SIGNED, false, BITS>::const_bit_length()
    }
}
