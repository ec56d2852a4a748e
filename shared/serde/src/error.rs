use thiserror::Error;

/// Errors raised while encoding or decoding the wire format
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerdeErr {
    /// The reader ran out of bits
    #[error("unexpected end of buffer at bit {bit_index}")]
    UnexpectedEnd { bit_index: usize },

    /// A kind tag did not match any known variant
    #[error("unknown {what} tag: {tag}")]
    UnknownTag { what: &'static str, tag: u64 },

    /// A value does not fit in the declared bit width
    #[error("value {value} does not fit in {bits} bits (signed: {signed})")]
    OutOfRange { value: i128, bits: u8, signed: bool },

    /// A decoded string was not valid UTF-8
    #[error("string field is not valid UTF-8")]
    InvalidUtf8,

    /// A decoded value violates a domain constraint
    #[error("invalid {field}: {reason}")]
    InvalidValue {
        field: &'static str,
        reason: &'static str,
    },
}
