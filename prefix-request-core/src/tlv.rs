//! NDN Type-Length-Value primitives.
//!
//! Wire format of one element:
//!
//! | Field  | Size    | Description                         |
//! |--------|---------|-------------------------------------|
//! | type   | 1-9     | VarNumber                           |
//! | length | 1-9     | VarNumber, length of `value`        |
//! | value  | length  | Nested elements or opaque bytes     |
//!
//! VarNumber: values below 253 take one byte; 253, 254 and 255 announce a
//! big-endian u16, u32 or u64 respectively.

/// TLV type numbers used by this crate.
pub mod types {
    pub const IMPLICIT_SHA256_DIGEST_COMPONENT: u64 = 0x01;
    pub const PARAMETERS_SHA256_DIGEST_COMPONENT: u64 = 0x02;
    pub const INTEREST: u64 = 0x05;
    pub const DATA: u64 = 0x06;
    pub const NAME: u64 = 0x07;
    pub const GENERIC_NAME_COMPONENT: u64 = 0x08;
    pub const SEGMENT_NAME_COMPONENT: u64 = 0x32;
    pub const BYTE_OFFSET_NAME_COMPONENT: u64 = 0x34;
    pub const VERSION_NAME_COMPONENT: u64 = 0x36;
    pub const TIMESTAMP_NAME_COMPONENT: u64 = 0x38;
    pub const SEQUENCE_NUM_NAME_COMPONENT: u64 = 0x3a;
    pub const NONCE: u64 = 0x0a;
    pub const INTEREST_LIFETIME: u64 = 0x0c;
    pub const MUST_BE_FRESH: u64 = 0x12;
    pub const META_INFO: u64 = 0x14;
    pub const CONTENT: u64 = 0x15;
    pub const SIGNATURE_INFO: u64 = 0x16;
    pub const SIGNATURE_VALUE: u64 = 0x17;
    pub const CONTENT_TYPE: u64 = 0x18;
    pub const FRESHNESS_PERIOD: u64 = 0x19;
    pub const SIGNATURE_TYPE: u64 = 0x1b;
    pub const KEY_LOCATOR: u64 = 0x1c;
    pub const CAN_BE_PREFIX: u64 = 0x21;
    pub const HOP_LIMIT: u64 = 0x22;
    pub const APPLICATION_PARAMETERS: u64 = 0x24;
    pub const SIGNATURE_NONCE: u64 = 0x26;
    pub const SIGNATURE_TIME: u64 = 0x28;
    pub const INTEREST_SIGNATURE_INFO: u64 = 0x2c;
    pub const INTEREST_SIGNATURE_VALUE: u64 = 0x2e;

    // NDNLPv2
    pub const LP_PACKET: u64 = 0x64;
    pub const LP_FRAGMENT: u64 = 0x50;
    pub const LP_NACK: u64 = 0x0320;
    pub const LP_NACK_REASON: u64 = 0x0321;
    pub const LP_INCOMING_FACE_ID: u64 = 0x032c;
    pub const LP_HEADER_FIRST: u64 = 800;
    pub const LP_HEADER_LAST: u64 = 959;

    // NFD management
    pub const CONTROL_PARAMETERS: u64 = 0x68;
    pub const FACE_ID: u64 = 0x69;
    pub const COST: u64 = 0x6a;
    pub const FLAGS: u64 = 0x6c;
    pub const EXPIRATION_PERIOD: u64 = 0x6d;
    pub const ORIGIN: u64 = 0x6f;
    pub const MASK: u64 = 0x70;
    pub const CONTROL_RESPONSE: u64 = 0x65;
    pub const STATUS_CODE: u64 = 0x66;
    pub const STATUS_TEXT: u64 = 0x67;
}

/// Errors raised while decoding TLV.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum TlvError {
    /// Input ended in the middle of an element.
    #[error("truncated TLV element")]
    Truncated,

    /// An element other than the one required appeared.
    #[error("unexpected TLV type {actual} (expected {expected})")]
    UnexpectedType { expected: u64, actual: u64 },

    /// A required element is absent.
    #[error("missing required TLV element {0}")]
    Missing(u64),

    /// A NonNegativeInteger had a width other than 1, 2, 4 or 8.
    #[error("invalid NonNegativeInteger width {0}")]
    InvalidInteger(usize),

    /// An unrecognized critical element was present.
    #[error("unrecognized critical TLV type {0}")]
    UnrecognizedCritical(u64),
}

/// Number of bytes needed to encode `value` as a VarNumber.
#[must_use]
pub fn var_number_len(value: u64) -> usize {
    if value < 253 {
        1
    } else if value <= u64::from(u16::MAX) {
        3
    } else if value <= u64::from(u32::MAX) {
        5
    } else {
        9
    }
}

/// Append `value` as a VarNumber.
pub fn write_var_number(buf: &mut Vec<u8>, value: u64) {
    if value < 253 {
        buf.push(value as u8);
    } else if value <= u64::from(u16::MAX) {
        buf.push(253);
        buf.extend_from_slice(&(value as u16).to_be_bytes());
    } else if value <= u64::from(u32::MAX) {
        buf.push(254);
        buf.extend_from_slice(&(value as u32).to_be_bytes());
    } else {
        buf.push(255);
        buf.extend_from_slice(&value.to_be_bytes());
    }
}

/// Decode a VarNumber from the front of `bytes`.
///
/// Returns `(value, bytes_consumed)`, or `None` if `bytes` is too short.
#[must_use]
pub fn read_var_number(bytes: &[u8]) -> Option<(u64, usize)> {
    let first = *bytes.first()?;
    let width = match first {
        253 => 2,
        254 => 4,
        255 => 8,
        small => return Some((u64::from(small), 1)),
    };
    let raw = bytes.get(1..1 + width)?;
    let value = raw.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b));
    Some((value, 1 + width))
}

/// Append a complete element.
pub fn write_tlv(buf: &mut Vec<u8>, tlv_type: u64, value: &[u8]) {
    write_var_number(buf, tlv_type);
    write_var_number(buf, value.len() as u64);
    buf.extend_from_slice(value);
}

/// Encode a complete element into a fresh buffer.
#[must_use]
pub fn encode_tlv(tlv_type: u64, value: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(
        var_number_len(tlv_type) + var_number_len(value.len() as u64) + value.len(),
    );
    write_tlv(&mut buf, tlv_type, value);
    buf
}

/// Encode a NonNegativeInteger using the shortest of 1, 2, 4 or 8 bytes.
#[must_use]
pub fn encode_non_negative_integer(value: u64) -> Vec<u8> {
    if value <= u64::from(u8::MAX) {
        vec![value as u8]
    } else if value <= u64::from(u16::MAX) {
        (value as u16).to_be_bytes().to_vec()
    } else if value <= u64::from(u32::MAX) {
        (value as u32).to_be_bytes().to_vec()
    } else {
        value.to_be_bytes().to_vec()
    }
}

/// Decode a NonNegativeInteger value.
pub fn decode_non_negative_integer(value: &[u8]) -> Result<u64, TlvError> {
    match value.len() {
        1 | 2 | 4 | 8 => Ok(value.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b))),
        other => Err(TlvError::InvalidInteger(other)),
    }
}

/// Append a NonNegativeInteger element.
pub fn write_non_negative_integer(buf: &mut Vec<u8>, tlv_type: u64, value: u64) {
    write_tlv(buf, tlv_type, &encode_non_negative_integer(value));
}

/// Whether an unrecognized element of this type may be skipped.
///
/// Types 0-31 and odd types are critical.
#[must_use]
pub fn is_critical(tlv_type: u64) -> bool {
    tlv_type <= 31 || tlv_type % 2 == 1
}

/// One decoded element borrowing from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Element<'a> {
    pub tlv_type: u64,
    pub value: &'a [u8],
    /// The whole element including type and length.
    pub wire: &'a [u8],
}

/// Sequential reader over a buffer of concatenated elements.
#[derive(Debug, Clone)]
pub struct TlvReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> TlvReader<'a> {
    #[must_use]
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    /// Type of the next element without consuming it.
    #[must_use]
    pub fn peek_type(&self) -> Option<u64> {
        read_var_number(&self.buf[self.pos..]).map(|(t, _)| t)
    }

    /// Read the next element.
    pub fn read(&mut self) -> Result<Element<'a>, TlvError> {
        let start = self.pos;
        let rest = &self.buf[start..];
        let (tlv_type, type_len) = read_var_number(rest).ok_or(TlvError::Truncated)?;
        let (length, length_len) =
            read_var_number(&rest[type_len..]).ok_or(TlvError::Truncated)?;
        let header = type_len + length_len;
        let length = usize::try_from(length).map_err(|_| TlvError::Truncated)?;
        let end = header.checked_add(length).ok_or(TlvError::Truncated)?;
        if end > rest.len() {
            return Err(TlvError::Truncated);
        }
        self.pos = start + end;
        Ok(Element {
            tlv_type,
            value: &rest[header..end],
            wire: &rest[..end],
        })
    }

    /// Read the next element, requiring a specific type.
    pub fn expect(&mut self, tlv_type: u64) -> Result<Element<'a>, TlvError> {
        let element = self.read()?;
        if element.tlv_type != tlv_type {
            return Err(TlvError::UnexpectedType {
                expected: tlv_type,
                actual: element.tlv_type,
            });
        }
        Ok(element)
    }

    /// Read the next element only if it has the given type.
    pub fn read_if(&mut self, tlv_type: u64) -> Result<Option<Element<'a>>, TlvError> {
        if self.peek_type() == Some(tlv_type) {
            self.read().map(Some)
        } else {
            Ok(None)
        }
    }
}

/// Decode exactly one element spanning all of `bytes`.
pub fn decode_single(bytes: &[u8], tlv_type: u64) -> Result<Element<'_>, TlvError> {
    let mut reader = TlvReader::new(bytes);
    let element = reader.expect(tlv_type)?;
    if !reader.is_empty() {
        return Err(TlvError::Truncated);
    }
    Ok(element)
}
