//! NDNLPv2 link-protocol framing.
//!
//! The forwarder wraps packets in an `LpPacket` when it has link-layer
//! fields to attach. The ones this daemon consumes are `IncomingFaceId`
//! (present once local fields are enabled on the face) and `Nack`.

use crate::packet::{Packet, PacketError};
use crate::tlv::{self, types, TlvError, TlvReader};

const LP_SEQUENCE: u64 = 0x51;
const LP_FRAG_INDEX: u64 = 0x52;
const LP_FRAG_COUNT: u64 = 0x53;

/// Errors raised while decoding a link-layer frame.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum LpError {
    #[error(transparent)]
    Tlv(#[from] TlvError),

    #[error(transparent)]
    Packet(#[from] PacketError),

    /// A fragment of a larger packet; reassembly is not supported.
    #[error("fragmented LpPacket ({0} fragments) is not supported")]
    Fragmented(u64),

    /// A Nack without an Interest fragment.
    #[error("Nack must carry an Interest")]
    NackWithoutInterest,
}

/// Reason carried in a Nack header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NackReason {
    None,
    Congestion,
    Duplicate,
    NoRoute,
    Other(u64),
}

impl From<u64> for NackReason {
    fn from(code: u64) -> Self {
        match code {
            0 => Self::None,
            50 => Self::Congestion,
            100 => Self::Duplicate,
            150 => Self::NoRoute,
            other => Self::Other(other),
        }
    }
}

impl NackReason {
    #[must_use]
    pub fn code(self) -> u64 {
        match self {
            Self::None => 0,
            Self::Congestion => 50,
            Self::Duplicate => 100,
            Self::NoRoute => 150,
            Self::Other(code) => code,
        }
    }
}

/// A network-layer packet plus the link-layer fields that came with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub packet: Packet,
    pub incoming_face_id: Option<u64>,
    pub nack: Option<NackReason>,
}

/// LpPacket header types in 800..=959 whose two low bits are zero may be
/// ignored when unrecognized.
fn is_ignorable_header(tlv_type: u64) -> bool {
    (types::LP_HEADER_FIRST..=types::LP_HEADER_LAST).contains(&tlv_type) && tlv_type & 0x03 == 0
}

/// Decode one frame as received from the forwarder.
///
/// Bare Interest/Data packets are accepted as-is. Returns `Ok(None)` for an
/// `LpPacket` without a fragment (an idle packet).
///
/// # Errors
///
/// Returns an error on malformed input or unsupported link-layer features.
pub fn decode_frame(wire: &[u8]) -> Result<Option<Frame>, LpError> {
    if TlvReader::new(wire).peek_type() != Some(types::LP_PACKET) {
        return Ok(Some(Frame {
            packet: Packet::decode(wire)?,
            incoming_face_id: None,
            nack: None,
        }));
    }

    let element = tlv::decode_single(wire, types::LP_PACKET)?;
    let mut reader = TlvReader::new(element.value);
    let mut incoming_face_id = None;
    let mut nack = None;
    let mut fragment = None;

    while !reader.is_empty() {
        let field = reader.read()?;
        match field.tlv_type {
            types::LP_FRAGMENT => fragment = Some(field.value),
            types::LP_INCOMING_FACE_ID => {
                incoming_face_id = Some(tlv::decode_non_negative_integer(field.value)?);
            }
            types::LP_NACK => {
                let mut inner = TlvReader::new(field.value);
                let reason = match inner.read_if(types::LP_NACK_REASON)? {
                    Some(reason) => tlv::decode_non_negative_integer(reason.value)?,
                    None => 0,
                };
                nack = Some(NackReason::from(reason));
            }
            LP_SEQUENCE | LP_FRAG_INDEX => {}
            LP_FRAG_COUNT => {
                let count = tlv::decode_non_negative_integer(field.value)?;
                if count > 1 {
                    return Err(LpError::Fragmented(count));
                }
            }
            other if is_ignorable_header(other) => {}
            other => return Err(TlvError::UnrecognizedCritical(other).into()),
        }
    }

    let Some(fragment) = fragment else {
        return Ok(None);
    };
    let packet = Packet::decode(fragment)?;
    if nack.is_some() && !matches!(packet, Packet::Interest(_)) {
        return Err(LpError::NackWithoutInterest);
    }
    Ok(Some(Frame {
        packet,
        incoming_face_id,
        nack,
    }))
}

/// Wrap an encoded packet in an `LpPacket` with optional header fields.
#[must_use]
pub fn encode_frame(
    packet_wire: &[u8],
    incoming_face_id: Option<u64>,
    nack: Option<NackReason>,
) -> Vec<u8> {
    let mut value = Vec::new();
    if let Some(reason) = nack {
        let inner = tlv::encode_tlv(
            types::LP_NACK_REASON,
            &tlv::encode_non_negative_integer(reason.code()),
        );
        tlv::write_tlv(&mut value, types::LP_NACK, &inner);
    }
    if let Some(face_id) = incoming_face_id {
        tlv::write_non_negative_integer(&mut value, types::LP_INCOMING_FACE_ID, face_id);
    }
    tlv::write_tlv(&mut value, types::LP_FRAGMENT, packet_wire);
    tlv::encode_tlv(types::LP_PACKET, &value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::Name;
    use crate::packet::{Data, Interest};

    fn interest_wire() -> Vec<u8> {
        Interest::new(Name::from_uri("/localhop/prefix-request/x").unwrap()).wire_encode()
    }

    #[test]
    fn test_bare_packet_has_no_link_fields() {
        let frame = decode_frame(&interest_wire()).unwrap().unwrap();
        assert!(matches!(frame.packet, Packet::Interest(_)));
        assert_eq!(frame.incoming_face_id, None);
        assert_eq!(frame.nack, None);
    }

    #[test]
    fn test_incoming_face_id_extracted() {
        let wire = encode_frame(&interest_wire(), Some(262), None);
        let frame = decode_frame(&wire).unwrap().unwrap();
        assert_eq!(frame.incoming_face_id, Some(262));
    }

    #[test]
    fn test_nack_extracted() {
        let wire = encode_frame(&interest_wire(), None, Some(NackReason::NoRoute));
        let frame = decode_frame(&wire).unwrap().unwrap();
        assert_eq!(frame.nack, Some(NackReason::NoRoute));
    }

    #[test]
    fn test_nack_on_data_rejected() {
        let data = Data::new(Name::from_uri("/a").unwrap(), Vec::new()).wire_encode();
        let wire = encode_frame(&data, None, Some(NackReason::Congestion));
        assert_eq!(decode_frame(&wire), Err(LpError::NackWithoutInterest));
    }

    #[test]
    fn test_idle_packet() {
        let wire = tlv::encode_tlv(types::LP_PACKET, &[]);
        assert_eq!(decode_frame(&wire), Ok(None));
    }

    #[test]
    fn test_ignorable_and_critical_headers() {
        let mut value = Vec::new();
        tlv::write_tlv(&mut value, 0x0348, &[1]); // 840, ignorable
        tlv::write_tlv(&mut value, types::LP_FRAGMENT, &interest_wire());
        let wire = tlv::encode_tlv(types::LP_PACKET, &value);
        assert!(decode_frame(&wire).unwrap().is_some());

        let mut value = Vec::new();
        tlv::write_tlv(&mut value, 0x0349, &[1]); // 841, critical
        tlv::write_tlv(&mut value, types::LP_FRAGMENT, &interest_wire());
        let wire = tlv::encode_tlv(types::LP_PACKET, &value);
        assert_eq!(
            decode_frame(&wire),
            Err(LpError::Tlv(TlvError::UnrecognizedCritical(0x0349)))
        );
    }

    #[test]
    fn test_fragmented_rejected() {
        let mut value = Vec::new();
        tlv::write_non_negative_integer(&mut value, LP_FRAG_COUNT, 2);
        tlv::write_tlv(&mut value, types::LP_FRAGMENT, &[0x05]);
        let wire = tlv::encode_tlv(types::LP_PACKET, &value);
        assert_eq!(decode_frame(&wire), Err(LpError::Fragmented(2)));
    }
}
