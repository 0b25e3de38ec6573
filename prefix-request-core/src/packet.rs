//! Interest and Data packets.
//!
//! Only the fields this daemon reads or writes are modelled. Unknown
//! non-critical elements are skipped on decode; unknown critical ones are
//! rejected.

use std::time::Duration;

use sha2::{Digest, Sha256};

use crate::name::{Component, Name, NameError};
use crate::tlv::{self, types, TlvError, TlvReader};

/// `ForwardingHint`, accepted and ignored.
const FORWARDING_HINT: u64 = 0x1e;

/// Signature type numbers.
pub mod signature_type {
    pub const SIGNATURE_ED25519: u64 = 5;
}

/// Errors raised while decoding a packet.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum PacketError {
    #[error(transparent)]
    Tlv(#[from] TlvError),

    #[error(transparent)]
    Name(#[from] NameError),

    /// The outer type is neither Interest nor Data.
    #[error("not a network-layer packet (type {0})")]
    UnknownPacketType(u64),

    /// Nonce must be exactly four bytes.
    #[error("invalid Nonce length {0}")]
    BadNonce(usize),
}

/// SignatureInfo / InterestSignatureInfo contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureInfo {
    pub signature_type: u64,
    pub key_locator: Option<Name>,
    /// Interest signatures only.
    pub nonce: Option<Vec<u8>>,
    /// Interest signatures only; milliseconds since the Unix epoch.
    pub time: Option<u64>,
}

impl SignatureInfo {
    #[must_use]
    pub fn new(signature_type: u64, key_locator: Option<Name>) -> Self {
        Self {
            signature_type,
            key_locator,
            nonce: None,
            time: None,
        }
    }

    /// Encode as `outer_type` (SignatureInfo or InterestSignatureInfo).
    #[must_use]
    pub fn encode(&self, outer_type: u64) -> Vec<u8> {
        let mut value = Vec::new();
        tlv::write_non_negative_integer(&mut value, types::SIGNATURE_TYPE, self.signature_type);
        if let Some(locator) = &self.key_locator {
            tlv::write_tlv(&mut value, types::KEY_LOCATOR, &locator.wire_encode());
        }
        if let Some(nonce) = &self.nonce {
            tlv::write_tlv(&mut value, types::SIGNATURE_NONCE, nonce);
        }
        if let Some(time) = self.time {
            tlv::write_non_negative_integer(&mut value, types::SIGNATURE_TIME, time);
        }
        tlv::encode_tlv(outer_type, &value)
    }

    /// Decode the value of a SignatureInfo element.
    ///
    /// # Errors
    ///
    /// Returns an error if SignatureType is missing or an element is malformed.
    pub fn decode_value(value: &[u8]) -> Result<Self, PacketError> {
        let mut reader = TlvReader::new(value);
        let signature_type =
            tlv::decode_non_negative_integer(reader.expect(types::SIGNATURE_TYPE)?.value)?;
        let mut info = Self::new(signature_type, None);
        while !reader.is_empty() {
            let element = reader.read()?;
            match element.tlv_type {
                types::KEY_LOCATOR => {
                    // KeyDigest locators are tolerated but not kept
                    let mut inner = TlvReader::new(element.value);
                    if let Some(name) = inner.read_if(types::NAME)? {
                        info.key_locator = Some(Name::decode_value(name.value)?);
                    }
                }
                types::SIGNATURE_NONCE => info.nonce = Some(element.value.to_vec()),
                types::SIGNATURE_TIME => {
                    info.time = Some(tlv::decode_non_negative_integer(element.value)?);
                }
                _ => {}
            }
        }
        Ok(info)
    }
}

/// An Interest packet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Interest {
    pub name: Name,
    pub can_be_prefix: bool,
    pub must_be_fresh: bool,
    pub nonce: Option<[u8; 4]>,
    pub lifetime: Option<Duration>,
    pub hop_limit: Option<u8>,
    pub application_parameters: Option<Vec<u8>>,
    pub signature_info: Option<SignatureInfo>,
    pub signature_value: Option<Vec<u8>>,
}

impl Interest {
    #[must_use]
    pub fn new(name: Name) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }

    /// Encode the full Interest TLV.
    #[must_use]
    pub fn wire_encode(&self) -> Vec<u8> {
        let mut value = self.name.wire_encode();
        if self.can_be_prefix {
            tlv::write_tlv(&mut value, types::CAN_BE_PREFIX, &[]);
        }
        if self.must_be_fresh {
            tlv::write_tlv(&mut value, types::MUST_BE_FRESH, &[]);
        }
        if let Some(nonce) = &self.nonce {
            tlv::write_tlv(&mut value, types::NONCE, nonce);
        }
        if let Some(lifetime) = self.lifetime {
            let millis = u64::try_from(lifetime.as_millis()).unwrap_or(u64::MAX);
            tlv::write_non_negative_integer(&mut value, types::INTEREST_LIFETIME, millis);
        }
        if let Some(hop_limit) = self.hop_limit {
            tlv::write_tlv(&mut value, types::HOP_LIMIT, &[hop_limit]);
        }
        value.extend_from_slice(&self.parameters_block());
        tlv::encode_tlv(types::INTEREST, &value)
    }

    /// Decode a full Interest TLV.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed TLV, an invalid name, or an unknown
    /// critical element.
    pub fn wire_decode(wire: &[u8]) -> Result<Self, PacketError> {
        let element = tlv::decode_single(wire, types::INTEREST)?;
        let mut reader = TlvReader::new(element.value);
        let name = Name::decode_value(reader.expect(types::NAME)?.value)?;
        let mut interest = Self::new(name);

        while !reader.is_empty() {
            let element = reader.read()?;
            match element.tlv_type {
                types::CAN_BE_PREFIX => interest.can_be_prefix = true,
                types::MUST_BE_FRESH => interest.must_be_fresh = true,
                FORWARDING_HINT => {}
                types::NONCE => {
                    let nonce: [u8; 4] = element
                        .value
                        .try_into()
                        .map_err(|_| PacketError::BadNonce(element.value.len()))?;
                    interest.nonce = Some(nonce);
                }
                types::INTEREST_LIFETIME => {
                    let millis = tlv::decode_non_negative_integer(element.value)?;
                    interest.lifetime = Some(Duration::from_millis(millis));
                }
                types::HOP_LIMIT => interest.hop_limit = element.value.first().copied(),
                types::APPLICATION_PARAMETERS => {
                    interest.application_parameters = Some(element.value.to_vec());
                }
                types::INTEREST_SIGNATURE_INFO => {
                    interest.signature_info = Some(SignatureInfo::decode_value(element.value)?);
                }
                types::INTEREST_SIGNATURE_VALUE => {
                    interest.signature_value = Some(element.value.to_vec());
                }
                other if tlv::is_critical(other) => {
                    return Err(TlvError::UnrecognizedCritical(other).into());
                }
                _ => {}
            }
        }
        Ok(interest)
    }

    /// ApplicationParameters through InterestSignatureValue, as encoded.
    fn parameters_block(&self) -> Vec<u8> {
        let mut block = Vec::new();
        if let Some(params) = &self.application_parameters {
            tlv::write_tlv(&mut block, types::APPLICATION_PARAMETERS, params);
        }
        if let Some(info) = &self.signature_info {
            block.extend_from_slice(&info.encode(types::INTEREST_SIGNATURE_INFO));
        }
        if let Some(sig) = &self.signature_value {
            tlv::write_tlv(&mut block, types::INTEREST_SIGNATURE_VALUE, sig);
        }
        block
    }

    /// Bytes covered by an Interest signature.
    ///
    /// Name components other than the ParametersSha256DigestComponent,
    /// followed by ApplicationParameters and InterestSignatureInfo.
    #[must_use]
    pub fn signed_portion(&self) -> Vec<u8> {
        let mut portion = Vec::new();
        for component in self.name.components() {
            if component.tlv_type() != types::PARAMETERS_SHA256_DIGEST_COMPONENT {
                component.encode_into(&mut portion);
            }
        }
        if let Some(params) = &self.application_parameters {
            tlv::write_tlv(&mut portion, types::APPLICATION_PARAMETERS, params);
        }
        if let Some(info) = &self.signature_info {
            portion.extend_from_slice(&info.encode(types::INTEREST_SIGNATURE_INFO));
        }
        portion
    }

    /// Recompute the ParametersSha256DigestComponent from the current
    /// parameters block and place it at the end of the name.
    ///
    /// Does nothing when the Interest carries no ApplicationParameters.
    pub fn update_parameters_digest(&mut self) {
        if self.application_parameters.is_none() {
            return;
        }
        let digest: [u8; 32] = Sha256::digest(self.parameters_block()).into();
        let components = self
            .name
            .components()
            .iter()
            .filter(|c| c.tlv_type() != types::PARAMETERS_SHA256_DIGEST_COMPONENT)
            .cloned()
            .chain(std::iter::once(Component::params_digest(digest)))
            .collect();
        self.name = Name::from_components(components);
    }
}

/// A Data packet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Data {
    pub name: Name,
    pub content_type: Option<u64>,
    pub freshness_period: Option<Duration>,
    pub content: Vec<u8>,
    pub signature_info: Option<SignatureInfo>,
    pub signature_value: Vec<u8>,
}

impl Data {
    #[must_use]
    pub fn new(name: Name, content: Vec<u8>) -> Self {
        Self {
            name,
            content,
            ..Self::default()
        }
    }

    fn meta_info(&self) -> Option<Vec<u8>> {
        if self.content_type.is_none() && self.freshness_period.is_none() {
            return None;
        }
        let mut value = Vec::new();
        if let Some(content_type) = self.content_type {
            tlv::write_non_negative_integer(&mut value, types::CONTENT_TYPE, content_type);
        }
        if let Some(freshness) = self.freshness_period {
            let millis = u64::try_from(freshness.as_millis()).unwrap_or(u64::MAX);
            tlv::write_non_negative_integer(&mut value, types::FRESHNESS_PERIOD, millis);
        }
        Some(tlv::encode_tlv(types::META_INFO, &value))
    }

    /// Name, MetaInfo, Content and SignatureInfo, as encoded.
    #[must_use]
    pub fn signed_portion(&self) -> Vec<u8> {
        let mut portion = self.name.wire_encode();
        if let Some(meta) = self.meta_info() {
            portion.extend_from_slice(&meta);
        }
        tlv::write_tlv(&mut portion, types::CONTENT, &self.content);
        if let Some(info) = &self.signature_info {
            portion.extend_from_slice(&info.encode(types::SIGNATURE_INFO));
        }
        portion
    }

    /// Encode the full Data TLV.
    #[must_use]
    pub fn wire_encode(&self) -> Vec<u8> {
        let mut value = self.signed_portion();
        tlv::write_tlv(&mut value, types::SIGNATURE_VALUE, &self.signature_value);
        tlv::encode_tlv(types::DATA, &value)
    }

    /// Decode a full Data TLV.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed TLV or an invalid name.
    pub fn wire_decode(wire: &[u8]) -> Result<Self, PacketError> {
        let element = tlv::decode_single(wire, types::DATA)?;
        let mut reader = TlvReader::new(element.value);
        let name = Name::decode_value(reader.expect(types::NAME)?.value)?;
        let mut data = Self::new(name, Vec::new());

        while !reader.is_empty() {
            let element = reader.read()?;
            match element.tlv_type {
                types::META_INFO => {
                    let mut meta = TlvReader::new(element.value);
                    while !meta.is_empty() {
                        let field = meta.read()?;
                        match field.tlv_type {
                            types::CONTENT_TYPE => {
                                data.content_type =
                                    Some(tlv::decode_non_negative_integer(field.value)?);
                            }
                            types::FRESHNESS_PERIOD => {
                                let millis = tlv::decode_non_negative_integer(field.value)?;
                                data.freshness_period = Some(Duration::from_millis(millis));
                            }
                            _ => {}
                        }
                    }
                }
                types::CONTENT => data.content = element.value.to_vec(),
                types::SIGNATURE_INFO => {
                    data.signature_info = Some(SignatureInfo::decode_value(element.value)?);
                }
                types::SIGNATURE_VALUE => data.signature_value = element.value.to_vec(),
                other if tlv::is_critical(other) => {
                    return Err(TlvError::UnrecognizedCritical(other).into());
                }
                _ => {}
            }
        }
        Ok(data)
    }
}

/// A decoded network-layer packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    Interest(Interest),
    Data(Data),
}

impl Packet {
    /// Decode an Interest or Data TLV.
    ///
    /// # Errors
    ///
    /// Returns an error for other packet types or malformed input.
    pub fn decode(wire: &[u8]) -> Result<Self, PacketError> {
        match TlvReader::new(wire).peek_type() {
            Some(types::INTEREST) => Interest::wire_decode(wire).map(Self::Interest),
            Some(types::DATA) => Data::wire_decode(wire).map(Self::Data),
            Some(other) => Err(PacketError::UnknownPacketType(other)),
            None => Err(TlvError::Truncated.into()),
        }
    }
}
