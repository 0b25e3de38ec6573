//! Forwarder management protocol messages.
//!
//! A management command is an Interest named
//! `/localhost/nfd/<module>/<verb>/<ControlParameters>`; the forwarder
//! answers with Data whose content is a [`ControlResponse`].

use crate::name::{Component, Name, NameError};
use crate::tlv::{self, types, TlvError, TlvReader};

/// Prefix of all local forwarder management commands.
pub const LOCALHOST_NFD: [&str; 2] = ["localhost", "nfd"];

/// Status codes produced by the management client itself when the
/// forwarder's answer is missing or unusable.
pub mod status {
    /// The command succeeded.
    pub const OK: u32 = 200;
    /// The response could not be decoded.
    pub const ERROR_SERVER: u32 = 500;
    /// No response arrived within the Interest lifetime.
    pub const ERROR_TIMEOUT: u32 = 10060;
    /// The command Interest was Nacked.
    pub const ERROR_NACK: u32 = 10800;
}

/// Bit positions in a face's Flags field.
pub mod face_flags {
    pub const LOCAL_FIELDS_ENABLED: u64 = 1 << 0;
}

/// Well-known route origins.
pub mod route_origin {
    pub const APP: u64 = 0;
}

/// Errors raised while decoding management messages.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum MgmtError {
    #[error(transparent)]
    Tlv(#[from] TlvError),

    #[error(transparent)]
    Name(#[from] NameError),

    /// StatusText was not UTF-8.
    #[error("status text is not UTF-8")]
    BadStatusText,
}

/// Parameters of a management command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlParameters {
    pub name: Option<Name>,
    pub face_id: Option<u64>,
    pub origin: Option<u64>,
    pub cost: Option<u64>,
    pub flags: Option<u64>,
    pub mask: Option<u64>,
    pub expiration_period: Option<u64>,
}

impl ControlParameters {
    /// Encode as a ControlParameters TLV.
    #[must_use]
    pub fn wire_encode(&self) -> Vec<u8> {
        let mut value = Vec::new();
        if let Some(name) = &self.name {
            value.extend_from_slice(&name.wire_encode());
        }
        let fields = [
            (types::FACE_ID, self.face_id),
            (types::ORIGIN, self.origin),
            (types::COST, self.cost),
            (types::FLAGS, self.flags),
            (types::MASK, self.mask),
            (types::EXPIRATION_PERIOD, self.expiration_period),
        ];
        for (tlv_type, field) in fields {
            if let Some(number) = field {
                tlv::write_non_negative_integer(&mut value, tlv_type, number);
            }
        }
        tlv::encode_tlv(types::CONTROL_PARAMETERS, &value)
    }

    /// Decode the value of a ControlParameters TLV.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed fields.
    pub fn decode_value(value: &[u8]) -> Result<Self, MgmtError> {
        let mut params = Self::default();
        let mut reader = TlvReader::new(value);
        while !reader.is_empty() {
            let element = reader.read()?;
            match element.tlv_type {
                types::NAME => params.name = Some(Name::decode_value(element.value)?),
                types::FACE_ID => params.face_id = Some(integer(element.value)?),
                types::ORIGIN => params.origin = Some(integer(element.value)?),
                types::COST => params.cost = Some(integer(element.value)?),
                types::FLAGS => params.flags = Some(integer(element.value)?),
                types::MASK => params.mask = Some(integer(element.value)?),
                types::EXPIRATION_PERIOD => {
                    params.expiration_period = Some(integer(element.value)?);
                }
                _ => {}
            }
        }
        Ok(params)
    }

    /// Name of the command Interest for `module`/`verb`, before signing.
    #[must_use]
    pub fn command_name(&self, module: &str, verb: &str) -> Name {
        let mut name = Name::new();
        for component in LOCALHOST_NFD {
            name = name.with(component);
        }
        name.with(module)
            .with(verb)
            .with(self.wire_encode())
    }
}

fn integer(value: &[u8]) -> Result<u64, TlvError> {
    tlv::decode_non_negative_integer(value)
}

/// The forwarder's answer to a management command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlResponse {
    pub status_code: u32,
    pub status_text: String,
    pub body: Option<ControlParameters>,
}

impl ControlResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status_code == status::OK
    }

    /// Encode as a ControlResponse TLV.
    #[must_use]
    pub fn wire_encode(&self) -> Vec<u8> {
        let mut value = Vec::new();
        tlv::write_non_negative_integer(
            &mut value,
            types::STATUS_CODE,
            u64::from(self.status_code),
        );
        tlv::write_tlv(&mut value, types::STATUS_TEXT, self.status_text.as_bytes());
        if let Some(body) = &self.body {
            value.extend_from_slice(&body.wire_encode());
        }
        tlv::encode_tlv(types::CONTROL_RESPONSE, &value)
    }

    /// Decode a ControlResponse TLV, typically a Data packet's content.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLV is malformed.
    pub fn wire_decode(wire: &[u8]) -> Result<Self, MgmtError> {
        let element = tlv::decode_single(wire, types::CONTROL_RESPONSE)?;
        let mut reader = TlvReader::new(element.value);
        let code = integer(reader.expect(types::STATUS_CODE)?.value)?;
        let status_code = u32::try_from(code).unwrap_or(u32::MAX);
        let status_text = String::from_utf8(reader.expect(types::STATUS_TEXT)?.value.to_vec())
            .map_err(|_| MgmtError::BadStatusText)?;
        let body = match reader.read_if(types::CONTROL_PARAMETERS)? {
            Some(body) => Some(ControlParameters::decode_value(body.value)?),
            None => None,
        };
        Ok(Self {
            status_code,
            status_text,
            body,
        })
    }
}

/// Whether `component` is an encoded ControlParameters block.
#[must_use]
pub fn is_parameters_component(component: &Component) -> bool {
    TlvReader::new(component.value()).peek_type() == Some(types::CONTROL_PARAMETERS)
}
