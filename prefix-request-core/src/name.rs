//! Hierarchical NDN names.
//!
//! A [`Name`] is a sequence of typed [`Component`]s. Its textual form is the
//! NDN URI: `/`-separated components, percent-escaped, with typed components
//! written as `<type>=<value>`. Segment, byte offset, version, timestamp and
//! sequence number components use their labelled decimal form instead
//! (`seg=3`, `v=5`). [`Name::to_uri`] always produces the canonical
//! form; [`Name::from_uri`] is lenient (scheme, authority, trailing slash,
//! unnecessary escapes are accepted), which is why callers that authenticate
//! a textual name must compare the canonical form against their input.

use std::fmt;
use std::str::FromStr;

use crate::tlv::{self, types, TlvError, TlvReader};

/// Length of a SHA-256 digest component value.
const DIGEST_LEN: usize = 32;

const IMPLICIT_DIGEST_PREFIX: &str = "sha256digest=";
const PARAMS_DIGEST_PREFIX: &str = "params-sha256=";

/// Component types written as `<label>=<decimal>`.
const DECIMAL_LABELS: [(u64, &str); 5] = [
    (types::SEGMENT_NAME_COMPONENT, "seg"),
    (types::BYTE_OFFSET_NAME_COMPONENT, "off"),
    (types::VERSION_NAME_COMPONENT, "v"),
    (types::TIMESTAMP_NAME_COMPONENT, "t"),
    (types::SEQUENCE_NUM_NAME_COMPONENT, "seq"),
];

/// Errors raised while building a name from URI or wire form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum NameError {
    /// A component consisting only of periods had fewer than three.
    #[error("name component cannot be \".\" or \"..\" (or empty)")]
    IllegalPeriods,

    /// A digest component did not carry 32 bytes.
    #[error("digest component must be {DIGEST_LEN} bytes, got {0}")]
    BadDigestLength(usize),

    /// A digest component's hex text was invalid.
    #[error("digest component is not valid hex")]
    BadDigestHex,

    /// A labelled component's text was not a plain decimal number.
    #[error("invalid number in name component: {0:?}")]
    InvalidNumber(String),

    /// A component type outside 1..=65535.
    #[error("invalid name component type {0}")]
    InvalidType(u64),

    /// The wire encoding was malformed.
    #[error("malformed name encoding: {0}")]
    Tlv(#[from] TlvError),
}

/// One typed name component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Component {
    tlv_type: u64,
    value: Vec<u8>,
}

impl Component {
    /// Create a component of an arbitrary type.
    ///
    /// # Errors
    ///
    /// Returns an error if the type is outside 1..=65535 or a digest
    /// component has the wrong length.
    pub fn new(tlv_type: u64, value: impl Into<Vec<u8>>) -> Result<Self, NameError> {
        let value = value.into();
        if tlv_type == 0 || tlv_type > u64::from(u16::MAX) {
            return Err(NameError::InvalidType(tlv_type));
        }
        if is_digest_type(tlv_type) && value.len() != DIGEST_LEN {
            return Err(NameError::BadDigestLength(value.len()));
        }
        Ok(Self { tlv_type, value })
    }

    /// Create a GenericNameComponent.
    #[must_use]
    pub fn generic(value: impl Into<Vec<u8>>) -> Self {
        Self {
            tlv_type: types::GENERIC_NAME_COMPONENT,
            value: value.into(),
        }
    }

    /// Create a ParametersSha256DigestComponent.
    #[must_use]
    pub fn params_digest(digest: [u8; DIGEST_LEN]) -> Self {
        Self {
            tlv_type: types::PARAMETERS_SHA256_DIGEST_COMPONENT,
            value: digest.to_vec(),
        }
    }

    #[must_use]
    pub fn tlv_type(&self) -> u64 {
        self.tlv_type
    }

    #[must_use]
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    #[must_use]
    pub fn is_generic(&self) -> bool {
        self.tlv_type == types::GENERIC_NAME_COMPONENT
    }

    /// Append this component's TLV to `buf`.
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        tlv::write_tlv(buf, self.tlv_type, &self.value);
    }

    /// Parse one URI-escaped component.
    ///
    /// # Errors
    ///
    /// See [`NameError`].
    pub fn from_escaped(input: &str) -> Result<Self, NameError> {
        if let Some(hex_text) = input.strip_prefix(IMPLICIT_DIGEST_PREFIX) {
            return Self::digest_from_hex(types::IMPLICIT_SHA256_DIGEST_COMPONENT, hex_text);
        }
        if let Some(hex_text) = input.strip_prefix(PARAMS_DIGEST_PREFIX) {
            return Self::digest_from_hex(types::PARAMETERS_SHA256_DIGEST_COMPONENT, hex_text);
        }

        if let Some((label, text)) = input.split_once('=') {
            if let Some(tlv_type) = decimal_type(label) {
                return Self::number_from_decimal(tlv_type, text);
            }
        }

        let (tlv_type, text) = match input.split_once('=') {
            Some((number, rest))
                if !number.is_empty() && number.bytes().all(|b| b.is_ascii_digit()) =>
            {
                let tlv_type = number
                    .parse::<u64>()
                    .map_err(|_| NameError::InvalidType(u64::MAX))?;
                (tlv_type, rest)
            }
            _ => (types::GENERIC_NAME_COMPONENT, input),
        };

        let mut value = unescape(text);
        if value.iter().all(|&b| b == b'.') {
            if value.len() < 3 {
                return Err(NameError::IllegalPeriods);
            }
            value.drain(..3);
        }
        Self::new(tlv_type, value)
    }

    /// Leading zeros and signs are rejected so the text round-trips.
    fn number_from_decimal(tlv_type: u64, text: &str) -> Result<Self, NameError> {
        let number = text
            .parse::<u64>()
            .ok()
            .filter(|n| n.to_string() == text)
            .ok_or_else(|| NameError::InvalidNumber(text.to_string()))?;
        Self::new(tlv_type, tlv::encode_non_negative_integer(number))
    }

    /// The value as a NonNegativeInteger, if this is a labelled type.
    fn labelled_number(&self) -> Option<(&'static str, u64)> {
        let label = decimal_label(self.tlv_type)?;
        let number = tlv::decode_non_negative_integer(&self.value).ok()?;
        Some((label, number))
    }

    fn digest_from_hex(tlv_type: u64, hex_text: &str) -> Result<Self, NameError> {
        let digest = hex::decode(hex_text).map_err(|_| NameError::BadDigestHex)?;
        Self::new(tlv_type, digest)
    }

    /// Write the canonical URI form of this component.
    fn write_uri(&self, out: &mut String) {
        if let Some((label, number)) = self.labelled_number() {
            out.push_str(label);
            out.push('=');
            out.push_str(&number.to_string());
            return;
        }
        match self.tlv_type {
            types::IMPLICIT_SHA256_DIGEST_COMPONENT => {
                out.push_str(IMPLICIT_DIGEST_PREFIX);
                out.push_str(&hex::encode(&self.value));
            }
            types::PARAMETERS_SHA256_DIGEST_COMPONENT => {
                out.push_str(PARAMS_DIGEST_PREFIX);
                out.push_str(&hex::encode(&self.value));
            }
            other => {
                if other != types::GENERIC_NAME_COMPONENT {
                    out.push_str(&other.to_string());
                    out.push('=');
                }
                if self.value.iter().all(|&b| b == b'.') {
                    out.push_str("...");
                }
                escape_into(&self.value, out);
            }
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.write_uri(&mut out);
        f.write_str(&out)
    }
}

fn is_digest_type(tlv_type: u64) -> bool {
    tlv_type == types::IMPLICIT_SHA256_DIGEST_COMPONENT
        || tlv_type == types::PARAMETERS_SHA256_DIGEST_COMPONENT
}

fn decimal_type(label: &str) -> Option<u64> {
    DECIMAL_LABELS
        .iter()
        .find(|(_, l)| *l == label)
        .map(|(tlv_type, _)| *tlv_type)
}

fn decimal_label(tlv_type: u64) -> Option<&'static str> {
    DECIMAL_LABELS
        .iter()
        .find(|(t, _)| *t == tlv_type)
        .map(|(_, label)| *label)
}

fn is_unreserved(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~')
}

fn escape_into(value: &[u8], out: &mut String) {
    const HEX_UPPER: &[u8; 16] = b"0123456789ABCDEF";
    for &b in value {
        if is_unreserved(b) {
            out.push(b as char);
        } else {
            out.push('%');
            out.push(HEX_UPPER[usize::from(b >> 4)] as char);
            out.push(HEX_UPPER[usize::from(b & 0x0f)] as char);
        }
    }
}

/// Percent-decode. Malformed `%` sequences are kept literally.
fn unescape(text: &str) -> Vec<u8> {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hi = (bytes[i + 1] as char).to_digit(16);
            let lo = (bytes[i + 2] as char).to_digit(16);
            if let (Some(hi), Some(lo)) = (hi, lo) {
                out.push((hi * 16 + lo) as u8);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    out
}

/// An NDN name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name {
    components: Vec<Component>,
}

impl Name {
    /// The empty name `/`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_components(components: Vec<Component>) -> Self {
        Self { components }
    }

    /// Parse an NDN URI.
    ///
    /// An optional scheme such as `ndn:` and an optional `//authority` are
    /// stripped before the components are split on `/`.
    ///
    /// # Errors
    ///
    /// Returns an error if any component is invalid.
    pub fn from_uri(uri: &str) -> Result<Self, NameError> {
        let mut rest = uri;

        if let Some(colon) = rest.find(':') {
            if rest.find('/').map_or(true, |slash| colon < slash) {
                rest = &rest[colon + 1..];
            }
        }

        if let Some(stripped) = rest.strip_prefix("//") {
            match stripped.find('/') {
                Some(end) => rest = &stripped[end + 1..],
                None => return Ok(Self::new()),
            }
        } else if let Some(stripped) = rest.strip_prefix('/') {
            rest = stripped;
        }

        let mut name = Self::new();
        let mut start = 0;
        while start < rest.len() {
            let end = rest[start..].find('/').map_or(rest.len(), |i| start + i);
            name.push(Component::from_escaped(&rest[start..end])?);
            start = end + 1;
        }
        Ok(name)
    }

    /// Canonical URI form.
    #[must_use]
    pub fn to_uri(&self) -> String {
        if self.components.is_empty() {
            return "/".to_string();
        }
        let mut out = String::new();
        for component in &self.components {
            out.push('/');
            component.write_uri(&mut out);
        }
        out
    }

    pub fn push(&mut self, component: Component) {
        self.components.push(component);
    }

    /// Builder-style append of a generic component.
    #[must_use]
    pub fn with(mut self, value: impl Into<Vec<u8>>) -> Self {
        self.push(Component::generic(value));
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Component> {
        self.components.get(index)
    }

    #[must_use]
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Whether every component of `self` begins `other`.
    #[must_use]
    pub fn is_prefix_of(&self, other: &Name) -> bool {
        self.components.len() <= other.components.len()
            && self
                .components
                .iter()
                .zip(&other.components)
                .all(|(a, b)| a == b)
    }

    /// Concatenated component TLVs, without the outer Name header.
    #[must_use]
    pub fn encode_value(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        for component in &self.components {
            component.encode_into(&mut buf);
        }
        buf
    }

    /// Full Name TLV.
    #[must_use]
    pub fn wire_encode(&self) -> Vec<u8> {
        tlv::encode_tlv(types::NAME, &self.encode_value())
    }

    /// Decode a complete Name TLV.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed TLV or invalid components.
    pub fn wire_decode(wire: &[u8]) -> Result<Self, NameError> {
        let element = tlv::decode_single(wire, types::NAME)?;
        Self::decode_value(element.value)
    }

    /// Decode the value part of a Name TLV.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed TLV or invalid components.
    pub fn decode_value(value: &[u8]) -> Result<Self, NameError> {
        let mut reader = TlvReader::new(value);
        let mut name = Self::new();
        while !reader.is_empty() {
            let element = reader.read()?;
            name.push(Component::new(element.tlv_type, element.value)?);
        }
        Ok(name)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uri())
    }
}

impl FromStr for Name {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_uri(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_uri() {
        let name = Name::from_uri("/a/b").unwrap();
        assert_eq!(name.len(), 2);
        assert_eq!(name.get(0).unwrap().value(), b"a");
        assert_eq!(name.get(1).unwrap().value(), b"b");
        assert_eq!(name.to_uri(), "/a/b");
    }

    #[test]
    fn test_empty_name() {
        assert_eq!(Name::from_uri("/").unwrap(), Name::new());
        assert_eq!(Name::from_uri("").unwrap(), Name::new());
        assert_eq!(Name::new().to_uri(), "/");
    }

    #[test]
    fn test_scheme_and_authority_are_stripped() {
        let expected = Name::new().with("a").with("b");
        assert_eq!(Name::from_uri("ndn:/a/b").unwrap(), expected);
        assert_eq!(Name::from_uri("ndn://authority/a/b").unwrap(), expected);
        assert_eq!(Name::from_uri("a/b").unwrap(), expected);
    }

    #[test]
    fn test_trailing_slash_is_ignored() {
        assert_eq!(Name::from_uri("/a/b/").unwrap().to_uri(), "/a/b");
    }

    #[test]
    fn test_percent_escapes() {
        let name = Name::from_uri("/hello%20world/%41").unwrap();
        assert_eq!(name.get(0).unwrap().value(), b"hello world");
        assert_eq!(name.get(1).unwrap().value(), b"A");
        assert_eq!(name.to_uri(), "/hello%20world/A");
    }

    #[test]
    fn test_escape_uses_uppercase_hex() {
        let name = Name::new().with(vec![0xab, b'/', b'x']);
        assert_eq!(name.to_uri(), "/%AB%2Fx");
    }

    #[test]
    fn test_malformed_escape_kept_literally() {
        let name = Name::from_uri("/a%zz/%4").unwrap();
        assert_eq!(name.get(0).unwrap().value(), b"a%zz");
        assert_eq!(name.get(1).unwrap().value(), b"%4");
        assert_eq!(name.to_uri(), "/a%25zz/%254");
    }

    #[test]
    fn test_period_components() {
        assert_eq!(Name::from_uri("/a/./b"), Err(NameError::IllegalPeriods));
        assert_eq!(Name::from_uri("/a/../b"), Err(NameError::IllegalPeriods));
        assert_eq!(Name::from_uri("/a//b"), Err(NameError::IllegalPeriods));

        let name = Name::from_uri("/a/.../....").unwrap();
        assert_eq!(name.get(1).unwrap().value(), b"");
        assert_eq!(name.get(2).unwrap().value(), b".");
        assert_eq!(name.to_uri(), "/a/.../....");
    }

    #[test]
    fn test_typed_components() {
        let name = Name::from_uri("/a/100=%00").unwrap();
        assert_eq!(name.get(1).unwrap().tlv_type(), 100);
        assert_eq!(name.get(1).unwrap().value(), &[0x00]);
        assert_eq!(name.to_uri(), "/a/100=%00");

        // type 8 is generic, so the prefix disappears when printed
        assert_eq!(Name::from_uri("/8=a").unwrap().to_uri(), "/a");
        assert_eq!(Name::from_uri("/0=a"), Err(NameError::InvalidType(0)));
        assert_eq!(
            Name::from_uri("/65536=a"),
            Err(NameError::InvalidType(65536))
        );
    }

    #[test]
    fn test_labelled_decimal_components() {
        let name = Name::from_uri("/a/seg=3/off=0/v=5/t=1700000000000/seq=300").unwrap();
        assert_eq!(name.get(1).unwrap().tlv_type(), types::SEGMENT_NAME_COMPONENT);
        assert_eq!(name.get(1).unwrap().value(), &[3]);
        assert_eq!(name.get(3).unwrap().tlv_type(), types::VERSION_NAME_COMPONENT);
        assert_eq!(name.get(5).unwrap().value(), &[0x01, 0x2c]);
        assert_eq!(name.to_uri(), "/a/seg=3/off=0/v=5/t=1700000000000/seq=300");
    }

    #[test]
    fn test_numeric_type_prints_labelled_form() {
        assert_eq!(Name::from_uri("/a/54=%05").unwrap().to_uri(), "/a/v=5");
        assert_eq!(Name::from_uri("/a/50=%00%07").unwrap().to_uri(), "/a/seg=7");
        // not a NonNegativeInteger width, so the numeric form stays
        assert_eq!(Name::from_uri("/a/54=abc").unwrap().to_uri(), "/a/54=abc");
    }

    #[test]
    fn test_labelled_component_requires_plain_decimal() {
        for uri in ["/v=", "/v=x", "/seg=-1", "/seg=+1", "/seg=01", "/v=18446744073709551616"] {
            assert!(
                matches!(Name::from_uri(uri), Err(NameError::InvalidNumber(_))),
                "{uri} should be rejected"
            );
        }
    }

    #[test]
    fn test_non_numeric_equals_is_generic() {
        let name = Name::from_uri("/k=v").unwrap();
        assert!(name.get(0).unwrap().is_generic());
        assert_eq!(name.to_uri(), "/k%3Dv");
    }

    #[test]
    fn test_digest_components() {
        let hex_digest = "28bad4b5275bd392dbb670c75cf0b66f13f7942b21e80f55c0e86b374753a548";
        let uri = format!("/a/sha256digest={hex_digest}");
        let name = Name::from_uri(&uri).unwrap();
        assert_eq!(
            name.get(1).unwrap().tlv_type(),
            types::IMPLICIT_SHA256_DIGEST_COMPONENT
        );
        assert_eq!(name.to_uri(), uri);

        assert_eq!(
            Name::from_uri("/params-sha256=00"),
            Err(NameError::BadDigestLength(1))
        );
        assert_eq!(
            Name::from_uri("/sha256digest=zz"),
            Err(NameError::BadDigestHex)
        );
    }

    #[test]
    fn test_wire_encoding() {
        let name = Name::new().with("a").with("bc");
        let wire = name.wire_encode();
        assert_eq!(wire, vec![0x07, 0x07, 0x08, 0x01, b'a', 0x08, 0x02, b'b', b'c']);
        assert_eq!(Name::wire_decode(&wire).unwrap(), name);
    }

    #[test]
    fn test_wire_decode_rejects_bad_component_type() {
        let wire = [0x07, 0x03, 0x00, 0x01, b'a'];
        assert_eq!(Name::wire_decode(&wire), Err(NameError::InvalidType(0)));
    }

    #[test]
    fn test_is_prefix_of() {
        let prefix = Name::from_uri("/localhop/prefix-request").unwrap();
        let command = Name::from_uri("/localhop/prefix-request/x/y/z").unwrap();

        assert!(prefix.is_prefix_of(&command));
        assert!(prefix.is_prefix_of(&prefix));
        assert!(!command.is_prefix_of(&prefix));
        assert!(Name::new().is_prefix_of(&prefix));
    }
}
