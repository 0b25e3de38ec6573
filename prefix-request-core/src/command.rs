//! Prefix-request command syntax.
//!
//! ```text
//! /localhop/prefix-request/<prefix-uri>/<proof>/<nonce>
//! ```
//!
//! - `prefix-uri`: canonical URI of the prefix being requested
//! - `proof`: `HEX_UPPER(SHA-256(secret || prefix-uri))`
//! - `nonce`: anything; makes each command Interest unique

use crate::name::Name;

/// Listening prefix for commands.
pub const LISTEN_PREFIX: [&str; 2] = ["localhop", "prefix-request"];

/// Total number of components in a well-formed command name.
pub const COMMAND_COMPONENTS: usize = 5;

const PREFIX_URI_INDEX: usize = 2;
const PROOF_INDEX: usize = 3;
const NONCE_INDEX: usize = 4;

/// Why an Interest is not a well-formed command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// The name does not have exactly five components.
    #[error("malformed command: expected {COMMAND_COMPONENTS} components, got {0}")]
    WrongComponentCount(usize),

    /// The name is not under the listening prefix.
    #[error("malformed command: not under the listening prefix")]
    OutsidePrefix,

    /// The transport did not attach the ingress face.
    #[error("command is missing the incoming face id")]
    MissingOrigin,
}

/// The listening prefix as a name.
#[must_use]
pub fn listen_prefix() -> Name {
    LISTEN_PREFIX
        .iter()
        .fold(Name::new(), |name, component| name.with(*component))
}

/// A structurally valid command.
///
/// Nothing about the arguments has been checked beyond their presence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    name: Name,
    face_id: u64,
}

impl Command {
    /// Check the shape of a received command.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError`] if the name has the wrong number of
    /// components, lies outside `listen_prefix`, or no ingress face id was
    /// attached.
    pub fn parse(
        name: &Name,
        incoming_face_id: Option<u64>,
        listen_prefix: &Name,
    ) -> Result<Self, CommandError> {
        if name.len() != COMMAND_COMPONENTS {
            return Err(CommandError::WrongComponentCount(name.len()));
        }
        if !listen_prefix.is_prefix_of(name) {
            return Err(CommandError::OutsidePrefix);
        }
        let face_id = incoming_face_id.ok_or(CommandError::MissingOrigin)?;
        Ok(Self {
            name: name.clone(),
            face_id,
        })
    }

    /// Full name of the command Interest.
    #[must_use]
    pub fn name(&self) -> &Name {
        &self.name
    }

    /// Face the command arrived on.
    #[must_use]
    pub fn face_id(&self) -> u64 {
        self.face_id
    }

    /// Raw bytes of the requested prefix URI.
    #[must_use]
    pub fn prefix_claim(&self) -> &[u8] {
        self.argument(PREFIX_URI_INDEX)
    }

    /// Raw bytes of the supplied proof.
    #[must_use]
    pub fn proof(&self) -> &[u8] {
        self.argument(PROOF_INDEX)
    }

    #[must_use]
    pub fn nonce(&self) -> &[u8] {
        self.argument(NONCE_INDEX)
    }

    fn argument(&self, index: usize) -> &[u8] {
        // parse() guarantees COMMAND_COMPONENTS components
        self.name.get(index).map(|c| c.value()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command_name(prefix_uri: &str, proof: &str) -> Name {
        listen_prefix().with(prefix_uri).with(proof).with("nonce")
    }

    #[test]
    fn test_listen_prefix() {
        assert_eq!(listen_prefix().to_uri(), "/localhop/prefix-request");
    }

    #[test]
    fn test_parse_well_formed() {
        let name = command_name("/a/b", "ABCD");
        let command = Command::parse(&name, Some(262), &listen_prefix()).unwrap();

        assert_eq!(command.prefix_claim(), b"/a/b");
        assert_eq!(command.proof(), b"ABCD");
        assert_eq!(command.nonce(), b"nonce");
        assert_eq!(command.face_id(), 262);
        assert_eq!(command.name(), &name);
    }

    #[test]
    fn test_parse_rejects_wrong_component_count() {
        let short = listen_prefix().with("/a/b").with("ABCD");
        let long = command_name("/a/b", "ABCD").with("extra");

        assert_eq!(
            Command::parse(&short, Some(1), &listen_prefix()),
            Err(CommandError::WrongComponentCount(4))
        );
        assert_eq!(
            Command::parse(&long, Some(1), &listen_prefix()),
            Err(CommandError::WrongComponentCount(6))
        );
        assert_eq!(
            Command::parse(&Name::new(), Some(1), &listen_prefix()),
            Err(CommandError::WrongComponentCount(0))
        );
    }

    #[test]
    fn test_parse_rejects_foreign_prefix() {
        let name = Name::new()
            .with("localhop")
            .with("other")
            .with("/a/b")
            .with("ABCD")
            .with("nonce");

        assert_eq!(
            Command::parse(&name, Some(1), &listen_prefix()),
            Err(CommandError::OutsidePrefix)
        );
    }

    #[test]
    fn test_parse_requires_origin() {
        let name = command_name("/a/b", "ABCD");

        assert_eq!(
            Command::parse(&name, None, &listen_prefix()),
            Err(CommandError::MissingOrigin)
        );
    }
}
