//! # Prefix-request core
//!
//! Pure protocol types for the prefix-request daemon.
//!
//! ## Design Principles
//!
//! This crate is intentionally **IO-free**:
//! - No filesystem operations
//! - No network calls
//! - No clocks
//!
//! The actual IO (forwarder socket, signing, outcome log) lives in
//! `prefix-request-daemon`.
//!
//! ## Modules
//!
//! - [`tlv`] - NDN TLV primitives
//! - [`name`] - Names, URI parsing and canonical printing
//! - [`canonical`] - Strict acceptance of textual prefix claims
//! - [`packet`] - Interest and Data
//! - [`lp`] - NDNLPv2 link-layer fields
//! - [`mgmt`] - Forwarder management commands and responses
//! - [`command`] - Prefix-request command syntax
//! - [`registration`] - Registration requests and outcomes

pub mod canonical;
pub mod command;
pub mod lp;
pub mod mgmt;
pub mod name;
pub mod packet;
pub mod registration;
pub mod tlv;

pub use canonical::{canonicalize, CanonicalError};
pub use command::{listen_prefix, Command, CommandError};
pub use name::{Component, Name, NameError};
pub use packet::{Data, Interest, Packet, SignatureInfo};
pub use registration::{
    OutcomeStatus, RegistrationOutcome, RegistrationRequest, RouteSettings,
};
