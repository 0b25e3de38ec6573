//! # Prefix-request daemon
//!
//! Listens on `/localhop/prefix-request` for commands of the form
//!
//! ```text
//! /localhop/prefix-request/<prefix-uri>/<proof>/<nonce>
//! ```
//!
//! and, when the proof shows knowledge of the shared secret, asks the local
//! forwarder to route `<prefix-uri>` toward the face the command came from.
//! Each terminal outcome is written to stdout as
//! `<timestamp>\t<status>\t<face-id>\t<prefix>`.
//!
//! ## Modules
//!
//! - [`face`] - Unix socket connection to the forwarder
//! - [`controller`] - Signed management commands
//! - [`keychain`] - Ed25519 signing of replies and commands
//! - [`registrar`] - Route registration seam
//! - [`outcome_log`] - Outcome records on stdout
//! - [`listener`] - Command pipeline and event loop

pub mod args;
pub mod config;
pub mod controller;
pub mod face;
pub mod framing;
pub mod keychain;
pub mod listener;
pub mod outcome_log;
pub mod registrar;
pub mod run;

pub use face::{Face, FaceError, IncomingInterest, Reply};
pub use keychain::KeyChain;
pub use listener::{CommandListener, Disposition, DropReason, PendingRegistration, Transport};
pub use outcome_log::OutcomeLogger;
pub use registrar::{RegistrationFailure, RegistrationFuture, RouteManager, RouteRegistrar};
