//! Command handling.
//!
//! The listener drives every received command through the same pipeline:
//! shape check, prefix canonicalization, proof verification, and finally
//! route registration. The synchronous stages run to completion as soon as
//! a command arrives. Registrations run concurrently in a [`JoinSet`] and
//! complete in whatever order the forwarder answers them.
//!
//! Malformed commands are dropped without a trace on the network or in the
//! outcome log. A wrong proof is logged but never answered. Only a
//! successful registration produces a reply.

use std::future::Future;
use std::sync::Arc;

use prefix_request_auth::{verify_proof, Secret};
use prefix_request_core::{
    canonicalize, listen_prefix, CanonicalError, Command, CommandError, Data, Name,
    OutcomeStatus, RegistrationOutcome, RegistrationRequest, RouteSettings,
};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::face::{Face, FaceError, IncomingInterest};
use crate::keychain::KeyChain;
use crate::outcome_log::OutcomeLogger;
use crate::registrar::{RegistrationFailure, RouteRegistrar};

/// Where replies go.
pub trait Transport: Send + Sync {
    fn send(&self, data: &Data) -> Result<(), FaceError>;
}

impl Transport for Face {
    fn send(&self, data: &Data) -> Result<(), FaceError> {
        self.put(data)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    /// The command channel closed; the forwarder connection is gone.
    #[error("transport closed")]
    TransportClosed,
}

/// Why a command was discarded without a log entry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DropReason {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Prefix(#[from] CanonicalError),
}

/// An authenticated command waiting on the forwarder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRegistration {
    /// Name of the command Interest, reused as the reply name.
    pub command: Name,
    pub request: RegistrationRequest,
}

/// Result of the synchronous stages for one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    Dropped(DropReason),
    AuthFailed(RegistrationOutcome),
    Registering(PendingRegistration),
}

struct Completion {
    pending: PendingRegistration,
    result: Result<Name, RegistrationFailure>,
}

pub struct CommandListener {
    secret: Secret,
    listen_prefix: Name,
    settings: RouteSettings,
    registrar: RouteRegistrar,
    transport: Arc<dyn Transport>,
    keychain: Arc<KeyChain>,
    logger: OutcomeLogger,
    registrations: JoinSet<Completion>,
}

impl CommandListener {
    pub fn new(
        secret: Secret,
        registrar: RouteRegistrar,
        transport: Arc<dyn Transport>,
        keychain: Arc<KeyChain>,
        logger: OutcomeLogger,
    ) -> Self {
        Self {
            secret,
            listen_prefix: listen_prefix(),
            settings: RouteSettings::default(),
            registrar,
            transport,
            keychain,
            logger,
            registrations: JoinSet::new(),
        }
    }

    #[must_use]
    pub fn with_listen_prefix(mut self, prefix: Name) -> Self {
        self.listen_prefix = prefix;
        self
    }

    #[must_use]
    pub fn with_route_settings(mut self, settings: RouteSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Number of registrations still waiting on the forwarder.
    pub fn outstanding(&self) -> usize {
        self.registrations.len()
    }

    /// Run the synchronous stages for one command.
    ///
    /// The proof is only checked once the shape and the prefix claim have
    /// been accepted.
    pub fn evaluate(&self, incoming: &IncomingInterest) -> Disposition {
        let command = match Command::parse(
            &incoming.interest.name,
            incoming.incoming_face_id,
            &self.listen_prefix,
        ) {
            Ok(command) => command,
            Err(e) => return Disposition::Dropped(e.into()),
        };

        let prefix = match canonicalize(command.prefix_claim()) {
            Ok(prefix) => prefix,
            Err(e) => return Disposition::Dropped(e.into()),
        };

        if !verify_proof(&self.secret, command.prefix_claim(), command.proof()) {
            return Disposition::AuthFailed(RegistrationOutcome::new(
                OutcomeStatus::AuthFailed,
                command.face_id(),
                prefix,
            ));
        }

        Disposition::Registering(PendingRegistration {
            command: command.name().clone(),
            request: RegistrationRequest::new(prefix, command.face_id(), self.settings),
        })
    }

    /// Handle one received command.
    pub fn on_command(&mut self, incoming: IncomingInterest) {
        match self.evaluate(&incoming) {
            Disposition::Dropped(reason) => {
                tracing::debug!(name = %incoming.interest.name, %reason, "Dropping command");
            }
            Disposition::AuthFailed(outcome) => {
                tracing::info!(
                    face_id = outcome.face_id,
                    prefix = %outcome.prefix,
                    "Rejected command with bad proof"
                );
                self.logger.log(&outcome);
            }
            Disposition::Registering(pending) => {
                let registration = self.registrar.register(pending.request.clone());
                self.registrations.spawn(async move {
                    Completion {
                        pending,
                        result: registration.await,
                    }
                });
            }
        }
    }

    fn on_completion(&mut self, completion: Completion) {
        let Completion { pending, result } = completion;
        let face_id = pending.request.face_id;

        match result {
            Ok(registered) => {
                let mut reply = Data::new(pending.command, registered.wire_encode());
                self.keychain.sign_data(&mut reply);
                if let Err(e) = self.transport.send(&reply) {
                    tracing::warn!(error = %e, "Failed to send reply");
                }
                tracing::info!(face_id, prefix = %registered, "Registered route");
                self.logger.log(&RegistrationOutcome::new(
                    OutcomeStatus::Registered,
                    face_id,
                    registered,
                ));
            }
            Err(failure) => {
                tracing::info!(
                    face_id,
                    prefix = %pending.request.prefix,
                    code = failure.code,
                    detail = %failure.detail,
                    "Route registration failed"
                );
                self.logger.log(&RegistrationOutcome::new(
                    OutcomeStatus::RegisterFailed(failure.code),
                    face_id,
                    pending.request.prefix,
                ));
            }
        }
    }

    /// Process commands and completions until `shutdown` resolves.
    ///
    /// Outstanding registrations are abandoned on shutdown.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::TransportClosed`] if `commands` closes.
    pub async fn run<F>(
        mut self,
        mut commands: mpsc::Receiver<IncomingInterest>,
        shutdown: F,
    ) -> Result<(), ListenerError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        tracing::info!(prefix = %self.listen_prefix, "Listening for commands");

        loop {
            tokio::select! {
                biased;

                () = &mut shutdown => {
                    tracing::info!(outstanding = self.outstanding(), "Listener stopping");
                    return Ok(());
                }

                Some(joined) = self.registrations.join_next(), if !self.registrations.is_empty() => {
                    match joined {
                        Ok(completion) => self.on_completion(completion),
                        Err(e) => tracing::warn!(error = %e, "Registration task failed"),
                    }
                }

                incoming = commands.recv() => match incoming {
                    Some(incoming) => self.on_command(incoming),
                    None => return Err(ListenerError::TransportClosed),
                },
            }
        }
    }
}
