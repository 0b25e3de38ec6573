//! Forwarder management commands.
//!
//! Every command is a signed Interest named
//! `/localhost/nfd/<module>/<verb>/<ControlParameters>`, answered by a Data
//! packet whose content is a ControlResponse.

use std::sync::Arc;
use std::time::Duration;

use prefix_request_core::lp::NackReason;
use prefix_request_core::mgmt::{
    face_flags, route_origin, status, ControlParameters, ControlResponse, MgmtError,
};
use prefix_request_core::{Interest, Name, RegistrationRequest};

use crate::face::{Face, FaceError, Reply};
use crate::keychain::KeyChain;
use crate::registrar::{RegistrationFailure, RegistrationFuture, RouteManager};

/// Lifetime of management command Interests.
pub const COMMAND_INTEREST_LIFETIME: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    /// The forwarder answered with a non-success status.
    #[error("command rejected: {code} {text}")]
    Rejected { code: u32, text: String },

    #[error("command Interest was Nacked: {0:?}")]
    Nacked(NackReason),

    #[error("undecodable ControlResponse: {0}")]
    BadResponse(#[from] MgmtError),

    #[error(transparent)]
    Face(#[from] FaceError),
}

impl ControllerError {
    /// Status code reported for this failure.
    ///
    /// Forwarder rejections keep their own code. Local failures map onto
    /// the client-side codes the forwarder's tools use.
    #[must_use]
    pub fn status_code(&self) -> u32 {
        match self {
            Self::Rejected { code, .. } => *code,
            Self::Nacked(_) => status::ERROR_NACK,
            Self::BadResponse(_) | Self::Face(_) => status::ERROR_SERVER,
        }
    }
}

/// Issues management commands over a [`Face`].
#[derive(Clone)]
pub struct Controller {
    face: Face,
    keychain: Arc<KeyChain>,
}

impl Controller {
    pub fn new(face: Face, keychain: Arc<KeyChain>) -> Self {
        Self { face, keychain }
    }

    /// Ask the forwarder to attach IncomingFaceId to packets it sends us.
    pub async fn enable_local_fields(&self) -> Result<ControlParameters, ControllerError> {
        let params = ControlParameters {
            flags: Some(face_flags::LOCAL_FIELDS_ENABLED),
            mask: Some(face_flags::LOCAL_FIELDS_ENABLED),
            ..ControlParameters::default()
        };
        self.execute("faces", "update", &params).await
    }

    /// Route Interests under `prefix` to this application's face.
    pub async fn register_prefix(&self, prefix: &Name) -> Result<Name, ControllerError> {
        let params = ControlParameters {
            name: Some(prefix.clone()),
            origin: Some(route_origin::APP),
            ..ControlParameters::default()
        };
        let body = self.execute("rib", "register", &params).await?;
        Ok(body.name.unwrap_or_else(|| prefix.clone()))
    }

    /// Install the route described by `request`.
    ///
    /// Returns the name the forwarder registered, or the requested name if
    /// the response carried no parameters.
    pub async fn register_route(
        &self,
        request: &RegistrationRequest,
    ) -> Result<Name, ControllerError> {
        let params = ControlParameters {
            name: Some(request.prefix.clone()),
            face_id: Some(request.face_id),
            origin: Some(request.origin),
            cost: Some(request.cost),
            ..ControlParameters::default()
        };
        let body = self.execute("rib", "register", &params).await?;
        Ok(body.name.unwrap_or_else(|| request.prefix.clone()))
    }

    async fn execute(
        &self,
        module: &str,
        verb: &str,
        params: &ControlParameters,
    ) -> Result<ControlParameters, ControllerError> {
        let mut interest = Interest::new(params.command_name(module, verb));
        interest.lifetime = Some(COMMAND_INTEREST_LIFETIME);
        self.keychain.sign_interest(&mut interest);

        tracing::debug!(module, verb, "Sending management command");

        let data = match self.face.express_interest(interest).await? {
            Reply::Data(data) => data,
            Reply::Nack(reason) => return Err(ControllerError::Nacked(reason)),
        };

        let response = ControlResponse::wire_decode(&data.content)?;
        if !response.is_success() {
            return Err(ControllerError::Rejected {
                code: response.status_code,
                text: response.status_text,
            });
        }
        Ok(response.body.unwrap_or_default())
    }
}

impl RouteManager for Controller {
    fn start_registration(&self, request: RegistrationRequest) -> RegistrationFuture {
        let controller = self.clone();
        Box::pin(async move {
            controller
                .register_route(&request)
                .await
                .map_err(|e| RegistrationFailure {
                    code: e.status_code(),
                    detail: e.to_string(),
                })
        })
    }
}
