//! Route registration on behalf of authenticated commands.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use prefix_request_core::{Name, RegistrationRequest};

/// Terminal failure of one registration attempt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("registration failed with {code}: {detail}")]
pub struct RegistrationFailure {
    /// Status code written to the outcome log.
    pub code: u32,
    pub detail: String,
}

/// Resolves to the registered name, or the failure code.
pub type RegistrationFuture =
    Pin<Box<dyn Future<Output = Result<Name, RegistrationFailure>> + Send + 'static>>;

/// The forwarder's route-installation operation.
pub trait RouteManager: Send + Sync + 'static {
    /// Begin installing `request`.
    ///
    /// The returned future must not borrow `self`; it may be polled long
    /// after the call returns.
    fn start_registration(&self, request: RegistrationRequest) -> RegistrationFuture;
}

/// Sole entry point for installing routes.
///
/// No retries: whatever the manager reports is final for that command.
#[derive(Clone)]
pub struct RouteRegistrar {
    manager: Arc<dyn RouteManager>,
}

impl RouteRegistrar {
    pub fn new(manager: Arc<dyn RouteManager>) -> Self {
        Self { manager }
    }

    pub fn register(&self, request: RegistrationRequest) -> RegistrationFuture {
        tracing::debug!(
            prefix = %request.prefix,
            face_id = request.face_id,
            origin = request.origin,
            cost = request.cost,
            "Registering route"
        );
        self.manager.start_registration(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prefix_request_core::RouteSettings;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingManager {
        requests: Mutex<Vec<RegistrationRequest>>,
    }

    impl RouteManager for RecordingManager {
        fn start_registration(&self, request: RegistrationRequest) -> RegistrationFuture {
            self.requests.lock().unwrap().push(request.clone());
            Box::pin(async move {
                if request.face_id == 0 {
                    Err(RegistrationFailure {
                        code: 403,
                        detail: "no face".into(),
                    })
                } else {
                    Ok(request.prefix)
                }
            })
        }
    }

    #[tokio::test]
    async fn test_register_forwards_request() {
        let manager = Arc::new(RecordingManager::default());
        let registrar = RouteRegistrar::new(manager.clone());
        let prefix = Name::from_uri("/a/b").unwrap();
        let request = RegistrationRequest::new(prefix.clone(), 262, RouteSettings::default());

        let result = registrar.register(request.clone()).await;

        assert_eq!(result, Ok(prefix));
        assert_eq!(*manager.requests.lock().unwrap(), vec![request]);
    }

    #[tokio::test]
    async fn test_register_reports_failure_once() {
        let manager = Arc::new(RecordingManager::default());
        let registrar = RouteRegistrar::new(manager.clone());
        let request =
            RegistrationRequest::new(Name::from_uri("/a").unwrap(), 0, RouteSettings::default());

        let result = registrar.register(request).await;

        assert_eq!(result.unwrap_err().code, 403);
        assert_eq!(manager.requests.lock().unwrap().len(), 1);
    }
}
