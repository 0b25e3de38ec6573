//! Route registration requests and their terminal outcomes.

use std::fmt;

use crate::name::Name;

/// Route origin identifying routes installed by this protocol.
pub const ROUTE_ORIGIN_PREFIX_REQUEST: u64 = 19438;

/// Cost of routes installed by this protocol.
pub const ROUTE_COST: u64 = 800;

/// Logged status of a successful registration.
pub const STATUS_SUCCESS: u32 = 0;

/// Logged status of a command whose proof did not verify.
pub const STATUS_AUTH_FAILED: u32 = 8401;

/// Fixed attributes of every route this daemon installs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteSettings {
    pub origin: u64,
    pub cost: u64,
}

impl Default for RouteSettings {
    fn default() -> Self {
        Self {
            origin: ROUTE_ORIGIN_PREFIX_REQUEST,
            cost: ROUTE_COST,
        }
    }
}

/// A route to install: `prefix` via `face_id`.
///
/// Only constructed after the command's proof has verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationRequest {
    pub prefix: Name,
    pub face_id: u64,
    pub origin: u64,
    pub cost: u64,
}

impl RegistrationRequest {
    #[must_use]
    pub fn new(prefix: Name, face_id: u64, settings: RouteSettings) -> Self {
        Self {
            prefix,
            face_id,
            origin: settings.origin,
            cost: settings.cost,
        }
    }
}

/// How processing of one command ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    /// The route was installed.
    Registered,
    /// The proof did not verify.
    AuthFailed,
    /// The forwarder refused or could not be asked; carries its code.
    RegisterFailed(u32),
}

impl OutcomeStatus {
    /// Status code as written to the outcome log.
    #[must_use]
    pub fn code(self) -> u32 {
        match self {
            Self::Registered => STATUS_SUCCESS,
            Self::AuthFailed => STATUS_AUTH_FAILED,
            Self::RegisterFailed(code) => code,
        }
    }
}

/// Terminal result of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationOutcome {
    pub status: OutcomeStatus,
    pub face_id: u64,
    pub prefix: Name,
}

impl RegistrationOutcome {
    #[must_use]
    pub fn new(status: OutcomeStatus, face_id: u64, prefix: Name) -> Self {
        Self {
            status,
            face_id,
            prefix,
        }
    }

    /// Render the outcome log record for `timestamp` (Unix seconds).
    #[must_use]
    pub fn record(&self, timestamp: i64) -> OutcomeRecord<'_> {
        OutcomeRecord {
            timestamp,
            outcome: self,
        }
    }
}

/// One tab-separated outcome log line, without the trailing newline.
///
/// `<unix-timestamp>\t<status-code>\t<face-id>\t<prefix-uri>`
#[derive(Debug, Clone, Copy)]
pub struct OutcomeRecord<'a> {
    timestamp: i64,
    outcome: &'a RegistrationOutcome,
}

impl fmt::Display for OutcomeRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}",
            self.timestamp,
            self.outcome.status.code(),
            self.outcome.face_id,
            self.outcome.prefix
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefix() -> Name {
        Name::from_uri("/a/b").unwrap()
    }

    #[test]
    fn test_request_uses_settings() {
        let request = RegistrationRequest::new(prefix(), 262, RouteSettings::default());

        assert_eq!(request.origin, 19438);
        assert_eq!(request.cost, 800);
        assert_eq!(request.face_id, 262);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(OutcomeStatus::Registered.code(), 0);
        assert_eq!(OutcomeStatus::AuthFailed.code(), 8401);
        assert_eq!(OutcomeStatus::RegisterFailed(403).code(), 403);
    }

    #[test]
    fn test_record_format() {
        let success = RegistrationOutcome::new(OutcomeStatus::Registered, 262, prefix());
        let denied = RegistrationOutcome::new(OutcomeStatus::AuthFailed, 262, prefix());
        let refused = RegistrationOutcome::new(OutcomeStatus::RegisterFailed(403), 7, prefix());

        assert_eq!(success.record(1_700_000_000).to_string(), "1700000000\t0\t262\t/a/b");
        assert_eq!(denied.record(1_700_000_000).to_string(), "1700000000\t8401\t262\t/a/b");
        assert_eq!(refused.record(5).to_string(), "5\t403\t7\t/a/b");
    }

    #[test]
    fn test_record_prints_canonical_prefix() {
        let odd = RegistrationOutcome::new(
            OutcomeStatus::Registered,
            1,
            Name::new().with("hello world"),
        );

        assert_eq!(odd.record(0).to_string(), "0\t0\t1\t/hello%20world");
    }
}
