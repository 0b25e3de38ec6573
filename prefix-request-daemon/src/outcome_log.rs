//! Tab-separated record of every terminal command outcome.
//!
//! This is the daemon's only persistent output and goes to stdout, one line
//! per outcome. Diagnostics go through `tracing` on stderr instead.

use std::io::{self, Write};

use prefix_request_core::RegistrationOutcome;

pub struct OutcomeLogger {
    sink: Box<dyn Write + Send>,
}

impl OutcomeLogger {
    pub fn new(sink: Box<dyn Write + Send>) -> Self {
        Self { sink }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    /// Record `outcome` at the current time.
    pub fn log(&mut self, outcome: &RegistrationOutcome) {
        self.log_at(chrono::Utc::now().timestamp(), outcome);
    }

    /// Record `outcome` at `timestamp` (Unix seconds).
    ///
    /// Write failures are traced and otherwise ignored.
    pub fn log_at(&mut self, timestamp: i64, outcome: &RegistrationOutcome) {
        let line = outcome.record(timestamp);
        let written = writeln!(self.sink, "{line}").and_then(|()| self.sink.flush());
        if let Err(e) = written {
            tracing::warn!(error = %e, record = %line, "Failed to write outcome log");
        }
    }
}

impl std::fmt::Debug for OutcomeLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutcomeLogger").finish_non_exhaustive()
    }
}
