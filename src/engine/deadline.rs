//! Cooperative per-unit deadlines.

use std::time::{Duration, Instant};

use super::error::{EngineError, EngineResult};

/// Point in time after which a unit's analysis is abandoned.
///
/// Checked between statements and between candidates, so a pathological
/// unit stops at the next check after expiry.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    expires_at: Option<Instant>,
}

impl Deadline {
    /// A deadline that never expires.
    pub fn none() -> Self {
        Self {
            started: Instant::now(),
            expires_at: None,
        }
    }

    /// A deadline `timeout` from now.
    pub fn after(timeout: Duration) -> Self {
        let started = Instant::now();
        Self {
            started,
            expires_at: started.checked_add(timeout),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }

    /// Time left, `None` when unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|at| at.saturating_duration_since(Instant::now()))
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Fail with [`EngineError::Timeout`] once expired.
    ///
    /// The error carries no path; the unit boundary fills it in.
    pub fn check(&self) -> EngineResult<()> {
        if self.is_expired() {
            return Err(EngineError::Timeout {
                path: String::new(),
                elapsed_ms: u64::try_from(self.elapsed().as_millis()).unwrap_or(u64::MAX),
            });
        }
        Ok(())
    }
}

impl Default for Deadline {
    fn default() -> Self {
        Self::none()
    }
}
