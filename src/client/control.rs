//! Per-call cancellation and deadline.

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::{Error, Result};

/// Cancellation signal plus optional deadline for one invocation.
///
/// Cloning shares the token, so a clone kept by the caller can cancel a call
/// that is already in flight.
#[derive(Debug, Clone, Default)]
pub struct CallControl {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CallControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Request cancellation of every operation observing this control.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fails fast if the call was cancelled or its deadline already passed.
    pub fn check(&self) -> Result<()> {
        if self.token.is_cancelled() {
            return Err(Error::cancelled("cancellation requested"));
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(Error::cancelled("deadline exceeded"));
            }
        }
        Ok(())
    }

    /// Resolves with the reason once the call must stop.
    async fn stopped(&self) -> Error {
        match self.deadline {
            Some(deadline) => tokio::select! {
                _ = self.token.cancelled() => Error::cancelled("cancellation requested"),
                _ = tokio::time::sleep_until(deadline) => Error::cancelled("deadline exceeded"),
            },
            None => {
                self.token.cancelled().await;
                Error::cancelled("cancellation requested")
            }
        }
    }

    /// Race `fut` against cancellation and the deadline.
    pub async fn run<F, T>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.check()?;
        tokio::select! {
            biased;
            err = self.stopped() => Err(err),
            out = fut => out,
        }
    }
}
