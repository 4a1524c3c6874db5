//! Long-running operation poller.
//!
//! # Design
//! - [`PollState`] is a pure state machine; the async loop only performs I/O and waits.
//! - Waits grow linearly: after the n-th pending answer the poller waits `base_delay * n`.
//! - The first check happens immediately and no wait follows the final check.
//! - Any failed check is fatal; only a pending answer keeps the loop going.

use std::time::Duration;

use reelsmith_telemetry::Metrics;
use tracing::{debug, warn};

use crate::error::{PollError, WorkflowError, WorkflowResult};
use crate::model::{AccessToken, OperationHandle, OperationPayload, PollResult};
use crate::service::{GenerationProvider, Sleeper};

/// Default delay unit between status checks.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(2_000);
/// Default number of status checks before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 15;

/// Retry schedule for status checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay unit; the wait after attempt `n` is `base_delay * n`.
    pub base_delay: Duration,
    /// Maximum number of status checks.
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            base_delay: DEFAULT_BASE_DELAY,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl PollPolicy {
    /// Build a policy from explicit values.
    #[must_use]
    pub const fn new(base_delay: Duration, max_attempts: u32) -> Self {
        Self {
            base_delay,
            max_attempts,
        }
    }

    /// Wait applied after the `attempt`-th pending answer.
    #[must_use]
    pub const fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }

    /// Upper bound on time spent waiting before the poller gives up.
    #[must_use]
    pub fn total_wait(&self) -> Duration {
        (1..self.max_attempts).fold(Duration::ZERO, |total, attempt| {
            total.saturating_add(self.delay_after(attempt))
        })
    }
}

/// Poller state after a number of status checks.
#[derive(Debug, Clone, PartialEq)]
pub enum PollState {
    /// Still waiting; `attempts` checks have been issued so far.
    Pending {
        /// Checks issued so far.
        attempts: u32,
    },
    /// The operation finished with a payload.
    Done {
        /// Terminal payload.
        payload: OperationPayload,
        /// Checks issued, including the final one.
        attempts: u32,
    },
    /// The attempt budget ran out while the operation was still pending.
    TimedOut {
        /// Checks issued.
        attempts: u32,
    },
}

impl PollState {
    /// State before the first check.
    #[must_use]
    pub const fn initial() -> Self {
        Self::Pending { attempts: 0 }
    }

    /// Fold the answer of one more check into the state.
    ///
    /// Terminal states are returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`PollError::Operation`] when the provider reports the operation as failed.
    pub fn advance(self, result: PollResult, policy: &PollPolicy) -> Result<Self, PollError> {
        let Self::Pending { attempts } = self else {
            return Ok(self);
        };
        let attempt = attempts.saturating_add(1);
        match result {
            PollResult::Done(payload) => Ok(Self::Done {
                payload,
                attempts: attempt,
            }),
            PollResult::Failed(failure) => Err(PollError::Operation {
                code: failure.code,
                message: failure.message,
            }),
            PollResult::Pending if attempt >= policy.max_attempts => {
                Ok(Self::TimedOut { attempts: attempt })
            }
            PollResult::Pending => Ok(Self::Pending { attempts: attempt }),
        }
    }
}

/// Terminal result of a poll loop that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The operation finished with a payload.
    Done {
        /// Terminal payload.
        payload: OperationPayload,
        /// Checks issued.
        attempts: u32,
    },
    /// The operation was still pending when the budget ran out.
    TimedOut {
        /// Checks issued.
        attempts: u32,
    },
}

/// Drives status checks for one operation until it reaches a terminal state.
pub struct OperationPoller<'a> {
    provider: &'a dyn GenerationProvider,
    sleeper: &'a dyn Sleeper,
    policy: PollPolicy,
    metrics: &'a Metrics,
}

impl<'a> OperationPoller<'a> {
    /// Assemble a poller over borrowed collaborators.
    #[must_use]
    pub fn new(
        provider: &'a dyn GenerationProvider,
        sleeper: &'a dyn Sleeper,
        policy: PollPolicy,
        metrics: &'a Metrics,
    ) -> Self {
        Self {
            provider,
            sleeper,
            policy,
            metrics,
        }
    }

    /// Poll `handle` until it finishes, fails, or exhausts the attempt budget.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Poll`] on the first failed check.
    pub async fn run(
        &self,
        handle: &OperationHandle,
        token: &AccessToken,
    ) -> WorkflowResult<PollOutcome> {
        let mut state = PollState::initial();
        loop {
            match state {
                PollState::Pending { attempts } => {
                    if attempts > 0 {
                        let delay = self.policy.delay_after(attempts);
                        debug!(
                            operation = %handle,
                            attempt = attempts,
                            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                            "operation pending; waiting before next check"
                        );
                        self.sleeper.sleep(delay).await;
                    }
                    let attempt = attempts.saturating_add(1);
                    self.metrics.inc_poll_attempt();
                    let result = self
                        .provider
                        .poll(handle, token)
                        .await
                        .map_err(|source| poll_failure(handle, attempt, source))?;
                    state = PollState::Pending { attempts }
                        .advance(result, &self.policy)
                        .map_err(|source| poll_failure(handle, attempt, source))?;
                }
                PollState::Done { payload, attempts } => {
                    debug!(operation = %handle, attempts, "operation finished");
                    return Ok(PollOutcome::Done { payload, attempts });
                }
                PollState::TimedOut { attempts } => {
                    let waited = self.policy.total_wait();
                    warn!(
                        operation = %handle,
                        attempts,
                        waited_ms = u64::try_from(waited.as_millis()).unwrap_or(u64::MAX),
                        "operation still pending after final check"
                    );
                    return Ok(PollOutcome::TimedOut { attempts });
                }
            }
        }
    }
}

fn poll_failure(handle: &OperationHandle, attempt: u32, source: PollError) -> WorkflowError {
    WorkflowError::Poll {
        operation: handle.to_string(),
        attempt,
        source,
    }
}
