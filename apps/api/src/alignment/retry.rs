//! Retry coordinator: repeats a fallible attempt under transient failure.
//!
//! States: `Idle → Attempting(n) → {Success, Failed(n), RateLimited, AuthRejected}`.
//!
//! - Before attempt `n > 0` the coordinator sleeps `2^n` backoff units (2s, 4s with the
//!   default policy). No jitter.
//! - Rate limits, decode/schema failures and transient provider errors are retried while
//!   `n < max_attempts - 1`.
//! - Credential problems end the loop at once, whatever `n` is.
//!
//! The sleep is a tokio timer, so waiting never blocks other requests.

use std::future::Future;
use std::time::Duration;

use tracing::{info, warn};

use crate::alignment::error::{AlignmentError, AttemptError};
use crate::llm_client::GenerationError;

pub const MAX_ATTEMPTS: u32 = 3;
pub const BACKOFF_UNIT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            backoff_unit: BACKOFF_UNIT,
        }
    }
}

impl RetryPolicy {
    /// Wait inserted before attempt `attempt` (0-based). The first attempt never waits.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            Duration::ZERO
        } else {
            self.backoff_unit * 2u32.saturating_pow(attempt)
        }
    }

    /// Whether a retryable failure on `attempt` may be followed by another attempt.
    pub fn can_retry(&self, attempt: u32) -> bool {
        attempt + 1 < self.max_attempts
    }
}

/// Classified result of one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    ParseFailure,
    RateLimited,
    AuthInvalid,
    MissingCredential,
    OtherTransient,
}

impl AttemptOutcome {
    pub fn of(err: &AttemptError) -> Self {
        match err {
            AttemptError::Generation(GenerationError::MissingCredential) => {
                AttemptOutcome::MissingCredential
            }
            AttemptError::Generation(GenerationError::Auth { .. }) => AttemptOutcome::AuthInvalid,
            AttemptError::Generation(GenerationError::RateLimit { .. }) => {
                AttemptOutcome::RateLimited
            }
            AttemptError::Generation(GenerationError::Transient(_)) => {
                AttemptOutcome::OtherTransient
            }
            AttemptError::Decode(_) | AttemptError::Schema(_) => AttemptOutcome::ParseFailure,
        }
    }
}

/// Record of one attempt. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentAttempt {
    pub index: u32,
    pub wait: Duration,
    pub outcome: AttemptOutcome,
}

/// A successful value plus the attempts it took.
#[derive(Debug)]
pub struct Retried<T> {
    pub value: T,
    pub attempts: Vec<AlignmentAttempt>,
}

/// Runs `attempt_fn` until it succeeds or the policy gives up.
///
/// `attempt_fn` receives the 0-based attempt index.
pub async fn run_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    mut attempt_fn: F,
) -> Result<Retried<T>, AlignmentError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, AttemptError>>,
{
    let mut attempts = Vec::with_capacity(policy.max_attempts as usize);
    let mut index = 0;

    loop {
        let wait = policy.delay_before(index);
        if !wait.is_zero() {
            info!(
                "Retry attempt {}/{}, waiting {}ms",
                index + 1,
                policy.max_attempts,
                wait.as_millis()
            );
            tokio::time::sleep(wait).await;
        }

        let err = match attempt_fn(index).await {
            Ok(value) => {
                attempts.push(AlignmentAttempt {
                    index,
                    wait,
                    outcome: AttemptOutcome::Success,
                });
                return Ok(Retried { value, attempts });
            }
            Err(err) => err,
        };

        let outcome = AttemptOutcome::of(&err);
        attempts.push(AlignmentAttempt {
            index,
            wait,
            outcome,
        });
        warn!("Attempt {} failed ({:?}): {}", index + 1, outcome, err);

        if outcome == AttemptOutcome::MissingCredential {
            return Err(AlignmentError::Config);
        }
        if let AttemptError::Generation(GenerationError::Auth { message, .. }) = err {
            return Err(AlignmentError::AuthRejected { message });
        }
        if policy.can_retry(index) {
            index += 1;
            continue;
        }

        return Err(if outcome == AttemptOutcome::RateLimited {
            AlignmentError::RateLimited {
                attempts: index + 1,
            }
        } else {
            AlignmentError::Failed {
                attempts: index + 1,
                last: err,
            }
        });
    }
}
