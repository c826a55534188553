use crate::task::FetchOptions;
use crate::RetryHint;
use std::time::Duration;

/// What happens to a failed attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    Retry {
        options: FetchOptions,
        delay: Duration,
    },
    Abandon,
}

/// Decides the next attempt of a failed task
///
/// Escalating to headless rendering only happens once: an extraction that
/// still fails with rendering on is abandoned. Backoff grows linearly with
/// the attempt number.
pub fn next_attempt(
    options: &FetchOptions,
    hint: RetryHint,
    attempt: u32,
    max_retries: u32,
    base_delay: Duration,
) -> RetryDecision {
    if attempt >= max_retries {
        return RetryDecision::Abandon;
    }

    match hint {
        RetryHint::Abandon => RetryDecision::Abandon,
        RetryHint::EscalateRender if options.headless_render => RetryDecision::Abandon,
        RetryHint::EscalateRender => RetryDecision::Retry {
            options: options.escalated_render(),
            delay: Duration::ZERO,
        },
        RetryHint::RotateIdentity => RetryDecision::Retry {
            options: options.rotated_identity(),
            delay: base_delay,
        },
        RetryHint::Backoff => RetryDecision::Retry {
            options: options.clone(),
            delay: base_delay * (attempt + 1),
        },
    }
}
