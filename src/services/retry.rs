use std::future::Future;

use tokio::time::{sleep, Duration};
use tracing::warn;

/// Whether a failed attempt should be retried.
pub enum Classification {
    Transient,
    Permanent,
}

/// Runs `attempt` up to `max_retries` additional times on top of the first
/// try, sleeping `1s, 2s, 4s, ...` between attempts. `classify` decides
/// whether a given error is worth retrying; a permanent error returns
/// immediately without sleeping.
pub async fn call_with_retries<T, E, F, Fut>(
    operation: &str,
    max_retries: u32,
    classify: impl Fn(&E) -> Classification,
    mut attempt: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut backoff = Duration::from_secs(1);

    for attempt_number in 0..=max_retries {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                let is_last = attempt_number == max_retries;
                match classify(&err) {
                    Classification::Permanent => {
                        warn!("{} failed permanently: {}", operation, err);
                        return Err(err);
                    }
                    Classification::Transient if is_last => {
                        warn!(
                            "{} failed after {} attempts: {}",
                            operation,
                            attempt_number + 1,
                            err
                        );
                        return Err(err);
                    }
                    Classification::Transient => {
                        warn!(
                            "{} attempt {} failed, retrying in {:?}: {}",
                            operation,
                            attempt_number + 1,
                            backoff,
                            err
                        );
                        sleep(backoff).await;
                        backoff *= 2;
                    }
                }
            }
        }
    }

    unreachable!("loop always returns on the last iteration")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[tokio::test]
    async fn retries_transient_errors_until_success() {
        let calls = Cell::new(0);
        let result: Result<i32, &str> = call_with_retries(
            "test",
            3,
            |_: &&str| Classification::Transient,
            || {
                calls.set(calls.get() + 1);
                async move {
                    if calls.get() < 3 {
                        Err("transient")
                    } else {
                        Ok(42)
                    }
                }
            },
        )
        .await;

        assert_eq!(result, Ok(42));
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn permanent_errors_stop_immediately() {
        let calls = Cell::new(0);
        let result: Result<i32, &str> = call_with_retries(
            "test",
            5,
            |_: &&str| Classification::Permanent,
            || {
                calls.set(calls.get() + 1);
                async move { Err("nope") }
            },
        )
        .await;

        assert_eq!(result, Err("nope"));
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let calls = Cell::new(0);
        let result: Result<i32, &str> = call_with_retries(
            "test",
            2,
            |_: &&str| Classification::Transient,
            || {
                calls.set(calls.get() + 1);
                async move { Err("still failing") }
            },
        )
        .await;

        assert_eq!(result, Err("still failing"));
        assert_eq!(calls.get(), 3);
    }
}
