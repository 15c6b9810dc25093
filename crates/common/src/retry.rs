//! Retrying fallible async operations.
//!
//! A [`Strategy`] looks at each failure and the number of retries already made and answers with
//! a [`RetryAction`]. [`retry_with`] keeps regenerating the operation until it succeeds, the
//! strategy stops it, or the retry budget is spent.

use std::{fmt, future::Future, sync::Arc, time::Duration};

/// Decides what to do about a failure, given the retries made so far.
pub type ErrorHandler<E> = Arc<dyn Fn(&E, usize) -> RetryAction + Send + Sync>;

/// What [`retry_with`] does after a failure.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum RetryAction {
    /// Wait this long, then run the operation again.
    Retry(Duration),

    /// Give up and return the failure.
    Stop,
}

/// A retry policy: a failure classifier plus an optional retry budget.
#[derive(Clone)]
pub struct Strategy<E> {
    on_error: ErrorHandler<E>,
    max_retries: Option<usize>,
}

impl<E> fmt::Debug for Strategy<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Strategy")
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl<E> Strategy<E> {
    /// Creates an unbounded strategy that consults `on_error` after every failure.
    pub fn new<F>(on_error: F) -> Self
    where
        F: Fn(&E, usize) -> RetryAction + Send + Sync + 'static,
    {
        Self {
            on_error: Arc::new(on_error),
            max_retries: None,
        }
    }

    /// Retries every failure after `delay`.
    pub fn fixed_delay(delay: Duration) -> Self
    where
        E: 'static,
    {
        Self::new(move |_, _| RetryAction::Retry(delay))
    }

    /// Caps the retries; the operation runs at most `max_retries + 1` times.
    pub const fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    fn next_action(&self, error: &E, retries: usize) -> RetryAction {
        match self.max_retries {
            Some(max) if retries >= max => RetryAction::Stop,
            _ => (self.on_error)(error, retries),
        }
    }
}

/// Runs the operation produced by `generator` under `strategy`.
///
/// Returns the first success, or the failure the strategy stopped on.
pub async fn retry_with<A, E, Fut, Gen>(strategy: Strategy<E>, mut generator: Gen) -> Result<A, E>
where
    Fut: Future<Output = Result<A, E>>,
    Gen: FnMut() -> Fut,
{
    let mut retries = 0;

    loop {
        let error = match generator().await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };

        match strategy.next_action(&error, retries) {
            RetryAction::Retry(delay) => {
                tokio::time::sleep(delay).await;
                retries += 1;
            }
            RetryAction::Stop => return Err(error),
        }
    }
}
