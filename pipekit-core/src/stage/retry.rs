use std::rc::Rc;

use crate::backoff::backoff_delay;
use crate::clock::Clock;
use crate::config::RetryPolicy;
use crate::stats::Counters;

/// Applies a fallible function, retrying declared failures with backoff.
///
/// Each handled failure bumps `errors`. The failure of the final attempt,
/// and any undeclared failure, is returned as-is and aborts the run.
pub(crate) struct RetryMap<'a, I, F> {
    upstream: I,
    f: F,
    policy: RetryPolicy,
    counters: Rc<Counters>,
    clock: Rc<dyn Clock + 'a>,
}

impl<'a, I, F> RetryMap<'a, I, F> {
    pub(crate) fn new(
        upstream: I,
        f: F,
        policy: RetryPolicy,
        counters: Rc<Counters>,
        clock: Rc<dyn Clock + 'a>,
    ) -> Self {
        Self {
            upstream,
            f,
            policy,
            counters,
            clock,
        }
    }
}

impl<I, F, T, U, E> Iterator for RetryMap<'_, I, F>
where
    I: Iterator<Item = anyhow::Result<T>>,
    F: FnMut(&T) -> Result<U, E>,
    E: Into<anyhow::Error>,
{
    type Item = anyhow::Result<U>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = match self.upstream.next()? {
            Ok(item) => item,
            Err(err) => return Some(Err(err)),
        };

        let mut attempt = 0;
        loop {
            let err = match (self.f)(&item) {
                Ok(output) => return Some(Ok(output)),
                Err(err) => err.into(),
            };

            if attempt >= self.policy.retries || !self.policy.retry_on.matches(&err) {
                return Some(Err(err));
            }

            self.counters.error();
            let delay = backoff_delay(self.policy.backoff, attempt);
            tracing::warn!(
                attempt = attempt + 1,
                retries = self.policy.retries,
                ?delay,
                error = %err,
                "retrying failed item"
            );
            if !delay.is_zero() {
                self.clock.sleep(delay);
            }
            attempt += 1;
        }
    }
}
