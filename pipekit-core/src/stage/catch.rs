use std::rc::Rc;

use crate::retryable::Retryable;
use crate::stats::Counters;

/// Applies a fallible function once per item; declared failures are handed
/// to the error handler together with the original item, which is dropped.
pub(crate) struct Catch<I, F, H> {
    upstream: I,
    f: F,
    on_error: H,
    catch_on: Retryable,
    counters: Rc<Counters>,
}

impl<I, F, H> Catch<I, F, H> {
    pub(crate) fn new(
        upstream: I,
        f: F,
        on_error: H,
        catch_on: Retryable,
        counters: Rc<Counters>,
    ) -> Self {
        Self {
            upstream,
            f,
            on_error,
            catch_on,
            counters,
        }
    }
}

impl<I, F, H, T, U, E> Iterator for Catch<I, F, H>
where
    I: Iterator<Item = anyhow::Result<T>>,
    F: FnMut(&T) -> Result<U, E>,
    E: Into<anyhow::Error>,
    H: FnMut(T, anyhow::Error),
{
    type Item = anyhow::Result<U>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let item = match self.upstream.next()? {
                Ok(item) => item,
                Err(err) => return Some(Err(err)),
            };

            let err = match (self.f)(&item) {
                Ok(output) => return Some(Ok(output)),
                Err(err) => err.into(),
            };
            if !self.catch_on.matches(&err) {
                return Some(Err(err));
            }

            tracing::debug!(error = %err, "item failure captured");
            self.counters.error();
            self.counters.dropped();
            (self.on_error)(item, err);
        }
    }
}
