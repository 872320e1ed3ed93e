//! The fluent pipeline builder

use std::fmt;
use std::hash::Hash;
use std::rc::Rc;
use std::time::Duration;

use crate::chain::{Chain, RunContext};
use crate::clock::Clock;
use crate::config::{RateLimit, RetryPolicy};
use crate::error::{Error, Result};
use crate::retryable::Retryable;
use crate::runner::Runner;
use crate::sink::{CollectingSink, Discard, FnSink, Sink, TryFnSink};
use crate::stage::{
    Batch, Catch, Dedupe, Filter, FlatMap, Items, Map, RateLimited, RetryMap, StageKind, Take, Tap,
    TryFilter, TryMap, TryTap,
};
use crate::stats::RunStats;

/// Create a lazy pipeline over `source`
pub fn pipe<'a, I>(source: I) -> Pipe<'a, I::Item>
where
    I: IntoIterator,
    I::IntoIter: 'a,
    I::Item: 'a,
{
    Pipe::new(source)
}

/// Create a lazy pipeline over a fallible source; the first `Err` aborts the run
pub fn try_pipe<'a, I, T, E>(source: I) -> Pipe<'a, T>
where
    I: IntoIterator<Item = std::result::Result<T, E>>,
    I::IntoIter: 'a,
    T: 'a,
    E: Into<anyhow::Error> + 'a,
{
    Pipe {
        chain: Chain::from_source(source.into_iter().map(|item| item.map_err(Into::into))),
    }
}

/// A lazy, single-use pipeline producing items of type `T`.
///
/// Attaching a stage consumes the handle and returns a new one; no item is
/// pulled until one of the trigger methods ([`run`](Pipe::run),
/// [`try_run`](Pipe::try_run), [`run_into`](Pipe::run_into),
/// [`drain`](Pipe::drain), [`collect`](Pipe::collect)) is called.
///
/// Cloning a handle branches the chain. All branches share the source, so
/// only the first one triggered gets to run; the others report
/// [`Error::Consumed`].
///
/// ```
/// use pipekit_core::pipe;
///
/// # fn main() -> anyhow::Result<()> {
/// let mut evens = Vec::new();
/// let stats = pipe(0..10)
///     .filter(|x| x % 2 == 0)?
///     .map(|x| x * 3)?
///     .batch(2)?
///     .run(|batch| evens.push(batch))?;
///
/// assert_eq!(evens, vec![vec![0, 6], vec![12, 18], vec![24]]);
/// assert_eq!(stats.processed(), 10);
/// assert_eq!(stats.dropped(), 5);
/// assert_eq!(stats.batches(), 3);
/// # Ok(())
/// # }
/// ```
pub struct Pipe<'a, T> {
    chain: Chain<'a, T>,
}

impl<T> Clone for Pipe<'_, T> {
    fn clone(&self) -> Self {
        Self {
            chain: self.chain.clone(),
        }
    }
}

impl<'a, T: 'a> fmt::Debug for Pipe<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipe")
            .field("name", &self.chain.name())
            .field("stages", &self.chain.stages())
            .field("consumed", &self.chain.is_consumed())
            .finish()
    }
}

impl<'a, T: 'a> Pipe<'a, T> {
    /// Create a lazy pipeline over `source`
    pub fn new<I>(source: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: 'a,
    {
        Self {
            chain: Chain::from_source(source.into_iter().map(Ok)),
        }
    }

    fn attach<U, W>(self, kind: StageKind, wrap: W) -> Result<Pipe<'a, U>>
    where
        U: 'a,
        W: FnOnce(Items<'a, T>, &RunContext<'a>) -> Items<'a, U> + 'a,
    {
        tracing::trace!(stage = %kind, "stage attached");
        Ok(Pipe {
            chain: self.chain.push(kind, wrap)?,
        })
    }

    /// Label the run's log span
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.chain.set_name(name.into());
        self
    }

    /// Use `clock` for timing, rate limiting and backoff sleeps
    #[must_use]
    pub fn with_clock(mut self, clock: Rc<dyn Clock + 'a>) -> Self {
        self.chain.set_clock(clock);
        self
    }

    /// The attached stages, in order
    pub fn stages(&self) -> &[StageKind] {
        self.chain.stages()
    }

    /// Whether the source behind this handle was already consumed
    pub fn is_consumed(&self) -> bool {
        self.chain.is_consumed()
    }

    /// Transform each item
    pub fn map<U, F>(self, f: F) -> Result<Pipe<'a, U>>
    where
        U: 'a,
        F: FnMut(T) -> U + 'a,
    {
        self.attach(StageKind::Map, move |items, _| Box::new(Map::new(items, f)))
    }

    /// Transform each item with a fallible function; an `Err` aborts the run
    pub fn try_map<U, E, F>(self, f: F) -> Result<Pipe<'a, U>>
    where
        U: 'a,
        E: Into<anyhow::Error>,
        F: FnMut(T) -> std::result::Result<U, E> + 'a,
    {
        self.attach(StageKind::TryMap, move |items, _| {
            Box::new(TryMap::new(items, f))
        })
    }

    /// Expand each item into zero or more items
    pub fn flat_map<C, F>(self, f: F) -> Result<Pipe<'a, C::Item>>
    where
        C: IntoIterator + 'a,
        C::IntoIter: 'a,
        C::Item: 'a,
        F: FnMut(T) -> C + 'a,
    {
        self.attach(StageKind::FlatMap, move |items, _| {
            Box::new(FlatMap::<_, _, C>::new(items, f))
        })
    }

    /// Keep items matching `predicate`; the rest count as dropped
    pub fn filter<P>(self, predicate: P) -> Result<Pipe<'a, T>>
    where
        P: FnMut(&T) -> bool + 'a,
    {
        self.attach(StageKind::Filter, move |items, ctx| {
            Box::new(Filter::new(items, predicate, Rc::clone(&ctx.counters)))
        })
    }

    /// Keep items matching a fallible predicate; an `Err` aborts the run
    pub fn try_filter<E, P>(self, predicate: P) -> Result<Pipe<'a, T>>
    where
        E: Into<anyhow::Error>,
        P: FnMut(&T) -> std::result::Result<bool, E> + 'a,
    {
        self.attach(StageKind::TryFilter, move |items, ctx| {
            Box::new(TryFilter::new(items, predicate, Rc::clone(&ctx.counters)))
        })
    }

    /// Call `f` on each item for its side effect
    pub fn tap<F>(self, f: F) -> Result<Pipe<'a, T>>
    where
        F: FnMut(&T) + 'a,
    {
        self.attach(StageKind::Tap, move |items, _| Box::new(Tap::new(items, f)))
    }

    /// Call a fallible `f` on each item; an `Err` aborts the run
    pub fn try_tap<E, F>(self, f: F) -> Result<Pipe<'a, T>>
    where
        E: Into<anyhow::Error>,
        F: FnMut(&T) -> std::result::Result<(), E> + 'a,
    {
        self.attach(StageKind::TryTap, move |items, _| {
            Box::new(TryTap::new(items, f))
        })
    }

    /// Group items into vectors of `size`; the last one may be shorter
    pub fn batch(self, size: usize) -> Result<Pipe<'a, Vec<T>>> {
        if size == 0 {
            return Err(Error::config("batch size must be greater than 0"));
        }
        self.attach(StageKind::Batch { size }, move |items, ctx| {
            Box::new(Batch::new(items, size, Rc::clone(&ctx.counters)))
        })
    }

    /// Release at most `rate` items per `per`, sleeping between items
    pub fn rate_limit(self, rate: f64, per: Duration) -> Result<Pipe<'a, T>> {
        let interval = RateLimit::new(rate, per).interval()?;
        self.attach(StageKind::RateLimit { rate, per }, move |items, ctx| {
            Box::new(RateLimited::new(items, interval, Rc::clone(&ctx.clock)))
        })
    }

    /// Drop items equal to one already seen.
    ///
    /// With `max_size`, at most that many items are remembered and the
    /// oldest is forgotten first, so an evicted item can pass again.
    pub fn dedupe(self, max_size: Option<usize>) -> Result<Pipe<'a, T>>
    where
        T: Hash + Eq + Clone,
    {
        self.dedupe_by(T::clone, max_size)
    }

    /// Drop items whose `key` was already seen; see [`dedupe`](Pipe::dedupe)
    pub fn dedupe_by<K, F>(self, key: F, max_size: Option<usize>) -> Result<Pipe<'a, T>>
    where
        K: Hash + Eq + Clone + 'a,
        F: FnMut(&T) -> K + 'a,
    {
        if max_size == Some(0) {
            return Err(Error::config("dedupe max_size must be greater than 0"));
        }
        self.attach(StageKind::Dedupe { max_size }, move |items, ctx| {
            Box::new(Dedupe::new(items, key, max_size, Rc::clone(&ctx.counters)))
        })
    }

    /// Apply a fallible function, retrying failures declared in `policy`
    /// with exponential backoff. The last failure aborts the run.
    pub fn retry_map<U, E, F>(self, f: F, policy: RetryPolicy) -> Result<Pipe<'a, U>>
    where
        U: 'a,
        E: Into<anyhow::Error>,
        F: FnMut(&T) -> std::result::Result<U, E> + 'a,
    {
        let kind = StageKind::RetryMap {
            retries: policy.retries,
            backoff: policy.backoff,
        };
        self.attach(kind, move |items, ctx| {
            Box::new(RetryMap::new(
                items,
                f,
                policy,
                Rc::clone(&ctx.counters),
                Rc::clone(&ctx.clock),
            ))
        })
    }

    /// Apply a fallible function once per item. Failures matching
    /// `catch_on` go to `on_error` with the original item, which is
    /// dropped; other failures abort the run.
    pub fn catch<U, E, F, H>(self, f: F, on_error: H, catch_on: Retryable) -> Result<Pipe<'a, U>>
    where
        U: 'a,
        E: Into<anyhow::Error>,
        F: FnMut(&T) -> std::result::Result<U, E> + 'a,
        H: FnMut(T, anyhow::Error) + 'a,
    {
        self.attach(StageKind::Catch, move |items, ctx| {
            Box::new(Catch::new(
                items,
                f,
                on_error,
                catch_on,
                Rc::clone(&ctx.counters),
            ))
        })
    }

    /// Pass at most `limit` items and stop pulling upstream after that
    pub fn take(self, limit: usize) -> Result<Pipe<'a, T>> {
        self.attach(StageKind::Take { limit }, move |items, _| {
            Box::new(Take::new(items, limit))
        })
    }

    /// Run the pipeline, handing every emitted unit to `sink`
    pub fn run<F>(self, sink: F) -> anyhow::Result<RunStats>
    where
        F: FnMut(T),
    {
        self.run_into(FnSink::new(sink))
    }

    /// Run the pipeline with a fallible sink; an `Err` aborts the run
    pub fn try_run<F>(self, sink: F) -> anyhow::Result<RunStats>
    where
        F: FnMut(T) -> anyhow::Result<()>,
    {
        self.run_into(TryFnSink::new(sink))
    }

    /// Run the pipeline into a [`Sink`]
    pub fn run_into<K: Sink<T>>(self, sink: K) -> anyhow::Result<RunStats> {
        Runner::new(self.chain).run(sink)
    }

    /// Run the pipeline, discarding the output
    pub fn drain(self) -> anyhow::Result<RunStats> {
        self.run_into(Discard)
    }

    /// Run the pipeline and return the emitted units with the stats
    pub fn collect(self) -> anyhow::Result<(Vec<T>, RunStats)> {
        let mut sink = CollectingSink::new();
        let stats = self.run_into(&mut sink)?;
        Ok((sink.take_items(), stats))
    }
}
