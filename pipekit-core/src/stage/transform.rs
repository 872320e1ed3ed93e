//! Stateless stages: map, flat_map, filter and tap, plus their fallible forms

use std::rc::Rc;

use crate::stats::Counters;

pub(crate) struct Map<I, F> {
    upstream: I,
    f: F,
}

impl<I, F> Map<I, F> {
    pub(crate) fn new(upstream: I, f: F) -> Self {
        Self { upstream, f }
    }
}

impl<I, F, T, U> Iterator for Map<I, F>
where
    I: Iterator<Item = anyhow::Result<T>>,
    F: FnMut(T) -> U,
{
    type Item = anyhow::Result<U>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.upstream.next()?;
        Some(item.map(&mut self.f))
    }
}

pub(crate) struct TryMap<I, F> {
    upstream: I,
    f: F,
}

impl<I, F> TryMap<I, F> {
    pub(crate) fn new(upstream: I, f: F) -> Self {
        Self { upstream, f }
    }
}

impl<I, F, T, U, E> Iterator for TryMap<I, F>
where
    I: Iterator<Item = anyhow::Result<T>>,
    F: FnMut(T) -> Result<U, E>,
    E: Into<anyhow::Error>,
{
    type Item = anyhow::Result<U>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.upstream.next()?;
        Some(item.and_then(|value| (self.f)(value).map_err(Into::into)))
    }
}

/// Expands each item into zero or more downstream items, in order
pub(crate) struct FlatMap<I, F, C: IntoIterator> {
    upstream: I,
    f: F,
    current: Option<C::IntoIter>,
}

impl<I, F, C: IntoIterator> FlatMap<I, F, C> {
    pub(crate) fn new(upstream: I, f: F) -> Self {
        Self {
            upstream,
            f,
            current: None,
        }
    }
}

impl<I, F, T, C> Iterator for FlatMap<I, F, C>
where
    I: Iterator<Item = anyhow::Result<T>>,
    F: FnMut(T) -> C,
    C: IntoIterator,
{
    type Item = anyhow::Result<C::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(inner) = self.current.as_mut() {
                if let Some(value) = inner.next() {
                    return Some(Ok(value));
                }
                self.current = None;
            }

            match self.upstream.next()? {
                Ok(item) => self.current = Some((self.f)(item).into_iter()),
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

pub(crate) struct Filter<I, P> {
    upstream: I,
    predicate: P,
    counters: Rc<Counters>,
}

impl<I, P> Filter<I, P> {
    pub(crate) fn new(upstream: I, predicate: P, counters: Rc<Counters>) -> Self {
        Self {
            upstream,
            predicate,
            counters,
        }
    }
}

impl<I, P, T> Iterator for Filter<I, P>
where
    I: Iterator<Item = anyhow::Result<T>>,
    P: FnMut(&T) -> bool,
{
    type Item = anyhow::Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.upstream.next()? {
                Ok(item) if (self.predicate)(&item) => return Some(Ok(item)),
                Ok(_) => self.counters.dropped(),
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

pub(crate) struct TryFilter<I, P> {
    upstream: I,
    predicate: P,
    counters: Rc<Counters>,
}

impl<I, P> TryFilter<I, P> {
    pub(crate) fn new(upstream: I, predicate: P, counters: Rc<Counters>) -> Self {
        Self {
            upstream,
            predicate,
            counters,
        }
    }
}

impl<I, P, T, E> Iterator for TryFilter<I, P>
where
    I: Iterator<Item = anyhow::Result<T>>,
    P: FnMut(&T) -> Result<bool, E>,
    E: Into<anyhow::Error>,
{
    type Item = anyhow::Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let item = match self.upstream.next()? {
                Ok(item) => item,
                Err(err) => return Some(Err(err)),
            };
            match (self.predicate)(&item) {
                Ok(true) => return Some(Ok(item)),
                Ok(false) => self.counters.dropped(),
                Err(err) => return Some(Err(err.into())),
            }
        }
    }
}

pub(crate) struct Tap<I, F> {
    upstream: I,
    f: F,
}

impl<I, F> Tap<I, F> {
    pub(crate) fn new(upstream: I, f: F) -> Self {
        Self { upstream, f }
    }
}

impl<I, F, T> Iterator for Tap<I, F>
where
    I: Iterator<Item = anyhow::Result<T>>,
    F: FnMut(&T),
{
    type Item = anyhow::Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.upstream.next()?;
        if let Ok(value) = &item {
            (self.f)(value);
        }
        Some(item)
    }
}

pub(crate) struct TryTap<I, F> {
    upstream: I,
    f: F,
}

impl<I, F> TryTap<I, F> {
    pub(crate) fn new(upstream: I, f: F) -> Self {
        Self { upstream, f }
    }
}

impl<I, F, T, E> Iterator for TryTap<I, F>
where
    I: Iterator<Item = anyhow::Result<T>>,
    F: FnMut(&T) -> Result<(), E>,
    E: Into<anyhow::Error>,
{
    type Item = anyhow::Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.upstream.next()?;
        Some(item.and_then(|value| {
            (self.f)(&value).map_err(Into::into)?;
            Ok(value)
        }))
    }
}
