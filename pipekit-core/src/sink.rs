//! Sink trait and implementations for pipeline output

/// A terminal consumer receiving one emitted unit at a time
pub trait Sink<T> {
    /// Consume one emitted unit
    fn consume(&mut self, item: T) -> anyhow::Result<()>;

    /// Called once after the chain is exhausted
    fn flush(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

impl<T, K: Sink<T> + ?Sized> Sink<T> for &mut K {
    fn consume(&mut self, item: T) -> anyhow::Result<()> {
        (**self).consume(item)
    }

    fn flush(&mut self) -> anyhow::Result<()> {
        (**self).flush()
    }
}

/// A sink that calls an infallible closure
#[derive(Debug, Clone)]
pub struct FnSink<F>(F);

impl<F> FnSink<F> {
    /// Wrap a closure
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<T, F: FnMut(T)> Sink<T> for FnSink<F> {
    fn consume(&mut self, item: T) -> anyhow::Result<()> {
        (self.0)(item);
        Ok(())
    }
}

/// A sink that calls a fallible closure; an `Err` aborts the run
#[derive(Debug, Clone)]
pub struct TryFnSink<F>(F);

impl<F> TryFnSink<F> {
    /// Wrap a closure
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<T, F: FnMut(T) -> anyhow::Result<()>> Sink<T> for TryFnSink<F> {
    fn consume(&mut self, item: T) -> anyhow::Result<()> {
        (self.0)(item)
    }
}

/// A sink that drops everything it receives
#[derive(Debug, Clone, Copy, Default)]
pub struct Discard;

impl<T> Sink<T> for Discard {
    fn consume(&mut self, _item: T) -> anyhow::Result<()> {
        Ok(())
    }
}

/// A sink that collects items in memory
#[derive(Debug, Clone)]
pub struct CollectingSink<T> {
    /// The collected items
    items: Vec<T>,

    /// Maximum number of items to collect
    max_items: Option<usize>,
}

impl<T> CollectingSink<T> {
    /// Create a new collecting sink with no limit
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            max_items: None,
        }
    }

    /// Create a new collecting sink keeping at most `max_items`; later
    /// items are accepted and discarded
    pub fn with_max_items(max_items: usize) -> Self {
        Self {
            items: Vec::new(),
            max_items: Some(max_items),
        }
    }

    /// Get the collected items
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Take ownership of the collected items
    pub fn take_items(self) -> Vec<T> {
        self.items
    }
}

impl<T> Default for CollectingSink<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Sink<T> for CollectingSink<T> {
    fn consume(&mut self, item: T) -> anyhow::Result<()> {
        if self.max_items.map_or(true, |max| self.items.len() < max) {
            self.items.push(item);
        }
        Ok(())
    }
}
