use std::rc::Rc;

use crate::stats::Counters;

/// Head of every chain: counts each item pulled from the user's source
pub(crate) struct Source<I> {
    inner: I,
    counters: Rc<Counters>,
}

impl<I> Source<I> {
    pub(crate) fn new(inner: I, counters: Rc<Counters>) -> Self {
        Self { inner, counters }
    }
}

impl<I, T> Iterator for Source<I>
where
    I: Iterator<Item = anyhow::Result<T>>,
{
    type Item = anyhow::Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.inner.next()?;
        self.counters.processed();
        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::{drain_ok, upstream};

    #[test]
    fn test_counts_pulled_items() {
        let counters = Rc::new(Counters::default());
        let mut source = Source::new(upstream(vec![1, 2, 3]), counters.clone());

        assert_eq!(source.next().unwrap().unwrap(), 1);
        assert_eq!(counters.finish(Default::default()).processed(), 1);

        assert_eq!(drain_ok(source), vec![2, 3]);
        assert_eq!(counters.finish(Default::default()).processed(), 3);
    }
}
