use std::mem;
use std::rc::Rc;

use crate::stats::Counters;

/// Groups items into vectors of `size`, flushing a partial buffer at the end
pub(crate) struct Batch<I, T> {
    upstream: I,
    size: usize,
    buffer: Vec<T>,
    exhausted: bool,
    counters: Rc<Counters>,
}

impl<I, T> Batch<I, T> {
    pub(crate) fn new(upstream: I, size: usize, counters: Rc<Counters>) -> Self {
        debug_assert!(size > 0, "batch size validated at attachment");
        Self {
            upstream,
            size,
            buffer: Vec::new(),
            exhausted: false,
            counters,
        }
    }

    fn emit(&mut self) -> Vec<T> {
        self.counters.batch();
        tracing::trace!(len = self.buffer.len(), "batch emitted");
        mem::take(&mut self.buffer)
    }
}

impl<I, T> Iterator for Batch<I, T>
where
    I: Iterator<Item = anyhow::Result<T>>,
{
    type Item = anyhow::Result<Vec<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }

        loop {
            match self.upstream.next() {
                Some(Ok(item)) => {
                    self.buffer.push(item);
                    if self.buffer.len() >= self.size {
                        return Some(Ok(self.emit()));
                    }
                }
                Some(Err(err)) => return Some(Err(err)),
                None => {
                    self.exhausted = true;
                    if self.buffer.is_empty() {
                        return None;
                    }
                    return Some(Ok(self.emit()));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::{drain_ok, upstream};
    use test_case::test_case;

    fn batches(items: Vec<i32>, size: usize) -> (Vec<Vec<i32>>, u64) {
        let counters = Rc::new(Counters::default());
        let out = drain_ok(Batch::new(upstream(items), size, counters.clone()));
        (out, counters.finish(Default::default()).batches())
    }

    #[test]
    fn test_partial_final_batch() {
        let (out, count) = batches((0..7).collect(), 3);
        assert_eq!(out, vec![vec![0, 1, 2], vec![3, 4, 5], vec![6]]);
        assert_eq!(count, 3);
    }

    #[test_case(vec![0, 1, 2, 3, 4, 5], 3, vec![vec![0, 1, 2], vec![3, 4, 5]] ; "exact multiple")]
    #[test_case(vec![10, 20], 1, vec![vec![10], vec![20]] ; "size one")]
    #[test_case(vec![1, 2], 10, vec![vec![1, 2]] ; "larger than source")]
    #[test_case(vec![], 4, vec![] ; "empty source")]
    fn test_batch_shapes(items: Vec<i32>, size: usize, expected: Vec<Vec<i32>>) {
        let (out, count) = batches(items, size);
        assert_eq!(count, expected.len() as u64);
        assert_eq!(out, expected);
    }

    #[test]
    fn test_does_not_pull_after_exhaustion() {
        let pulls = std::cell::Cell::new(0);
        let source = std::iter::from_fn(|| {
            pulls.set(pulls.get() + 1);
            None::<anyhow::Result<i32>>
        });
        let mut stage = Batch::new(source, 2, Rc::new(Counters::default()));

        assert!(stage.next().is_none());
        assert!(stage.next().is_none());
        assert_eq!(pulls.get(), 1);
    }
}
