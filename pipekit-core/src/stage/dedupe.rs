use std::hash::Hash;
use std::rc::Rc;

use crate::seen::SeenSet;
use crate::stats::Counters;

/// Drops items whose key is still tracked by the seen-set
pub(crate) struct Dedupe<I, F, K> {
    upstream: I,
    key: F,
    seen: SeenSet<K>,
    counters: Rc<Counters>,
}

impl<I, F, K> Dedupe<I, F, K>
where
    K: Hash + Eq + Clone,
{
    pub(crate) fn new(
        upstream: I,
        key: F,
        max_size: Option<usize>,
        counters: Rc<Counters>,
    ) -> Self {
        Self {
            upstream,
            key,
            seen: SeenSet::with_capacity(max_size),
            counters,
        }
    }
}

impl<I, F, T, K> Iterator for Dedupe<I, F, K>
where
    I: Iterator<Item = anyhow::Result<T>>,
    F: FnMut(&T) -> K,
    K: Hash + Eq + Clone,
{
    type Item = anyhow::Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let item = match self.upstream.next()? {
                Ok(item) => item,
                Err(err) => return Some(Err(err)),
            };
            if self.seen.insert((self.key)(&item)) {
                return Some(Ok(item));
            }
            self.counters.dropped();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::{drain_ok, upstream};

    fn dedupe(items: Vec<i32>, max_size: Option<usize>) -> (Vec<i32>, u64) {
        let counters = Rc::new(Counters::default());
        let stage = Dedupe::new(upstream(items), |x: &i32| *x, max_size, counters.clone());
        let out = drain_ok(stage);
        (out, counters.finish(Default::default()).dropped())
    }

    #[test]
    fn test_keeps_first_occurrence() {
        assert_eq!(dedupe(vec![1, 2, 2, 3, 1, 4], None), (vec![1, 2, 3, 4], 2));
        assert_eq!(dedupe(vec![3, 1, 2, 1, 3], None), (vec![3, 1, 2], 2));
    }

    #[test]
    fn test_bounded_evicts_oldest() {
        // 3 evicts 1, so 1 reappears
        assert_eq!(dedupe(vec![1, 2, 3, 1], Some(2)), (vec![1, 2, 3, 1], 0));
    }

    #[test]
    fn test_duplicate_hit_does_not_refresh() {
        assert_eq!(dedupe(vec![1, 2, 1, 3, 1], Some(2)), (vec![1, 2, 3, 1], 1));
    }

    #[test]
    fn test_key_function() {
        let counters = Rc::new(Counters::default());
        let stage = Dedupe::new(
            upstream(vec!["a", "A", "b"]),
            |s: &&str| s.to_lowercase(),
            None,
            counters.clone(),
        );
        assert_eq!(drain_ok(stage), vec!["a", "b"]);
        assert_eq!(counters.finish(Default::default()).dropped(), 1);
    }
}
