/// Passes at most `remaining` items, then stops without touching upstream
pub(crate) struct Take<I> {
    upstream: I,
    remaining: usize,
}

impl<I> Take<I> {
    pub(crate) fn new(upstream: I, limit: usize) -> Self {
        Self {
            upstream,
            remaining: limit,
        }
    }
}

impl<I, T> Iterator for Take<I>
where
    I: Iterator<Item = anyhow::Result<T>>,
{
    type Item = anyhow::Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let item = self.upstream.next()?;
        self.remaining -= 1;
        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::drain_ok;
    use std::cell::Cell;
    use test_case::test_case;

    #[test_case(100, 3, 3 ; "shorter than source")]
    #[test_case(2, 10, 2 ; "longer than source")]
    #[test_case(3, 0, 0 ; "zero")]
    fn test_never_pulls_past_limit(available: usize, limit: usize, expected: usize) {
        let pulls = Cell::new(0);
        let source = (0..available).map(|x| {
            pulls.set(pulls.get() + 1);
            Ok(x)
        });

        let out = drain_ok(Take::new(source, limit));
        assert_eq!(out, (0..expected).collect::<Vec<_>>());
        assert_eq!(pulls.get(), expected);
    }

    #[test]
    fn test_infinite_source() {
        let out = drain_ok(Take::new((0..).map(Ok::<u64, anyhow::Error>), 4));
        assert_eq!(out, vec![0, 1, 2, 3]);
    }
}
