use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::clock::Clock;

/// Delays releases so consecutive items are at least `interval` apart.
///
/// Only ever adds delay: time already spent downstream counts towards the
/// interval.
pub(crate) struct RateLimited<'a, I> {
    upstream: I,
    interval: Duration,
    last_release: Option<Instant>,
    clock: Rc<dyn Clock + 'a>,
}

impl<'a, I> RateLimited<'a, I> {
    pub(crate) fn new(upstream: I, interval: Duration, clock: Rc<dyn Clock + 'a>) -> Self {
        Self {
            upstream,
            interval,
            last_release: None,
            clock,
        }
    }
}

impl<I, T> Iterator for RateLimited<'_, I>
where
    I: Iterator<Item = anyhow::Result<T>>,
{
    type Item = anyhow::Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.upstream.next()?;
        if item.is_err() {
            return Some(item);
        }

        if let Some(last) = self.last_release {
            let elapsed = self.clock.now().saturating_duration_since(last);
            if elapsed < self.interval {
                let pause = self.interval - elapsed;
                tracing::trace!(?pause, "rate limit pause");
                self.clock.sleep(pause);
            }
        }
        self.last_release = Some(self.clock.now());
        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::stage::upstream;

    #[test]
    fn test_first_item_released_immediately() {
        let clock = Rc::new(ManualClock::new());
        let mut stage =
            RateLimited::new(upstream(vec![1]), Duration::from_millis(100), clock.clone());

        assert_eq!(stage.next().unwrap().unwrap(), 1);
        assert!(clock.sleeps().is_empty());
    }

    #[test]
    fn test_spaces_releases() {
        let clock = Rc::new(ManualClock::new());
        let stage = RateLimited::new(
            upstream(vec![1, 2, 3]),
            Duration::from_millis(100),
            clock.clone(),
        );

        assert_eq!(stage.count(), 3);
        assert_eq!(clock.sleeps(), vec![Duration::from_millis(100); 2]);
        assert_eq!(clock.elapsed(), Duration::from_millis(200));
    }

    #[test]
    fn test_slow_consumer_shortens_pause() {
        let clock = Rc::new(ManualClock::new());
        let mut stage = RateLimited::new(
            upstream(vec![1, 2, 3]),
            Duration::from_millis(100),
            clock.clone(),
        );

        stage.next();
        clock.advance(Duration::from_millis(30));
        stage.next();
        clock.advance(Duration::from_millis(250));
        stage.next();

        assert_eq!(clock.sleeps(), vec![Duration::from_millis(70)]);
    }
}
