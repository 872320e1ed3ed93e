//! Caller-declared failure kinds for `retry_map` and `catch`

use std::fmt;
use std::rc::Rc;

type Predicate = Rc<dyn Fn(&anyhow::Error) -> bool>;

#[derive(Clone)]
enum Matcher {
    Any,
    Type {
        name: &'static str,
        test: fn(&anyhow::Error) -> bool,
    },
    Predicate(Predicate),
}

impl Matcher {
    fn matches(&self, error: &anyhow::Error) -> bool {
        match self {
            Matcher::Any => true,
            Matcher::Type { test, .. } => test(error),
            Matcher::Predicate(predicate) => predicate(error),
        }
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Any => f.write_str("any"),
            Matcher::Type { name, .. } => f.write_str(name),
            Matcher::Predicate(_) => f.write_str("<predicate>"),
        }
    }
}

fn is_kind<E>(error: &anyhow::Error) -> bool
where
    E: std::error::Error + Send + Sync + 'static,
{
    error.downcast_ref::<E>().is_some()
}

/// The set of failure kinds a stage is allowed to retry or capture.
///
/// A failure matches when any declared matcher accepts it. Type matchers
/// downcast the [`anyhow::Error`] to the declared error type, so a failure
/// matches whether the user function returned the type directly or wrapped
/// it in context.
///
/// ```
/// use pipekit_core::Retryable;
///
/// let transient = Retryable::of::<std::io::Error>().or::<std::num::ParseIntError>();
/// let err = anyhow::Error::new(std::io::Error::from(std::io::ErrorKind::TimedOut));
/// assert!(transient.matches(&err));
/// assert!(!Retryable::none().matches(&err));
/// ```
#[derive(Clone, Debug, Default)]
pub struct Retryable {
    matchers: Vec<Matcher>,
}

impl Retryable {
    /// Matches every failure
    pub fn any() -> Self {
        Self {
            matchers: vec![Matcher::Any],
        }
    }

    /// Matches nothing; every failure propagates
    pub fn none() -> Self {
        Self::default()
    }

    /// Matches failures that downcast to `E`
    pub fn of<E>() -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::none().or::<E>()
    }

    /// Also match failures that downcast to `E`
    #[must_use]
    pub fn or<E>(mut self) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.matchers.push(Matcher::Type {
            name: std::any::type_name::<E>(),
            test: is_kind::<E>,
        });
        self
    }

    /// Matches failures accepted by `predicate`
    pub fn when<P>(predicate: P) -> Self
    where
        P: Fn(&anyhow::Error) -> bool + 'static,
    {
        Self {
            matchers: vec![Matcher::Predicate(Rc::new(predicate))],
        }
    }

    /// Whether `error` belongs to one of the declared kinds
    pub fn matches(&self, error: &anyhow::Error) -> bool {
        self.matchers.iter().any(|m| m.matches(error))
    }
}
