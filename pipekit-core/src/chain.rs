//! Lazy stage chain bound to a single-use source

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::clock::{Clock, SystemClock};
use crate::error::{Error, Result};
use crate::stage::{Items, Source, StageKind};
use crate::stats::Counters;

/// Per-run state handed to every stage when the chain is built
pub(crate) struct RunContext<'a> {
    pub(crate) counters: Rc<Counters>,
    pub(crate) clock: Rc<dyn Clock + 'a>,
}

/// Deferred construction of the stage iterators
pub(crate) type Plan<'a, T> = Box<dyn FnOnce(&RunContext<'a>) -> Result<Items<'a, T>> + 'a>;

/// An ordered list of stages over one source.
///
/// Nothing runs until the runner takes the plan. Each plan can be taken
/// once; clones share it, and every chain derived from the same source
/// shares one consumed flag.
pub(crate) struct Chain<'a, T> {
    plan: Rc<RefCell<Option<Plan<'a, T>>>>,
    consumed: Rc<Cell<bool>>,
    stages: Vec<StageKind>,
    clock: Rc<dyn Clock + 'a>,
    name: Option<String>,
}

impl<T> Clone for Chain<'_, T> {
    fn clone(&self) -> Self {
        Self {
            plan: Rc::clone(&self.plan),
            consumed: Rc::clone(&self.consumed),
            stages: self.stages.clone(),
            clock: Rc::clone(&self.clock),
            name: self.name.clone(),
        }
    }
}

impl<'a, T: 'a> Chain<'a, T> {
    pub(crate) fn from_source<I>(source: I) -> Self
    where
        I: Iterator<Item = anyhow::Result<T>> + 'a,
    {
        let consumed = Rc::new(Cell::new(false));
        let flag = Rc::clone(&consumed);
        let plan: Plan<'a, T> = Box::new(move |ctx| {
            flag.set(true);
            Ok(Box::new(Source::new(source, Rc::clone(&ctx.counters))))
        });

        Self {
            plan: Rc::new(RefCell::new(Some(plan))),
            consumed,
            stages: Vec::new(),
            clock: Rc::new(SystemClock),
            name: None,
        }
    }

    /// Append a stage; `wrap` runs at trigger time around the upstream items
    pub(crate) fn push<U, W>(self, kind: StageKind, wrap: W) -> Result<Chain<'a, U>>
    where
        U: 'a,
        W: FnOnce(Items<'a, T>, &RunContext<'a>) -> Items<'a, U> + 'a,
    {
        if self.is_consumed() {
            return Err(Error::Consumed);
        }

        let upstream = self.plan;
        let plan: Plan<'a, U> = Box::new(move |ctx| {
            let build = upstream.borrow_mut().take().ok_or(Error::Consumed)?;
            Ok(wrap(build(ctx)?, ctx))
        });

        let mut stages = self.stages;
        stages.push(kind);
        Ok(Chain {
            plan: Rc::new(RefCell::new(Some(plan))),
            consumed: self.consumed,
            stages,
            clock: self.clock,
            name: self.name,
        })
    }

    pub(crate) fn take_plan(&self) -> Result<Plan<'a, T>> {
        if self.is_consumed() {
            return Err(Error::Consumed);
        }
        self.plan.borrow_mut().take().ok_or(Error::Consumed)
    }

    pub(crate) fn is_consumed(&self) -> bool {
        self.consumed.get()
    }

    pub(crate) fn stages(&self) -> &[StageKind] {
        &self.stages
    }

    pub(crate) fn clock(&self) -> Rc<dyn Clock + 'a> {
        Rc::clone(&self.clock)
    }

    pub(crate) fn set_clock(&mut self, clock: Rc<dyn Clock + 'a>) {
        self.clock = clock;
    }

    pub(crate) fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = Some(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::Map;

    fn context() -> RunContext<'static> {
        RunContext {
            counters: Rc::new(Counters::default()),
            clock: Rc::new(SystemClock),
        }
    }

    fn numbers() -> Chain<'static, i32> {
        Chain::from_source(vec![1, 2, 3].into_iter().map(Ok))
    }

    #[test]
    fn test_push_is_lazy() {
        let pulled = Rc::new(Cell::new(false));
        let seen = Rc::clone(&pulled);
        let chain = Chain::from_source(std::iter::from_fn(move || {
            seen.set(true);
            None::<anyhow::Result<i32>>
        }));

        let chain = chain
            .push::<i32, _>(StageKind::Map, |items, _| Box::new(Map::new(items, |x: i32| x + 1)))
            .unwrap();

        assert_eq!(chain.stages(), &[StageKind::Map]);
        assert!(!pulled.get());
        assert!(!chain.is_consumed());
    }

    #[test]
    fn test_plan_runs_once() {
        let chain = numbers();
        let twin = chain.clone();

        let plan = chain.take_plan().unwrap();
        let items: Vec<i32> = plan(&context()).unwrap().map(|item| item.unwrap()).collect();
        assert_eq!(items, vec![1, 2, 3]);

        assert!(twin.is_consumed());
        assert!(matches!(twin.take_plan(), Err(Error::Consumed)));
    }

    #[test]
    fn test_branches_share_the_source() {
        let base = numbers();
        let left = base
            .clone()
            .push::<i32, _>(StageKind::Map, |items, _| Box::new(Map::new(items, |x: i32| x * 2)))
            .unwrap();
        let right = base
            .push::<i32, _>(StageKind::Map, |items, _| Box::new(Map::new(items, |x: i32| x * 3)))
            .unwrap();

        let plan = left.take_plan().unwrap();
        assert_eq!(plan(&context()).unwrap().count(), 3);

        assert!(right.is_consumed());
        assert!(matches!(
            right.push(StageKind::Take { limit: 1 }, |items, _| items),
            Err(Error::Consumed)
        ));
    }
}
