//! Folding and reusable reducers.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Sequential fold of `seq` starting at `initial`.
///
/// `combine` merges two partial results and must be associative with `accumulate`'s result
/// type. It is accepted here so sequential and parallel call sites share one signature; only
/// [`crate::execution::ExecutionEngine::reduce_parallel`] actually invokes it.
pub fn reduce<I, R, A, C>(seq: I, initial: R, accumulate: A, _combine: C) -> R
where
    I: IntoIterator,
    A: FnMut(R, I::Item) -> R,
    C: Fn(R, R) -> R,
{
    seq.into_iter().fold(initial, accumulate)
}

/// [`reduce`] with a fallible accumulator; the first `Err` is returned unchanged.
pub fn try_reduce<I, R, E, A>(seq: I, initial: R, mut accumulate: A) -> Result<R, E>
where
    I: IntoIterator,
    A: FnMut(R, I::Item) -> Result<R, E>,
{
    let mut acc = initial;
    for item in seq {
        acc = accumulate(acc, item)?;
    }
    Ok(acc)
}

/// Fold `seq` with a packaged [`Reducer`].
pub fn reduce_with<I, T, R>(seq: I, reducer: &Reducer<T, R>) -> R
where
    I: IntoIterator,
    I::Item: Borrow<T>,
    T: ?Sized,
    R: Clone,
{
    seq.into_iter()
        .fold(reducer.identity(), |acc, item| reducer.accumulate(acc, item.borrow()))
}

type AccumulateFn<T, R> = dyn Fn(R, &T) -> R + Send + Sync;
type CombineFn<R> = dyn Fn(R, R) -> R + Send + Sync;

/// Identity value, accumulator and associative combiner bundled as one reusable value.
///
/// The same reducer drives sequential ([`reduce_with`]), grouped
/// ([`super::group_by_reduce`]) and parallel evaluation.
pub struct Reducer<T: ?Sized, R> {
    identity: R,
    accumulate: Arc<AccumulateFn<T, R>>,
    combine: Arc<CombineFn<R>>,
}

impl<T: ?Sized, R: Clone> Clone for Reducer<T, R> {
    fn clone(&self) -> Self {
        Self {
            identity: self.identity.clone(),
            accumulate: Arc::clone(&self.accumulate),
            combine: Arc::clone(&self.combine),
        }
    }
}

impl<T: ?Sized, R: fmt::Debug> fmt::Debug for Reducer<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reducer")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

impl<T: ?Sized, R: Clone> Reducer<T, R> {
    /// Build a reducer from its three parts.
    pub fn new<A, C>(identity: R, accumulate: A, combine: C) -> Self
    where
        A: Fn(R, &T) -> R + Send + Sync + 'static,
        C: Fn(R, R) -> R + Send + Sync + 'static,
    {
        Self {
            identity,
            accumulate: Arc::new(accumulate),
            combine: Arc::new(combine),
        }
    }

    /// A fresh copy of the identity value.
    pub fn identity(&self) -> R {
        self.identity.clone()
    }

    pub fn accumulate(&self, acc: R, item: &T) -> R {
        (self.accumulate)(acc, item)
    }

    pub fn combine(&self, left: R, right: R) -> R {
        (self.combine)(left, right)
    }
}

impl<T: ?Sized + 'static> Reducer<T, f64> {
    /// Sum of `value(item)` over all items.
    pub fn sum_by<F>(value: F) -> Self
    where
        F: Fn(&T) -> f64 + Send + Sync + 'static,
    {
        Self::new(0.0, move |acc, item| acc + value(item), |a, b| a + b)
    }
}

impl<T: ?Sized + 'static> Reducer<T, usize> {
    /// Number of items.
    pub fn count() -> Self {
        Self::new(0, |acc, _| acc + 1, |a, b| a + b)
    }
}

impl<T: Clone + 'static> Reducer<T, Option<T>> {
    /// Item with the smallest key; the earliest item wins ties. `None` for empty input.
    pub fn min_by<F>(key: F) -> Self
    where
        F: Fn(&T) -> f64 + Send + Sync + 'static,
    {
        Self::pick(key, |candidate, current| candidate < current)
    }

    /// Item with the largest key; the earliest item wins ties. `None` for empty input.
    pub fn max_by<F>(key: F) -> Self
    where
        F: Fn(&T) -> f64 + Send + Sync + 'static,
    {
        Self::pick(key, |candidate, current| candidate > current)
    }

    // `replaces(candidate_key, current_key)` must be strict so ties keep the left value.
    fn pick<F>(key: F, replaces: fn(f64, f64) -> bool) -> Self
    where
        F: Fn(&T) -> f64 + Send + Sync + 'static,
    {
        let key = Arc::new(key);
        let combine_key = Arc::clone(&key);
        Self::new(
            None,
            move |acc: Option<T>, item: &T| match acc {
                Some(current) if !replaces(key(item), key(&current)) => Some(current),
                _ => Some(item.clone()),
            },
            move |left: Option<T>, right: Option<T>| match (left, right) {
                (Some(l), Some(r)) => {
                    if replaces(combine_key(&r), combine_key(&l)) {
                        Some(r)
                    } else {
                        Some(l)
                    }
                }
                (l, r) => l.or(r),
            },
        )
    }
}
