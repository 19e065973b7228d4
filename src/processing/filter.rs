//! Predicate filtering.

use std::borrow::Borrow;

use crate::predicate::Predicate;

/// Lazily yields the elements of `seq` for which `predicate` holds, in source order.
///
/// Works over owned entities or references (`I::Item: Borrow<T>`), so a snapshot can be
/// filtered without cloning via `filter(snapshot.iter(), &p)`.
pub fn filter<I, T>(seq: I, predicate: &Predicate<T>) -> impl Iterator<Item = I::Item> + use<I, T>
where
    I: IntoIterator,
    I::Item: Borrow<T>,
    T: ?Sized + 'static,
{
    let predicate = predicate.clone();
    seq.into_iter()
        .filter(move |item| predicate.test(item.borrow()))
}

/// Eager filter whose test may fail.
///
/// The first `Err` stops evaluation and is returned unchanged.
pub fn try_filter<I, F, E>(seq: I, mut test: F) -> Result<Vec<I::Item>, E>
where
    I: IntoIterator,
    F: FnMut(&I::Item) -> Result<bool, E>,
{
    let mut out = Vec::new();
    for item in seq {
        if test(&item)? {
            out.push(item);
        }
    }
    Ok(out)
}
