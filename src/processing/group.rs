//! Grouping by key.
//!
//! Groups are returned as a [`HashMap`]; key order carries no meaning. Within a group,
//! values keep their source order.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

use super::reduce::Reducer;

/// Partition `seq` by `key`.
pub fn group_by<I, K, F>(seq: I, key: F) -> HashMap<K, Vec<I::Item>>
where
    I: IntoIterator,
    K: Eq + Hash,
    F: FnMut(&I::Item) -> K,
{
    group_by_mapped(seq, key, |item| item)
}

/// Partition `seq` by `key`, storing `value(item)` instead of the item itself.
pub fn group_by_mapped<I, K, V, F, G>(seq: I, mut key: F, mut value: G) -> HashMap<K, Vec<V>>
where
    I: IntoIterator,
    K: Eq + Hash,
    F: FnMut(&I::Item) -> K,
    G: FnMut(I::Item) -> V,
{
    let mut groups: HashMap<K, Vec<V>> = HashMap::new();
    for item in seq {
        let k = key(&item);
        groups.entry(k).or_default().push(value(item));
    }
    groups
}

/// [`group_by`] with a fallible key; the first `Err` is returned unchanged.
pub fn try_group_by<I, K, E, F>(seq: I, mut key: F) -> Result<HashMap<K, Vec<I::Item>>, E>
where
    I: IntoIterator,
    K: Eq + Hash,
    F: FnMut(&I::Item) -> Result<K, E>,
{
    let mut groups: HashMap<K, Vec<I::Item>> = HashMap::new();
    for item in seq {
        let k = key(&item)?;
        groups.entry(k).or_default().push(item);
    }
    Ok(groups)
}

/// Partition `seq` by `key` and fold every group with `reducer`.
pub fn group_by_reduce<I, T, K, R, F>(seq: I, mut key: F, reducer: &Reducer<T, R>) -> HashMap<K, R>
where
    I: IntoIterator,
    I::Item: Borrow<T>,
    T: ?Sized,
    K: Eq + Hash,
    R: Clone,
    F: FnMut(&T) -> K,
{
    let mut groups: HashMap<K, R> = HashMap::new();
    for item in seq {
        let item = item.borrow();
        let slot = groups.entry(key(item)).or_insert_with(|| reducer.identity());
        let acc = std::mem::replace(slot, reducer.identity());
        *slot = reducer.accumulate(acc, item);
    }
    groups
}
