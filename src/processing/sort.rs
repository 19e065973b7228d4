//! Stable sorting, limiting and top-k selection.

use std::cmp::Ordering;

use crate::error::{QueryError, QueryResult};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

impl Direction {
    fn apply(self, ord: Ordering) -> Ordering {
        match self {
            Self::Ascending => ord,
            Self::Descending => ord.reverse(),
        }
    }
}

// Incomparable keys (NaN) are treated as equal so the sort stays total and stable.
fn compare<K: PartialOrd>(a: &K, b: &K) -> Ordering {
    a.partial_cmp(b).unwrap_or(Ordering::Equal)
}

fn sort_keyed<T, K: PartialOrd>(mut keyed: Vec<(K, T)>, direction: Direction) -> Vec<T> {
    // `sort_by` is stable: equal keys keep their input order in both directions.
    keyed.sort_by(|a, b| direction.apply(compare(&a.0, &b.0)));
    keyed.into_iter().map(|(_, item)| item).collect()
}

/// Stable sort by an extracted key. `key` runs exactly once per element.
pub fn sort_by<I, K, F>(seq: I, mut key: F, direction: Direction) -> Vec<I::Item>
where
    I: IntoIterator,
    K: PartialOrd,
    F: FnMut(&I::Item) -> K,
{
    let keyed = seq.into_iter().map(|item| (key(&item), item)).collect();
    sort_keyed(keyed, direction)
}

/// [`sort_by`] with a fallible key; the first `Err` is returned unchanged.
pub fn try_sort_by<I, K, E, F>(seq: I, mut key: F, direction: Direction) -> Result<Vec<I::Item>, E>
where
    I: IntoIterator,
    K: PartialOrd,
    F: FnMut(&I::Item) -> Result<K, E>,
{
    let keyed = seq
        .into_iter()
        .map(|item| key(&item).map(|k| (k, item)))
        .collect::<Result<Vec<_>, E>>()?;
    Ok(sort_keyed(keyed, direction))
}

/// The first `k` elements of the stable sort of `seq`.
///
/// - `k <= 0` returns an empty vector (the key function is never called).
/// - Fewer than `k` elements returns all of them, sorted.
pub fn top_k<I, K, F>(seq: I, key: F, k: i64, direction: Direction) -> Vec<I::Item>
where
    I: IntoIterator,
    K: PartialOrd,
    F: FnMut(&I::Item) -> K,
{
    if k <= 0 {
        return Vec::new();
    }
    let mut out = sort_by(seq, key, direction);
    out.truncate(clamp_len(k));
    out
}

/// [`top_k`] with a fallible key; the first `Err` is returned unchanged.
pub fn try_top_k<I, K, E, F>(seq: I, key: F, k: i64, direction: Direction) -> Result<Vec<I::Item>, E>
where
    I: IntoIterator,
    K: PartialOrd,
    F: FnMut(&I::Item) -> Result<K, E>,
{
    if k <= 0 {
        return Ok(Vec::new());
    }
    let mut out = try_sort_by(seq, key, direction)?;
    out.truncate(clamp_len(k));
    Ok(out)
}

/// Lazily takes at most `k` elements.
///
/// Unlike [`top_k`], a negative `k` is a caller mistake and fails with
/// [`QueryError::InvalidArgument`].
pub fn limit<I>(seq: I, k: i64) -> QueryResult<impl Iterator<Item = I::Item>>
where
    I: IntoIterator,
{
    if k < 0 {
        return Err(QueryError::invalid(format!("limit must be >= 0, got {k}")));
    }
    Ok(seq.into_iter().take(clamp_len(k)))
}

fn clamp_len(k: i64) -> usize {
    usize::try_from(k).unwrap_or(usize::MAX)
}
