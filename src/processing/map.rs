//! Element mapping.

/// Lazily applies `mapper` to every element, in source order.
///
/// Mapping never mutates the source: to change an entity, return a new value
/// (e.g. [`crate::types::Product::with_price`]).
pub fn map<I, U, F>(seq: I, mapper: F) -> impl Iterator<Item = U>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> U,
{
    seq.into_iter().map(mapper)
}

/// Eager map whose mapper may fail.
///
/// The first `Err` stops evaluation and is returned unchanged.
pub fn try_map<I, U, E, F>(seq: I, mapper: F) -> Result<Vec<U>, E>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Result<U, E>,
{
    seq.into_iter().map(mapper).collect()
}
