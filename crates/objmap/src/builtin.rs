//! Collection converters registered by the predefined profile.

/// Materializes mapped elements into any collection that can be built from
/// an iterator.
pub fn collect<T, C>(items: impl IntoIterator<Item = T>) -> C
where
    C: FromIterator<T>,
{
    items.into_iter().collect()
}
