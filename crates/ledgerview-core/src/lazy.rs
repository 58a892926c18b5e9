//! Lazy, restartable map over an iterable source.
//!
//! Nothing is computed until the sequence is traversed, and every traversal
//! calls the transform again. Results are not cached.

/// A lazily mapped sequence.
#[derive(Debug, Clone)]
pub struct LazyMap<F, I> {
    transform: F,
    source: I,
}

/// Map `transform` over `source` lazily.
pub fn map_iter<A, B, F, I>(transform: F, source: I) -> LazyMap<F, I>
where
    F: Fn(A) -> B,
    I: IntoIterator<Item = A>,
{
    LazyMap { transform, source }
}

impl<A, B, F, I> LazyMap<F, I>
where
    F: Fn(A) -> B,
    I: IntoIterator<Item = A> + Clone,
{
    /// Start a fresh traversal.
    pub fn iter(&self) -> std::iter::Map<I::IntoIter, &F> {
        self.source.clone().into_iter().map(&self.transform)
    }

    /// Number of elements, without invoking the transform.
    pub fn len(&self) -> usize {
        self.source.clone().into_iter().count()
    }

    /// Check if the source is empty.
    pub fn is_empty(&self) -> bool {
        self.source.clone().into_iter().next().is_none()
    }

    /// Traverse once and collect, for consumers that need indexed access.
    pub fn materialize(&self) -> Vec<B> {
        self.iter().collect()
    }
}

impl<A, B, F, I> IntoIterator for LazyMap<F, I>
where
    F: Fn(A) -> B,
    I: IntoIterator<Item = A>,
{
    type Item = B;
    type IntoIter = std::iter::Map<I::IntoIter, F>;

    fn into_iter(self) -> Self::IntoIter {
        self.source.into_iter().map(self.transform)
    }
}
