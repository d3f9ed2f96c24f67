//! crates/preiter/src/loader.rs
//! Strategies for turning a nested sequence into a recursor.
//!
//! A stack asks its loader for a recursor whenever it enters a nested
//! sequence and hands the recursor back when it leaves. [`DirectLoader`]
//! builds a fresh recursor every time. [`CachedLoader`] keeps released
//! recursors keyed by [`Identity`] so that re-entering a nested sequence
//! reuses whatever the previous visit already pulled.
//!
//! Each stack cursor owns its loader. Two cursors over one stack never share
//! cached recursors, so their positions cannot interfere.

use std::fmt;
use std::sync::Arc;

use logging::trace_cache;

use crate::error::Error;
use crate::identity::Identity;
use crate::sizeable::{Sizeable, SizeableCache};

/// A nested sequence a stack can descend into.
pub trait Expand: Send + Sync {
    /// Cursor type used while the stack is inside this sequence.
    type Recursor: Sizeable + Send;

    /// Cache key shared by every handle to the same nested sequence.
    fn key(&self) -> Identity;

    /// Builds a recursor positioned at [`StartOfData`](crate::Term::StartOfData).
    fn recursor(&self) -> Self::Recursor;
}

/// Produces and takes back recursors for one stack cursor.
pub trait Loader<R: Expand>: Send {
    /// Returns a recursor for `recursable`. The stack jumps it to the start
    /// terminal of the travel direction before use.
    fn load(&mut self, recursable: &R) -> Result<R::Recursor, Error>;

    /// Returns a recursor the stack no longer needs.
    fn release(&mut self, identity: Identity, recursor: R::Recursor);
}

/// Owned, type-erased loader.
pub type BoxLoader<R> = Box<dyn Loader<R>>;

/// Builds one loader per stack cursor.
pub type LoaderFactory<R> = Arc<dyn Fn() -> BoxLoader<R> + Send + Sync>;

/// Loader that builds a new recursor on every entry.
#[derive(Clone, Copy, Debug, Default)]
pub struct DirectLoader;

impl<R: Expand> Loader<R> for DirectLoader {
    fn load(&mut self, recursable: &R) -> Result<R::Recursor, Error> {
        Ok(recursable.recursor())
    }

    fn release(&mut self, _identity: Identity, _recursor: R::Recursor) {}
}

/// Loader that keeps released recursors in a [`SizeableCache`].
pub struct CachedLoader<R: Expand> {
    cache: SizeableCache<Identity, R::Recursor>,
}

impl<R: Expand> fmt::Debug for CachedLoader<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedLoader").field("cache", &self.cache).finish()
    }
}

impl<R: Expand> CachedLoader<R> {
    /// Creates a loader whose cache holds at most `size_limit` buffered
    /// elements.
    #[must_use]
    pub fn new(size_limit: usize) -> Self {
        Self {
            cache: SizeableCache::new(size_limit),
        }
    }

    /// The underlying cache.
    #[must_use]
    pub const fn cache(&self) -> &SizeableCache<Identity, R::Recursor> {
        &self.cache
    }
}

impl<R: Expand> Loader<R> for CachedLoader<R> {
    fn load(&mut self, recursable: &R) -> Result<R::Recursor, Error> {
        let identity = recursable.key();
        if let Some(recursor) = self.cache.take(&identity) {
            trace_cache!(sequence = %identity, "hit");
            return Ok(recursor);
        }
        trace_cache!(sequence = %identity, "miss");
        Ok(recursable.recursor())
    }

    fn release(&mut self, identity: Identity, recursor: R::Recursor) {
        self.cache.insert(identity, recursor);
    }
}

/// Factory for [`DirectLoader`].
#[must_use]
pub fn direct<R: Expand + 'static>() -> LoaderFactory<R> {
    Arc::new(|| -> BoxLoader<R> { Box::new(DirectLoader) })
}

/// Factory for [`CachedLoader`] with the given size limit.
#[must_use]
pub fn cached<R: Expand + 'static>(size_limit: usize) -> LoaderFactory<R> {
    Arc::new(move || -> BoxLoader<R> { Box::new(CachedLoader::<R>::new(size_limit)) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counted(usize);

    impl Sizeable for Counted {
        fn size(&self) -> usize {
            self.0
        }
    }

    struct Resource {
        identity: Identity,
        builds: AtomicUsize,
    }

    impl Expand for Resource {
        type Recursor = Counted;

        fn key(&self) -> Identity {
            self.identity
        }

        fn recursor(&self) -> Counted {
            self.builds.fetch_add(1, Ordering::SeqCst);
            Counted(3)
        }
    }

    fn resource() -> Resource {
        Resource {
            identity: Identity::fresh(),
            builds: AtomicUsize::new(0),
        }
    }

    #[test]
    fn direct_loader_builds_every_time() {
        let nested = resource();
        let mut loader = DirectLoader;
        let first = Loader::<Resource>::load(&mut loader, &nested).expect("load");
        Loader::<Resource>::release(&mut loader, nested.identity, first);
        let _second = Loader::<Resource>::load(&mut loader, &nested).expect("load");
        assert_eq!(nested.builds.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn cached_loader_reuses_released_recursor() {
        let nested = resource();
        let mut loader = CachedLoader::<Resource>::new(10);
        let first = loader.load(&nested).expect("load");
        loader.release(nested.identity, first);
        assert_eq!(loader.cache().len(), 1);

        let again = loader.load(&nested).expect("load");
        assert_eq!(again.0, 3);
        assert_eq!(nested.builds.load(Ordering::SeqCst), 1);
        assert!(loader.cache().is_empty());
    }

    #[test]
    fn cached_loader_rebuilds_after_eviction() {
        let nested = resource();
        let mut loader = CachedLoader::<Resource>::new(2);
        let first = loader.load(&nested).expect("load");
        loader.release(nested.identity, first);
        let _ = loader.load(&nested).expect("load");
        assert_eq!(nested.builds.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn factories_hand_out_independent_loaders() {
        let nested = resource();
        let factory = cached::<Resource>(10);
        let mut a = factory();
        let mut b = factory();
        let recursor = a.load(&nested).expect("load");
        a.release(nested.identity, recursor);
        let _ = b.load(&nested).expect("load");
        assert_eq!(nested.builds.load(Ordering::SeqCst), 2);
    }
}
