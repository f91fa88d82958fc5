//! Keyed cache of shared, reference-counted resources.
//!
//! A [`ResourcePool`] maps an id to a resource built on demand by a factory.
//! Every [`Handle`] for an id shares one allocation while any handle is live.
//! When the last handle is dropped the entry forgets itself, so the next
//! [`get`](ResourcePool::get) builds the resource again.
//!
//! The pool is thread safe: a single mutex guards lookup, insertion and
//! eviction. The factory runs under that lock, so it runs exactly once per
//! live id and must not call back into the same pool.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;
use std::hash::Hash;
use std::ops::Deref;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

type Slots<K, R> = Mutex<HashMap<K, Weak<Entry<K, R>>>>;

// ---------------------------------------------------------------------------
// Entry
// ---------------------------------------------------------------------------

struct Entry<K: Eq + Hash, R> {
    key: K,
    value: R,
    /// Back reference to the owning pool's map. Dead once the pool is gone.
    slots: Weak<Slots<K, R>>,
}

impl<K: Eq + Hash, R> Drop for Entry<K, R> {
    fn drop(&mut self) {
        let Some(slots) = self.slots.upgrade() else {
            return;
        };
        let mut map = slots.lock();
        // A concurrent `get` may already have replaced this entry with a
        // fresh one for the same key; only a dead slot is ours to remove.
        if map.get(&self.key).is_some_and(|weak| weak.strong_count() == 0) {
            map.remove(&self.key);
            tracing::trace!(remaining = map.len(), "evicted pool entry");
        }
    }
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Shared handle to a pooled resource.
///
/// Dereferences to the resource. Cloning a handle is cheap and keeps the
/// entry alive.
pub struct Handle<K: Eq + Hash, R>(Arc<Entry<K, R>>);

impl<K: Eq + Hash, R> Handle<K, R> {
    /// The id this resource was built for.
    pub fn key(&self) -> &K {
        &self.0.key
    }

    /// Whether both handles refer to the same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Number of live handles to this resource.
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }
}

impl<K: Eq + Hash, R> Clone for Handle<K, R> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<K: Eq + Hash, R> Deref for Handle<K, R> {
    type Target = R;

    fn deref(&self) -> &R {
        &self.0.value
    }
}

impl<K: Eq + Hash + fmt::Debug, R: fmt::Debug> fmt::Debug for Handle<K, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("key", &self.0.key)
            .field("value", &self.0.value)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// ResourcePool
// ---------------------------------------------------------------------------

type Factory<K, R, E> = Box<dyn Fn(&K) -> Result<R, E> + Send + Sync>;

/// Cache of resources keyed by `K`, built by a fallible factory.
pub struct ResourcePool<K: Eq + Hash, R, E = Infallible> {
    slots: Arc<Slots<K, R>>,
    factory: Factory<K, R, E>,
}

impl<K: Eq + Hash, R, E> ResourcePool<K, R, E> {
    /// Create an empty pool building resources with `factory`.
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn(&K) -> Result<R, E> + Send + Sync + 'static,
    {
        tracing::debug!(resource = std::any::type_name::<R>(), "created resource pool");
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
            factory: Box::new(factory),
        }
    }

    /// Shared handle to the resource for `id`, building it if no handle for
    /// `id` is live.
    ///
    /// A factory error is returned as is and nothing is cached.
    pub fn get<Q>(&self, id: &Q) -> Result<Handle<K, R>, E>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq + ToOwned<Owned = K>,
    {
        let mut map = self.slots.lock();
        if let Some(entry) = map.get(id).and_then(Weak::upgrade) {
            return Ok(Handle(entry));
        }

        let key = id.to_owned();
        let value = (self.factory)(&key)?;
        let entry = Arc::new(Entry {
            key,
            value,
            slots: Arc::downgrade(&self.slots),
        });
        // Replaces a dead slot whose entry has not finished dropping yet.
        map.insert(id.to_owned(), Arc::downgrade(&entry));
        Ok(Handle(entry))
    }

    /// Whether a live resource exists for `id`.
    pub fn contains<Q>(&self, id: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.slots
            .lock()
            .get(id)
            .is_some_and(|weak| weak.strong_count() > 0)
    }

    /// Number of ids with at least one live handle.
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    /// Whether no resource is live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Eq + Hash, R> ResourcePool<K, R, Infallible> {
    /// Create a pool whose factory cannot fail.
    pub fn with_factory<F>(factory: F) -> Self
    where
        F: Fn(&K) -> R + Send + Sync + 'static,
    {
        Self::new(move |key| Ok(factory(key)))
    }

    /// Like [`get`](Self::get) for pools that cannot fail.
    pub fn obtain<Q>(&self, id: &Q) -> Handle<K, R>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq + ToOwned<Owned = K>,
    {
        match self.get(id) {
            Ok(handle) => handle,
            Err(never) => match never {},
        }
    }
}

impl<K: Eq + Hash, R, E> fmt::Debug for ResourcePool<K, R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourcePool")
            .field("live", &self.len())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_pool() -> (ResourcePool<String, String>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let pool = ResourcePool::with_factory(move |id: &String| {
            counter.fetch_add(1, Ordering::SeqCst);
            id.to_uppercase()
        });
        (pool, calls)
    }

    #[test]
    fn live_handles_share_one_resource() {
        let (pool, calls) = counting_pool();
        let a = pool.obtain("grass");
        let b = pool.obtain("grass");
        assert!(a.ptr_eq(&b));
        assert_eq!(*a, "GRASS");
        assert_eq!(a.key(), "grass");
        assert_eq!(a.handle_count(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn distinct_ids_get_distinct_resources() {
        let (pool, calls) = counting_pool();
        let a = pool.obtain("a");
        let b = pool.obtain("b");
        assert!(!a.ptr_eq(&b));
        assert_eq!(pool.len(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn releasing_last_handle_evicts() {
        let (pool, calls) = counting_pool();
        let first = pool.obtain("stone");
        let copy = first.clone();
        drop(first);
        assert!(pool.contains("stone"), "one handle is still live");
        drop(copy);
        assert!(!pool.contains("stone"));
        assert!(pool.is_empty());

        let again = pool.obtain("stone");
        assert_eq!(*again, "STONE");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn factory_error_is_not_cached() {
        let pool: ResourcePool<u32, u32, String> = ResourcePool::new(|id: &u32| {
            if *id == 0 {
                Err("zero".to_owned())
            } else {
                Ok(id * 10)
            }
        });
        assert_eq!(pool.get(&0).unwrap_err(), "zero");
        assert!(pool.is_empty());
        assert_eq!(*pool.get(&4).unwrap(), 40);
    }

    #[test]
    fn handle_outlives_pool() {
        let (pool, _) = counting_pool();
        let handle = pool.obtain("orphan");
        drop(pool);
        assert_eq!(*handle, "ORPHAN");
        drop(handle);
    }

    #[test]
    fn concurrent_gets_share_the_held_resource() {
        let (pool, calls) = counting_pool();
        let held = pool.obtain("shared");
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..100 {
                        let h = pool.obtain("shared");
                        assert!(h.ptr_eq(&held));
                    }
                });
            }
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(held.handle_count(), 1);
    }

    #[test]
    fn concurrent_churn_leaves_pool_consistent() {
        let (pool, _) = counting_pool();
        std::thread::scope(|scope| {
            for t in 0..4 {
                let pool = &pool;
                scope.spawn(move || {
                    for i in 0..200 {
                        let id = format!("k{}", (i + t) % 5);
                        let h = pool.obtain(id.as_str());
                        assert_eq!(*h, id.to_uppercase());
                    }
                });
            }
        });
        assert!(pool.is_empty());
    }
}
