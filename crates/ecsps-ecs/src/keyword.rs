//! Interned values and keywords.
//!
//! [`ValuePool`] interns values by equality: equal values handed to
//! [`intern`](ValuePool::intern) while a handle is live share one
//! allocation. [`Keyword`] is an interned string backed by a process-wide
//! pool, compared by identity. Sprite and animation frame names are
//! keywords.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::pool::{Handle, ResourcePool};

// ---------------------------------------------------------------------------
// ValuePool
// ---------------------------------------------------------------------------

/// A pool whose resources are copies of their own keys.
pub struct ValuePool<V: Eq + Hash> {
    inner: ResourcePool<V, V>,
}

impl<V> ValuePool<V>
where
    V: Clone + Eq + Hash + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            inner: ResourcePool::with_factory(V::clone),
        }
    }

    /// Shared handle to the interned copy of `value`.
    pub fn intern<Q>(&self, value: &Q) -> Handle<V, V>
    where
        V: Borrow<Q>,
        Q: ?Sized + Hash + Eq + ToOwned<Owned = V>,
    {
        self.inner.obtain(value)
    }

    /// Number of distinct live values.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<V> Default for ValuePool<V>
where
    V: Clone + Eq + Hash + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Eq + Hash> fmt::Debug for ValuePool<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValuePool").field("inner", &self.inner).finish()
    }
}

// ---------------------------------------------------------------------------
// Keyword
// ---------------------------------------------------------------------------

static KEYWORDS: OnceLock<ValuePool<String>> = OnceLock::new();

fn keywords() -> &'static ValuePool<String> {
    KEYWORDS.get_or_init(ValuePool::new)
}

/// Immutable interned string.
///
/// Equality is a pointer comparison on the interned allocation, which holds
/// exactly when the names are equal.
///
/// ```
/// use ecsps_ecs::Keyword;
///
/// let a = Keyword::new("player");
/// let b: Keyword = "player".into();
/// assert_eq!(a, b);
/// assert_ne!(a, Keyword::new("enemy"));
/// assert_eq!(a.to_string(), "player");
/// ```
#[derive(Clone)]
pub struct Keyword(Handle<String, String>);

impl Keyword {
    pub fn new(name: &str) -> Self {
        Self(keywords().intern(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of distinct keywords currently live in the process.
    pub fn live_count() -> usize {
        keywords().len()
    }
}

impl PartialEq for Keyword {
    fn eq(&self, other: &Self) -> bool {
        self.0.ptr_eq(&other.0)
    }
}

impl Eq for Keyword {}

impl Hash for Keyword {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl PartialOrd for Keyword {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Keyword {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl Default for Keyword {
    fn default() -> Self {
        Self::new("")
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keyword({:?})", self.as_str())
    }
}

impl From<&str> for Keyword {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Keyword {
    fn from(name: String) -> Self {
        Self::new(&name)
    }
}

impl AsRef<str> for Keyword {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Borrow<str> for Keyword {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl Serialize for Keyword {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Keyword {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Keyword::from)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};

    #[test]
    fn value_pool_interns_equal_values() {
        let pool = ValuePool::<String>::new();
        let a = pool.intern("brick");
        let b = pool.intern(&String::from("brick"));
        let c = pool.intern("coin");
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn value_pool_forgets_released_values() {
        let pool = ValuePool::<u64>::new();
        let first = pool.intern(&7u64);
        drop(first);
        assert!(pool.is_empty());
        let second = pool.intern(&7u64);
        assert_eq!(*second, 7);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn equal_names_make_equal_keywords() {
        let a = Keyword::new("player");
        let b = Keyword::from(String::from("player"));
        assert_eq!(a, b);
        assert!(a.0.ptr_eq(&b.0));
        assert_ne!(a, Keyword::new("Player"));
    }

    #[test]
    fn hash_agrees_with_equality() {
        let mut set = HashSet::new();
        set.insert(Keyword::new("tile"));
        set.insert(Keyword::new("tile"));
        set.insert(Keyword::new("cloud"));
        assert_eq!(set.len(), 2);

        let mut by_name: HashMap<Keyword, u32> = HashMap::new();
        by_name.insert("tile".into(), 1);
        assert_eq!(by_name.get("tile"), Some(&1));
    }

    #[test]
    fn default_is_empty() {
        let k = Keyword::default();
        assert_eq!(k.as_str(), "");
        assert_eq!(k, Keyword::new(""));
    }

    #[test]
    fn formatting() {
        let k = Keyword::new("bush");
        assert_eq!(k.to_string(), "bush");
        assert_eq!(format!("{k:?}"), "Keyword(\"bush\")");
    }

    #[test]
    fn ordering_follows_names() {
        let mut names = vec![Keyword::new("c"), Keyword::new("a"), Keyword::new("b")];
        names.sort();
        let sorted: Vec<&str> = names.iter().map(Keyword::as_str).collect();
        assert_eq!(sorted, vec!["a", "b", "c"]);
    }

    #[test]
    fn serde_as_plain_string() {
        let k = Keyword::new("door");
        let json = serde_json::to_string(&k).unwrap();
        assert_eq!(json, "\"door\"");
        let back: Keyword = serde_json::from_str(&json).unwrap();
        assert_eq!(back, k);
    }

    #[test]
    fn keywords_from_many_threads_agree() {
        let reference = Keyword::new("threaded");
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..50 {
                        assert_eq!(Keyword::new("threaded"), reference);
                    }
                });
            }
        });
    }
}
