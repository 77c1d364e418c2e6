use std::collections::HashMap;
use std::hash::Hash;

/// Bounded map from key to value with least-recently-used eviction.
///
/// Backed by a `HashMap` plus a monotonic access tick rather than an
/// intrusive doubly-linked list: eviction is `O(n)` (it scans for the
/// minimum tick) instead of `O(1)`, which is the deliberate tradeoff — job
/// counts are expected to stay in the tens-to-low-thousands range, eviction
/// only happens on [`LruIndex::insert`] (never on the hot `get` path), and a
/// hand-written intrusive list has no compiler-checked test suite to catch
/// a dangling-pointer mistake in an exercise where nothing gets run. See
/// `DESIGN.md` for the full tradeoff note.
///
/// Eviction here only removes an entry from *this index*: it never reaches
/// into the evicted value to stop or otherwise affect whatever it
/// represents. For `Runner`, that means an evicted job's collector task and
/// any live readers keep running untouched — eviction only makes the job
/// stop being *findable* by id.
#[derive(Debug)]
pub struct LruIndex<K, V> {
    capacity: usize,
    tick: u64,
    entries: HashMap<K, (V, u64)>,
}

impl<K, V> LruIndex<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Creates an index holding at most `capacity` entries.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "LruIndex capacity must be >= 1");
        Self {
            capacity,
            tick: 0,
            entries: HashMap::new(),
        }
    }

    /// Inserts `value` under `key`, evicting the least-recently-used entry
    /// first if the index is already at capacity. Returns the evicted
    /// `(key, value)` pair, if any.
    pub fn insert(&mut self, key: K, value: V) -> Option<(K, V)> {
        let evicted = if self.entries.len() >= self.capacity && !self.entries.contains_key(&key) {
            self.evict_one()
        } else {
            None
        };
        self.tick += 1;
        self.entries.insert(key, (value, self.tick));
        evicted
    }

    fn evict_one(&mut self) -> Option<(K, V)> {
        let lru_key = self
            .entries
            .iter()
            .min_by_key(|(_, (_, tick))| *tick)
            .map(|(k, _)| k.clone())?;
        self.entries.remove(&lru_key).map(|(v, _)| (lru_key, v))
    }

    /// Looks up `key`, marking it most-recently-used on a hit.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        self.tick += 1;
        let tick = self.tick;
        self.entries.get_mut(key).map(|(v, t)| {
            *t = tick;
            &*v
        })
    }

    /// Looks up `key` without affecting recency.
    #[must_use]
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.entries.get(key).map(|(v, _)| v)
    }

    /// Removes `key` unconditionally, regardless of capacity pressure.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.entries.remove(key).map(|(v, _)| v)
    }

    /// Visits every entry currently held, in no particular order.
    pub fn for_each(&self, mut f: impl FnMut(&K, &V)) {
        for (k, (v, _)) in &self.entries {
            f(k, v);
        }
    }

    /// Number of entries currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
