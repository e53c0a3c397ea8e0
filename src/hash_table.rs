//! A low-level hash table using separate chaining.
//!
//! [`HashTable`] does not know how to hash its values. Every operation takes
//! the 64-bit hash of the key being looked up plus an equality predicate, and
//! the table stores that hash next to each value. Growth reuses the stored
//! hashes, so the hasher is never consulted again once a value is inside.

use alloc::vec::Vec;
use core::fmt::Debug;

use crate::error::Error;

/// Number of buckets used when no capacity is requested.
pub const DEFAULT_CAPACITY: usize = 8;

const GROWTH_FACTOR: usize = 2;

// Maximum load factor, as a ratio: grow once `len / capacity > 3 / 4`.
const MAX_LOAD_NUMERATOR: u128 = 3;
const MAX_LOAD_DENOMINATOR: u128 = 4;

#[inline(always)]
fn exceeds_max_load(populated: usize, capacity: usize) -> bool {
    populated as u128 * MAX_LOAD_DENOMINATOR > capacity as u128 * MAX_LOAD_NUMERATOR
}

#[inline(always)]
fn bucket_index(hash: u64, capacity: usize) -> usize {
    if capacity == 0 {
        return 0;
    }
    (hash % capacity as u64) as usize
}

type Bucket<V> = Vec<(u64, V)>;

/// Statistics about the shape of a table's chains.
///
/// Requires the `stats` feature outside of tests.
#[cfg(any(test, feature = "stats"))]
#[derive(Debug, Clone)]
pub struct DebugStats {
    /// Number of elements currently in the table
    pub populated: usize,
    /// Number of buckets
    pub buckets: usize,
    /// Number of buckets holding at least one element
    pub occupied_buckets: usize,
    /// Length of the longest chain
    pub longest_chain: usize,
    /// Load factor (populated / buckets)
    pub load_factor: f64,
    /// Total heap memory in bytes held by the bucket array and chains
    pub total_bytes: usize,
}

#[cfg(any(test, feature = "stats"))]
impl DebugStats {
    /// Pretty-print the debug statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Hash Table Debug Statistics ===");
        println!(
            "Population: {} in {} buckets ({:.2}% load factor)",
            self.populated,
            self.buckets,
            self.load_factor * 100.0
        );
        println!(
            "Bucket Usage: {}/{} ({:.2}% non-empty)",
            self.occupied_buckets,
            self.buckets,
            if self.buckets == 0 {
                0.0
            } else {
                (self.occupied_buckets as f64 / self.buckets as f64) * 100.0
            }
        );
        println!("Longest Chain: {}", self.longest_chain);
        println!("Total Allocated: {} bytes", self.total_bytes);
    }
}

/// A hash table that resolves collisions by chaining.
///
/// `HashTable<V>` owns an array of buckets, each holding a chain of
/// `(hash, V)` pairs. A value with hash `h` always lives in bucket
/// `h % capacity()`. Callers provide the hash and an equality predicate for
/// each operation; the table never hashes anything itself.
///
/// After every insertion the load factor `len / capacity` is checked, and if
/// it exceeds `0.75` the bucket array doubles and every value is moved to its
/// bucket under the new capacity. Capacity never shrinks.
///
/// ## Example
///
/// ```rust
/// # use core::hash::Hash;
/// # use core::hash::Hasher;
/// #
/// # use chain_hash::hash_table::HashTable;
/// # use siphasher::sip::SipHasher;
/// #
/// # #[derive(Debug, PartialEq)]
/// # struct Person {
/// #     id: u64,
/// #     name: String,
/// # }
/// #
/// # fn hash_id(id: u64) -> u64 {
/// #     let mut hasher = SipHasher::new();
/// #     id.hash(&mut hasher);
/// #     hasher.finish()
/// # }
///
/// let mut table = HashTable::with_capacity(4);
/// let hash = hash_id(123);
///
/// match table.entry(hash, |p: &Person| p.id == 123) {
///     chain_hash::hash_table::Entry::Vacant(entry) => {
///         entry.insert(Person {
///             id: 123,
///             name: "Alice".to_string(),
///         });
///     }
///     chain_hash::hash_table::Entry::Occupied(_) => {
///         println!("Person already exists");
///     }
/// }
///
/// assert_eq!(table.find(hash, |p| p.id == 123).map(|p| p.name.as_str()), Some("Alice"));
/// ```
#[derive(Clone)]
pub struct HashTable<V> {
    buckets: Vec<Bucket<V>>,
    populated: usize,
}

impl<V> Debug for HashTable<V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        struct Chain<'a, V>(&'a [(u64, V)]);

        impl<V> Debug for Chain<'_, V> {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.debug_list()
                    .entries(self.0.iter().map(|(hash, _)| hash))
                    .finish()
            }
        }

        f.debug_struct("HashTable")
            .field("capacity", &self.capacity())
            .field("populated", &self.populated)
            .field(
                "chains",
                &self
                    .buckets
                    .iter()
                    .map(|bucket| Chain(bucket))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl<V> Default for HashTable<V> {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl<V> HashTable<V> {
    /// Creates a new hash table with exactly `capacity` buckets.
    ///
    /// A capacity of zero is clamped to a single bucket.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::hash_table::HashTable;
    /// #
    /// let table: HashTable<String> = HashTable::with_capacity(100);
    /// assert_eq!(table.capacity(), 100);
    ///
    /// let table: HashTable<String> = HashTable::with_capacity(0);
    /// assert_eq!(table.capacity(), 1);
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = if capacity == 0 {
            log::debug!("requested zero buckets, clamping to 1");
            1
        } else {
            capacity
        };

        let mut buckets = Vec::with_capacity(capacity);
        buckets.resize_with(capacity, Vec::new);

        Self {
            buckets,
            populated: 0,
        }
    }

    /// Returns the number of buckets.
    ///
    /// This starts at the requested capacity and doubles each time the load
    /// factor is exceeded.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Returns the number of elements in the table.
    pub fn len(&self) -> usize {
        self.populated
    }

    /// Returns `true` if the table contains no elements.
    pub fn is_empty(&self) -> bool {
        self.populated == 0
    }

    /// Returns `len / capacity`.
    ///
    /// Never exceeds `0.75` once an insertion has returned.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::hash_table::HashTable;
    /// #
    /// let mut table: HashTable<u64> = HashTable::with_capacity(4);
    /// table.entry(1, |&v| v == 1).or_insert(1);
    /// assert_eq!(table.load_factor(), 0.25);
    /// ```
    pub fn load_factor(&self) -> f64 {
        if self.buckets.is_empty() {
            return 0.0;
        }
        self.populated as f64 / self.buckets.len() as f64
    }

    /// Returns the bucket a value with `hash` lives in under the current
    /// capacity.
    ///
    /// The result is only meaningful until the next insertion, which may grow
    /// the table.
    pub fn bucket_index(&self, hash: u64) -> usize {
        bucket_index(hash, self.buckets.len())
    }

    /// Removes all elements, keeping the current capacity.
    pub fn clear(&mut self) {
        for bucket in self.buckets.iter_mut() {
            bucket.clear();
        }
        self.populated = 0;
    }

    /// Finds a value by hash and equality predicate.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::hash_table::HashTable;
    /// #
    /// let mut table: HashTable<(u32, &str)> = HashTable::with_capacity(4);
    /// table.entry(7, |&(k, _)| k == 7).or_insert((7, "seven"));
    ///
    /// assert_eq!(table.find(7, |&(k, _)| k == 7), Some(&(7, "seven")));
    /// assert_eq!(table.find(8, |&(k, _)| k == 8), None);
    /// ```
    pub fn find(&self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<&V> {
        self.buckets[self.bucket_index(hash)]
            .iter()
            .find(|(stored, value)| *stored == hash && eq(value))
            .map(|(_, value)| value)
    }

    /// Finds a value by hash and equality predicate, returning a mutable
    /// reference.
    pub fn find_mut(&mut self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<&mut V> {
        let index = self.bucket_index(hash);
        self.buckets[index]
            .iter_mut()
            .find(|(stored, value)| *stored == hash && eq(value))
            .map(|(_, value)| value)
    }

    /// Removes and returns the value matching `hash` and `eq`.
    ///
    /// Removing an absent value is a no-op that returns `None`. The capacity
    /// is left unchanged either way.
    pub fn remove(&mut self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<V> {
        let index = self.bucket_index(hash);
        let bucket = &mut self.buckets[index];
        let position = bucket
            .iter()
            .position(|(stored, value)| *stored == hash && eq(value))?;

        self.populated -= 1;
        Some(bucket.remove(position).1)
    }

    /// Gets the entry for the value matching `hash` and `eq`, for in-place
    /// manipulation.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::hash_table::Entry;
    /// # use chain_hash::hash_table::HashTable;
    /// #
    /// let mut table: HashTable<(u32, u32)> = HashTable::with_capacity(4);
    ///
    /// match table.entry(3, |&(k, _)| k == 3) {
    ///     Entry::Vacant(entry) => {
    ///         entry.insert((3, 30));
    ///     }
    ///     Entry::Occupied(_) => unreachable!("table is empty"),
    /// }
    ///
    /// table.entry(3, |&(k, _)| k == 3).and_modify(|(_, v)| *v += 1);
    /// assert_eq!(table.find(3, |&(k, _)| k == 3), Some(&(3, 31)));
    /// ```
    pub fn entry(&mut self, hash: u64, eq: impl Fn(&V) -> bool) -> Entry<'_, V> {
        let bucket = self.bucket_index(hash);
        let position = self.buckets[bucket]
            .iter()
            .position(|(stored, value)| *stored == hash && eq(value));

        match position {
            Some(position) => Entry::Occupied(OccupiedEntry {
                table: self,
                bucket,
                position,
            }),
            None => Entry::Vacant(VacantEntry { table: self, hash }),
        }
    }

    /// Returns an iterator over all values, in no particular order.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            buckets: self.buckets.iter(),
            chain: [].iter(),
            remaining: self.populated,
        }
    }

    /// Removes and yields every value, in no particular order.
    ///
    /// The table is empty once the iterator is dropped, even if it was not
    /// run to completion. Capacity is kept.
    pub fn drain(&mut self) -> Drain<'_, V> {
        Drain {
            table: self,
            bucket_index: 0,
        }
    }

    /// Appends a value known to be absent and grows the table if the load
    /// factor is now exceeded.
    ///
    /// Returns the value's new location, re-resolved after any growth.
    fn insert_absent(&mut self, hash: u64, value: V) -> Result<&mut V, Error> {
        let index = self.bucket_index(hash);
        self.buckets[index].push((hash, value));
        self.populated += 1;

        if exceeds_max_load(self.populated, self.buckets.len()) {
            self.grow();
        }

        // Doubling maps each new bucket back to exactly one old bucket and
        // relocation keeps chain order, so the value is still its chain's tail.
        let capacity = self.buckets.len();
        let index = self.bucket_index(hash);
        match self.buckets[index].last_mut() {
            Some((stored, value)) if *stored == hash => Ok(value),
            _ => Err(Error::EntryLost {
                bucket: index,
                capacity,
            }),
        }
    }

    #[cold]
    fn grow(&mut self) {
        let old_capacity = self.buckets.len();
        let new_capacity = old_capacity
            .checked_mul(GROWTH_FACTOR)
            .expect("capacity overflow");

        let mut buckets: Vec<Bucket<V>> = Vec::with_capacity(new_capacity);
        buckets.resize_with(new_capacity, Vec::new);

        for (hash, value) in self.buckets.drain(..).flatten() {
            buckets[bucket_index(hash, new_capacity)].push((hash, value));
        }
        self.buckets = buckets;

        log::trace!(
            "grew table from {} to {} buckets ({} entries)",
            old_capacity,
            new_capacity,
            self.populated
        );
        debug_assert!(!exceeds_max_load(self.populated, self.buckets.len()));
    }

    /// Counts buckets by chain length: index `n` holds the number of buckets
    /// with exactly `n` entries.
    ///
    /// Requires the `stats` feature outside of tests.
    #[cfg(any(test, feature = "stats"))]
    pub fn chain_histogram(&self) -> Vec<usize> {
        let longest = self.buckets.iter().map(Vec::len).max().unwrap_or(0);
        let mut hist = alloc::vec![0usize; longest + 1];
        for bucket in self.buckets.iter() {
            hist[bucket.len()] += 1;
        }
        hist
    }

    /// Returns chain statistics for debugging.
    ///
    /// Requires the `stats` feature outside of tests.
    #[cfg(any(test, feature = "stats"))]
    pub fn debug_stats(&self) -> DebugStats {
        let occupied_buckets = self.buckets.iter().filter(|b| !b.is_empty()).count();
        let longest_chain = self.buckets.iter().map(Vec::len).max().unwrap_or(0);
        let chain_bytes = self
            .buckets
            .iter()
            .map(|b| b.capacity() * core::mem::size_of::<(u64, V)>())
            .sum::<usize>();

        DebugStats {
            populated: self.populated,
            buckets: self.buckets.len(),
            occupied_buckets,
            longest_chain,
            load_factor: self.load_factor(),
            total_bytes: self.buckets.capacity() * core::mem::size_of::<Bucket<V>>() + chain_bytes,
        }
    }

    /// Pretty-prints the chain-length histogram horizontally using stdout.
    #[cfg(all(any(test, feature = "stats"), feature = "std"))]
    pub fn print_chain_histogram(&self) {
        let hist = self.chain_histogram();
        let max = *hist.iter().max().unwrap_or(&0);
        if max == 0 {
            println!("chain histogram: empty");
            return;
        }

        let max_bar = 60usize;
        println!(
            "chain histogram ({} entries, {} buckets):",
            self.populated,
            self.buckets.len()
        );

        for (len, &count) in hist.iter().enumerate() {
            let width = (count * max_bar).div_ceil(max);
            println!("{:>3} | {} ({})", len, "█".repeat(width), count);
        }
    }
}

/// A view into a single entry in the hash table, which may be vacant or
/// occupied.
///
/// This enum is constructed from the [`entry`] method on [`HashTable`].
///
/// [`entry`]: HashTable::entry
pub enum Entry<'a, V> {
    /// A vacant entry - no matching value is in the table
    Vacant(VacantEntry<'a, V>),
    /// An occupied entry - a matching value is in the table
    Occupied(OccupiedEntry<'a, V>),
}

impl<'a, V> Entry<'a, V> {
    /// Inserts `default` if the entry is vacant and returns a mutable
    /// reference to the value.
    pub fn or_insert(self, default: V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }

    /// Inserts the result of `default` if the entry is vacant and returns a
    /// mutable reference to the value.
    pub fn or_insert_with(self, default: impl FnOnce() -> V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }

    /// Applies `f` to an occupied entry's value. Vacant entries pass through.
    pub fn and_modify(self, f: impl FnOnce(&mut V)) -> Self {
        match self {
            Entry::Occupied(mut entry) => {
                f(entry.get_mut());
                Entry::Occupied(entry)
            }
            Entry::Vacant(entry) => Entry::Vacant(entry),
        }
    }

    /// Inserts `V::default()` if the entry is vacant and returns a mutable
    /// reference to the value.
    pub fn or_default(self) -> &'a mut V
    where
        V: Default,
    {
        self.or_insert_with(V::default)
    }
}

/// A view into a vacant entry in the hash table.
///
/// Created by [`HashTable::entry`] when no value matches.
pub struct VacantEntry<'a, V> {
    table: &'a mut HashTable<V>,
    hash: u64,
}

impl<'a, V> VacantEntry<'a, V> {
    /// The hash this entry was looked up with.
    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// Inserts `value` and returns a mutable reference to it.
    ///
    /// The table may grow as a result, in which case the returned reference
    /// points into the new bucket array.
    ///
    /// # Panics
    ///
    /// Panics if the value cannot be found again after growth, which means
    /// the table's invariants are broken. See [`VacantEntry::try_insert`].
    pub fn insert(self, value: V) -> &'a mut V {
        match self.try_insert(value) {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }

    /// Inserts `value` and returns a mutable reference to it, reporting a
    /// broken table as an [`Error`] rather than panicking.
    pub fn try_insert(self, value: V) -> Result<&'a mut V, Error> {
        let table = self.table;
        table.insert_absent(self.hash, value)
    }
}

/// A view into an occupied entry in the hash table.
///
/// Created by [`HashTable::entry`] when a value matches.
pub struct OccupiedEntry<'a, V> {
    table: &'a mut HashTable<V>,
    bucket: usize,
    position: usize,
}

impl<'a, V> OccupiedEntry<'a, V> {
    /// Gets a reference to the value in the entry.
    pub fn get(&self) -> &V {
        &self.table.buckets[self.bucket][self.position].1
    }

    /// Gets a mutable reference to the value in the entry.
    pub fn get_mut(&mut self) -> &mut V {
        &mut self.table.buckets[self.bucket][self.position].1
    }

    /// Converts the entry into a mutable reference bound to the table's
    /// borrow.
    pub fn into_mut(self) -> &'a mut V {
        let table = self.table;
        &mut table.buckets[self.bucket][self.position].1
    }

    /// Removes the value from the table and returns it.
    pub fn remove(self) -> V {
        self.table.populated -= 1;
        self.table.buckets[self.bucket].remove(self.position).1
    }
}

/// An iterator over the values in a [`HashTable`].
///
/// Created by [`HashTable::iter`].
pub struct Iter<'a, V> {
    buckets: core::slice::Iter<'a, Bucket<V>>,
    chain: core::slice::Iter<'a, (u64, V)>,
    remaining: usize,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((_, value)) = self.chain.next() {
                self.remaining -= 1;
                return Some(value);
            }
            self.chain = self.buckets.next()?.iter();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}

/// A draining iterator over the values in a [`HashTable`].
///
/// Created by [`HashTable::drain`].
pub struct Drain<'a, V> {
    table: &'a mut HashTable<V>,
    bucket_index: usize,
}

impl<V> Drop for Drain<'_, V> {
    fn drop(&mut self) {
        for _ in &mut *self {}
    }
}

impl<'a, V> Iterator for Drain<'a, V> {
    type Item = V;

    fn next(&mut self) -> Option<Self::Item> {
        while self.bucket_index < self.table.buckets.len() {
            if let Some((_, value)) = self.table.buckets[self.bucket_index].pop() {
                self.table.populated -= 1;
                return Some(value);
            }
            self.bucket_index += 1;
        }

        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.table.populated, Some(self.table.populated))
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::string::ToString;
    use alloc::vec;
    use core::hash::Hasher;

    use rand::TryRngCore;
    use rand::rngs::OsRng;
    use siphasher::sip::SipHasher;

    use super::*;

    struct HashState {
        k0: u64,
        k1: u64,
    }

    impl HashState {
        fn default() -> Self {
            let mut rng = OsRng;
            Self {
                k0: rng.try_next_u64().unwrap(),
                k1: rng.try_next_u64().unwrap(),
            }
        }

        fn build_hasher(&self) -> SipHasher {
            SipHasher::new_with_keys(self.k0, self.k1)
        }
    }

    #[derive(Debug, PartialEq, Eq, Clone)]
    struct Item {
        key: u64,
        value: i32,
    }

    fn hash_key(state: &HashState, key: u64) -> u64 {
        let mut h = state.build_hasher();
        h.write_u64(key);
        h.finish()
    }

    fn insert_item(table: &mut HashTable<Item>, state: &HashState, key: u64, value: i32) {
        let hash = hash_key(state, key);
        match table.entry(hash, |v| v.key == key) {
            Entry::Vacant(v) => {
                v.insert(Item { key, value });
            }
            Entry::Occupied(_) => panic!("unexpected occupied for {}: {:#?}", key, table),
        }
    }

    fn assert_placement<V>(table: &HashTable<V>) {
        for (index, bucket) in table.buckets.iter().enumerate() {
            for (hash, _) in bucket {
                assert_eq!(
                    table.bucket_index(*hash),
                    index,
                    "hash {:#018X} misplaced: {:#?}",
                    hash,
                    table
                );
            }
        }
    }

    #[test]
    fn insert_and_find() {
        let state = HashState::default();
        let mut table: HashTable<Item> = HashTable::with_capacity(0);
        for k in 0..32u64 {
            insert_item(&mut table, &state, k, (k as i32) * 2);
            let hash = hash_key(&state, k);
            assert_eq!(
                table.find(hash, |v| v.key == k),
                Some(&Item {
                    key: k,
                    value: (k as i32) * 2
                }),
                "{:#?}",
                table
            );
        }
        assert_eq!(table.len(), 32);
        for k in 0..32u64 {
            let hash = hash_key(&state, k);
            assert_eq!(
                table.find(hash, |v| v.key == k),
                Some(&Item {
                    key: k,
                    value: (k as i32) * 2
                }),
                "{:#?}",
                table
            );
        }

        let miss_hash = hash_key(&state, 999);
        assert!(table.find(miss_hash, |v| v.key == 999).is_none());
    }

    #[test]
    fn duplicate_entry_is_occupied() {
        let state = HashState::default();
        let mut table: HashTable<Item> = HashTable::with_capacity(4);
        let k = 42u64;
        let hash = hash_key(&state, k);

        match table.entry(hash, |v| v.key == k) {
            Entry::Vacant(v) => {
                v.insert(Item { key: k, value: 7 });
            }
            Entry::Occupied(_) => panic!("should be vacant first time"),
        }

        match table.entry(hash, |v| v.key == k) {
            Entry::Occupied(mut occ) => {
                let prev_value = occ.get().value;
                *occ.get_mut() = Item { key: k, value: 11 };
                assert_eq!(prev_value, 7, "{:#?}", table);
            }
            Entry::Vacant(_) => panic!("should be occupied: {}#{:02X} in {:#?}", k, hash, table),
        }

        assert_eq!(table.len(), 1);
        let found = table.find(hash, |v| v.key == k).unwrap();
        assert_eq!(found.value, 11);
    }

    #[test]
    fn find_mut_and_modify() {
        let state = HashState::default();
        let mut table: HashTable<Item> = HashTable::with_capacity(2);
        for k in 0..5u64 {
            insert_item(&mut table, &state, k, 1);
        }

        for k in 0..5u64 {
            let hash = hash_key(&state, k);
            if let Some(v) = table.find_mut(hash, |v| v.key == k) {
                v.value += 9;
            }
        }
        for k in 0..5u64 {
            let hash = hash_key(&state, k);
            let v = table.find(hash, |v| v.key == k).unwrap();
            assert_eq!(v.value, 10);
        }
    }

    #[test]
    fn remove_items() {
        let state = HashState::default();
        let mut table: HashTable<Item> = HashTable::with_capacity(4);
        for k in 0..8u64 {
            insert_item(&mut table, &state, k, k as i32);
        }

        for k in (0..8u64).step_by(2) {
            let hash = hash_key(&state, k);
            let removed = table.remove(hash, |v| v.key == k);
            assert_eq!(
                removed,
                Some(Item {
                    key: k,
                    value: k as i32
                })
            );
        }
        assert_eq!(table.len(), 4);

        for k in 0..8u64 {
            let hash = hash_key(&state, k);
            assert_eq!(table.find(hash, |v| v.key == k).is_some(), k % 2 == 1);
        }
    }

    #[test]
    fn remove_absent_is_noop() {
        let state = HashState::default();
        let mut table: HashTable<Item> = HashTable::with_capacity(4);
        insert_item(&mut table, &state, 1, 1);

        let capacity = table.capacity();
        let hash = hash_key(&state, 2);
        assert_eq!(table.remove(hash, |v| v.key == 2), None);
        assert_eq!(table.len(), 1);
        assert_eq!(table.capacity(), capacity);

        let mut empty: HashTable<Item> = HashTable::with_capacity(4);
        assert_eq!(empty.remove(hash, |v| v.key == 2), None);
        assert!(empty.is_empty());
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let table: HashTable<u64> = HashTable::with_capacity(0);
        assert_eq!(table.capacity(), 1);
        assert_eq!(table.bucket_index(u64::MAX), 0);
        assert_eq!(table.load_factor(), 0.0);
    }

    #[test]
    fn bucket_index_is_hash_mod_capacity() {
        assert_eq!(bucket_index(0, 0), 0);
        assert_eq!(bucket_index(12345, 0), 0);
        assert_eq!(bucket_index(10, 4), 2);
        assert_eq!(bucket_index(u64::MAX, 7), (u64::MAX % 7) as usize);

        let table: HashTable<u64> = HashTable::with_capacity(5);
        assert_eq!(table.bucket_index(17), 2);
    }

    #[test]
    fn grows_only_past_three_quarters() {
        let mut table: HashTable<u64> = HashTable::with_capacity(4);
        for k in 0..3u64 {
            table.entry(k, |&v| v == k).or_insert(k);
        }
        assert_eq!(table.len(), 3);
        assert_eq!(table.capacity(), 4);
        assert_eq!(table.load_factor(), 0.75);

        table.entry(3, |&v| v == 3).or_insert(3);
        assert_eq!(table.len(), 4);
        assert_eq!(table.capacity(), 8);
        assert_eq!(table.load_factor(), 0.5);

        for k in 0..4u64 {
            assert_eq!(table.find(k, |&v| v == k), Some(&k));
        }
        assert_placement(&table);
    }

    #[test]
    fn growth_preserves_contents_and_placement() {
        let state = HashState::default();
        let mut table: HashTable<Item> = HashTable::with_capacity(1);
        let mut capacity = table.capacity();

        for k in 0..1000u64 {
            insert_item(&mut table, &state, k, k as i32);
            assert!(table.load_factor() <= 0.75, "{:#?}", table.debug_stats());
            assert!(table.capacity() == capacity || table.capacity() == capacity * 2);
            capacity = table.capacity();
        }

        assert_eq!(table.len(), 1000);
        assert_eq!(table.capacity(), 2048);
        assert_placement(&table);

        for k in 0..1000u64 {
            let hash = hash_key(&state, k);
            assert_eq!(table.find(hash, |v| v.key == k).unwrap().value, k as i32);
        }
    }

    #[test]
    fn vacant_insert_returns_relocated_value() {
        let mut table: HashTable<(u64, String)> = HashTable::with_capacity(1);

        // Capacity 1 means every first insertion into a full table triggers
        // growth before the reference is handed back.
        for k in 0..16u64 {
            let before = table.capacity();
            let slot = table
                .entry(k, |(key, _)| *key == k)
                .or_insert((k, String::new()));
            slot.1.push_str("written");

            assert_eq!(
                table.find(k, |(key, _)| *key == k).map(|(_, s)| s.as_str()),
                Some("written")
            );
            assert!(table.capacity() >= before);
        }
        assert_eq!(table.len(), 16);
    }

    #[test]
    fn colliding_hashes_share_a_chain() {
        let mut table: HashTable<Item> = HashTable::with_capacity(4);
        for k in 0..10u64 {
            match table.entry(0, |v| v.key == k) {
                Entry::Vacant(v) => {
                    let inserted = v.insert(Item {
                        key: k,
                        value: k as i32,
                    });
                    assert_eq!(inserted.key, k);
                }
                Entry::Occupied(_) => panic!("key {} already present", k),
            }
        }

        assert_eq!(table.len(), 10);
        assert_eq!(table.debug_stats().longest_chain, 10);
        assert_eq!(table.debug_stats().occupied_buckets, 1);

        assert_eq!(table.remove(0, |v| v.key == 5).map(|v| v.value), Some(5));
        for k in 0..10u64 {
            assert_eq!(table.find(0, |v| v.key == k).is_some(), k != 5);
        }
    }

    #[test]
    fn try_insert_succeeds_across_growth() {
        let mut table: HashTable<u64> = HashTable::with_capacity(2);
        for k in 0..64u64 {
            let Entry::Vacant(entry) = table.entry(k, |&v| v == k) else {
                panic!("{} already present", k);
            };
            assert_eq!(entry.hash(), k);
            let value = entry.try_insert(k).unwrap();
            assert_eq!(*value, k);
        }
    }

    #[test]
    fn occupied_remove() {
        let mut table: HashTable<u64> = HashTable::with_capacity(4);
        table.entry(9, |&v| v == 9).or_insert(9);

        match table.entry(9, |&v| v == 9) {
            Entry::Occupied(entry) => assert_eq!(entry.remove(), 9),
            Entry::Vacant(_) => panic!("expected occupied"),
        }
        assert!(table.is_empty());
        assert!(table.find(9, |&v| v == 9).is_none());
    }

    #[test]
    fn entry_or_default_and_modify() {
        let mut table: HashTable<Vec<u32>> = HashTable::with_capacity(4);
        table.entry(1, |v| v.is_empty()).or_default().push(1);
        table
            .entry(1, |v| v.first() == Some(&1))
            .and_modify(|v| v.push(2))
            .or_insert_with(|| vec![99]);

        assert_eq!(table.find(1, |v| v.first() == Some(&1)), Some(&vec![1, 2]));
    }

    #[test]
    fn clear_keeps_capacity() {
        let state = HashState::default();
        let mut table: HashTable<Item> = HashTable::with_capacity(4);
        for k in 0..20u64 {
            insert_item(&mut table, &state, k, 0);
        }
        let capacity = table.capacity();

        table.clear();
        assert!(table.is_empty());
        assert_eq!(table.capacity(), capacity);
        assert_eq!(table.iter().count(), 0);
    }

    #[test]
    fn iter_visits_everything() {
        let state = HashState::default();
        let mut table: HashTable<Item> = HashTable::with_capacity(3);
        for k in 0..50u64 {
            insert_item(&mut table, &state, k, k as i32);
        }

        let iter = table.iter();
        assert_eq!(iter.len(), 50);

        let mut keys: Vec<u64> = iter.map(|v| v.key).collect();
        keys.sort_unstable();
        assert_eq!(keys, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn drain_empties_table() {
        let state = HashState::default();
        let mut table: HashTable<Item> = HashTable::with_capacity(4);
        for k in 0..10u64 {
            insert_item(&mut table, &state, k, k as i32);
        }
        let capacity = table.capacity();

        let mut drained: Vec<u64> = table.drain().map(|v| v.key).collect();
        drained.sort_unstable();
        assert_eq!(drained, (0..10).collect::<Vec<_>>());
        assert!(table.is_empty());
        assert_eq!(table.capacity(), capacity);

        for k in 0..10u64 {
            insert_item(&mut table, &state, k, 0);
        }
        {
            let mut drain = table.drain();
            assert!(drain.next().is_some());
        }
        assert!(table.is_empty());
        assert_eq!(table.iter().count(), 0);
    }

    #[test]
    fn capacity_never_shrinks_on_remove() {
        let state = HashState::default();
        let mut table: HashTable<Item> = HashTable::with_capacity(1);
        for k in 0..100u64 {
            insert_item(&mut table, &state, k, 0);
        }
        let capacity = table.capacity();

        for k in 0..100u64 {
            let hash = hash_key(&state, k);
            assert!(table.remove(hash, |v| v.key == k).is_some());
            assert_eq!(table.capacity(), capacity);
        }
        assert!(table.is_empty());
    }

    #[test]
    fn string_values() {
        let mut table: HashTable<String> = HashTable::with_capacity(2);
        for (hash, s) in [(1u64, "one"), (2, "two"), (3, "three")] {
            table.entry(hash, |v| v == s).or_insert(s.to_string());
        }
        assert_eq!(table.find(2, |v| v == "two"), Some(&"two".to_string()));
        assert_eq!(table.find(2, |v| v == "one"), None);
    }

    #[test]
    fn chain_histogram_counts_buckets() {
        let mut table: HashTable<u64> = HashTable::with_capacity(8);
        // Hashes 0 and 8 collide at capacity 8; 1 is alone.
        table.entry(0, |&v| v == 0).or_insert(0);
        table.entry(8, |&v| v == 8).or_insert(8);
        table.entry(1, |&v| v == 1).or_insert(1);

        let hist = table.chain_histogram();
        assert_eq!(hist, vec![6, 1, 1]);
        assert_eq!(hist.iter().sum::<usize>(), table.capacity());

        let stats = table.debug_stats();
        assert_eq!(stats.populated, 3);
        assert_eq!(stats.buckets, 8);
        assert_eq!(stats.occupied_buckets, 2);
        assert_eq!(stats.longest_chain, 2);
    }

    #[test]
    fn clone_is_independent() {
        let mut table: HashTable<u64> = HashTable::with_capacity(4);
        table.entry(1, |&v| v == 1).or_insert(1);

        let mut copy = table.clone();
        copy.entry(2, |&v| v == 2).or_insert(2);

        assert_eq!(table.len(), 1);
        assert_eq!(copy.len(), 2);
        assert!(table.find(2, |&v| v == 2).is_none());
    }

    #[cfg(feature = "std")]
    #[test]
    fn print_stats_smoke() {
        let mut table: HashTable<u64> = HashTable::with_capacity(4);
        for k in 0..20u64 {
            table.entry(k, |&v| v == k).or_insert(k);
        }
        table.print_chain_histogram();
        table.debug_stats().print();
    }
}
