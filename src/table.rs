use std::{fmt, iter::FusedIterator, mem, slice};

use log::{debug, warn};

use crate::{
    TableError,
    budget::{Budget, Unlimited},
    config::TableConfig,
    djb2::djb2,
};

/// Head of a bucket chain, or the link from one entry to the next
type Link = Option<Box<Entry>>;

/// A key-value pair, chained to the next entry of the same bucket
#[derive(Debug)]
struct Entry {
    /// Owned copy of the key
    key: String,
    /// The value associated with the key
    value: i32,
    /// Next entry in the bucket
    next: Link,
}

impl Entry {
    /// Copies `key` into a new unlinked entry, charging it to `budget`
    fn new<B: Budget>(key: &str, value: i32, budget: &mut B) -> Result<Box<Self>, TableError> {
        let bytes = entry_bytes(key);
        budget.acquire(bytes)?;

        let mut owned = String::new();
        if owned.try_reserve_exact(key.len()).is_err() {
            budget.release(bytes);
            return Err(TableError::AllocFailed { bytes });
        }
        owned.push_str(key);

        Ok(Box::new(Self { key: owned, value, next: None }))
    }
}

/// Bytes charged for one entry holding `key`
fn entry_bytes(key: &str) -> usize {
    mem::size_of::<Entry>().saturating_add(key.len())
}

/// Bytes charged for a bucket array of `count` heads
fn array_bytes(count: usize) -> usize {
    count.saturating_mul(mem::size_of::<Link>())
}

/// Maps a digest to a bucket. `count` is a power of two, so masking is the
/// modulo reduction.
#[allow(clippy::cast_possible_truncation)]
fn bucket_index(hash: u64, count: usize) -> usize {
    (hash & (count as u64).saturating_sub(1)) as usize
}

/// Bucket array plus the exact number of entries chained from it
#[derive(Debug)]
struct Buckets {
    /// Chain heads; the length is always a power of two
    heads: Vec<Link>,
    /// Number of entries across all chains
    len: usize,
}

impl Buckets {
    /// Empty array of `count` buckets, aborting on allocation failure like `Vec`
    fn with_count(count: usize) -> Self {
        Self { heads: std::iter::repeat_with(|| None).take(count).collect(), len: 0 }
    }

    /// Empty array of `count` buckets, charged to `budget`
    fn allocate<B: Budget>(count: usize, budget: &mut B) -> Result<Self, TableError> {
        let bytes = count.checked_mul(mem::size_of::<Link>()).ok_or(TableError::CapacityOverflow)?;
        budget.acquire(bytes)?;

        let mut heads = Vec::new();
        if heads.try_reserve_exact(count).is_err() {
            budget.release(bytes);
            return Err(TableError::AllocFailed { bytes });
        }
        heads.resize_with(count, || None);

        Ok(Self { heads, len: 0 })
    }

    /// Number of buckets
    fn count(&self) -> usize {
        self.heads.len()
    }

    /// Bucket that `key` belongs to at the current bucket count
    fn index(&self, key: &str) -> usize {
        bucket_index(djb2(key.as_bytes()), self.count())
    }

    /// Chain that `key` belongs to
    fn chain(&self, key: &str) -> &Link {
        #[allow(clippy::indexing_slicing)] // index is masked to the bucket count
        &self.heads[self.index(key)]
    }

    /// Entry holding `key`
    fn find(&self, key: &str) -> Option<&Entry> {
        let mut cursor = self.chain(key).as_deref();
        while let Some(entry) = cursor {
            if entry.key == key {
                return Some(entry);
            }
            cursor = entry.next.as_deref();
        }
        None
    }

    /// Mutable value slot for `key`
    fn find_mut(&mut self, key: &str) -> Option<&mut i32> {
        let index = self.index(key);
        #[allow(clippy::indexing_slicing)] // index is masked to the bucket count
        let mut cursor = self.heads[index].as_deref_mut();
        while let Some(entry) = cursor {
            if entry.key == key {
                return Some(&mut entry.value);
            }
            cursor = entry.next.as_deref_mut();
        }
        None
    }

    /// Overwrites the value of an existing key, or links a new entry at the
    /// head of its chain. Never resizes. Returns the previous value.
    fn place<B: Budget>(
        &mut self,
        key: &str,
        value: i32,
        budget: &mut B,
    ) -> Result<Option<i32>, TableError> {
        let index = self.index(key);
        #[allow(clippy::indexing_slicing)] // index is masked to the bucket count
        let head = &mut self.heads[index];

        let mut cursor = head.as_deref_mut();
        while let Some(entry) = cursor {
            if entry.key == key {
                return Ok(Some(mem::replace(&mut entry.value, value)));
            }
            cursor = entry.next.as_deref_mut();
        }

        let mut entry = Entry::new(key, value, budget)?;
        entry.next = head.take();
        *head = Some(entry);
        self.len = self.len.saturating_add(1);

        Ok(None)
    }

    /// Detaches the entry holding `key` from its chain
    fn unlink(&mut self, key: &str) -> Option<Box<Entry>> {
        let index = self.index(key);
        #[allow(clippy::indexing_slicing)] // index is masked to the bucket count
        let mut link = &mut self.heads[index];

        while link.as_ref().is_some_and(|entry| entry.key != key) {
            link = &mut link.as_mut()?.next;
        }

        let mut removed = link.take()?;
        *link = removed.next.take();
        self.len = self.len.saturating_sub(1);

        Some(removed)
    }

    /// Builds a copy of these entries spread over `count` buckets. Either every
    /// entry makes it into the copy or the partial copy is released and the
    /// error returned.
    fn rehash<B: Budget>(&self, count: usize, budget: &mut B) -> Result<Self, TableError> {
        let mut fresh = Self::allocate(count, budget)?;

        for (key, value) in self.iter() {
            if let Err(error) = fresh.place(key, value, budget) {
                fresh.discard(budget);
                return Err(error);
            }
        }

        Ok(fresh)
    }

    /// Frees every entry, returning their bytes to `budget`
    fn clear_entries<B: Budget>(&mut self, budget: &mut B) {
        for head in &mut self.heads {
            let mut link = head.take();
            while let Some(mut entry) = link {
                budget.release(entry_bytes(&entry.key));
                link = entry.next.take();
            }
        }
        self.len = 0;
    }

    /// Frees everything, returning the bytes to `budget`
    fn discard<B: Budget>(mut self, budget: &mut B) {
        self.clear_entries(budget);
        budget.release(array_bytes(self.count()));
    }

    /// Iterator over every entry
    fn iter(&self) -> Iter<'_> {
        Iter { heads: self.heads.iter(), entry: None, remaining: self.len }
    }
}

impl Drop for Buckets {
    fn drop(&mut self) {
        // Unlink one entry at a time so long chains do not recurse
        for head in &mut self.heads {
            let mut link = head.take();
            while let Some(mut entry) = link {
                link = entry.next.take();
            }
        }
    }
}

/// Occupancy snapshot of a table, see [`Table::stats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableStats {
    /// Stored entries
    pub len: usize,
    /// Buckets in the array
    pub bucket_count: usize,
    /// Buckets whose chain is empty
    pub empty_buckets: usize,
    /// Length of the longest chain
    pub longest_chain: usize,
}

/// Separate-chaining hash table from string keys to `i32` values.
///
/// Keys are hashed with [`djb2`](crate::djb2()) and chained per bucket. After
/// an insert pushes the load factor above the grow threshold the bucket count
/// doubles; after a removal drops it below the shrink threshold it halves,
/// never going under the configured minimum.
///
/// A resize builds the new bucket array next to the old one and copies every
/// entry across. If any allocation on the way fails the copy is thrown away
/// and the table stays as it was, so a resize can only be postponed, never
/// half-applied.
///
/// Every allocation is charged to the table's [`Budget`]. With the default
/// [`Unlimited`] budget only the global allocator can refuse.
///
/// Note: This implementation is not thread-safe.
pub struct Table<B: Budget = Unlimited> {
    /// Current bucket array
    buckets: Buckets,
    /// Resize policy
    config: TableConfig,
    /// Gatekeeper for allocations
    budget: B,
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}

impl Table {
    /// Creates an empty table with the default configuration.
    ///
    /// Aborts on allocation failure like the `std` collections; use
    /// [`Table::try_new`] to get an error instead.
    #[must_use]
    pub fn new() -> Self {
        let config = TableConfig::new();
        Self { buckets: Buckets::with_count(config.min_bucket_count()), config, budget: Unlimited }
    }

    /// Creates an empty table with the default configuration
    ///
    /// # Errors
    ///
    /// Returns [`TableError::AllocFailed`] if the bucket array cannot be allocated.
    pub fn try_new() -> Result<Self, TableError> {
        Self::with_budget(TableConfig::new(), Unlimited)
    }

    /// Creates an empty table with a custom configuration
    ///
    /// # Errors
    ///
    /// Returns [`TableError::InvalidConfig`] if `config` does not validate, or
    /// [`TableError::AllocFailed`] if the bucket array cannot be allocated.
    pub fn with_config(config: TableConfig) -> Result<Self, TableError> {
        Self::with_budget(config, Unlimited)
    }
}

impl<B: Budget> Table<B> {
    /// Creates an empty table whose allocations are charged to `budget`
    ///
    /// # Errors
    ///
    /// Returns [`TableError::InvalidConfig`] if `config` does not validate, or
    /// [`TableError::AllocFailed`] if `budget` or the allocator refuses the
    /// bucket array.
    pub fn with_budget(config: TableConfig, mut budget: B) -> Result<Self, TableError> {
        config.validate()?;
        let buckets = Buckets::allocate(config.min_bucket_count(), &mut budget)?;
        Ok(Self { buckets, config, budget })
    }

    /// Inserts `key` or overwrites its value, returning the previous value.
    ///
    /// A new key may trigger a grow. If the grow cannot get its memory it is
    /// postponed and the insert still succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::AllocFailed`] if the entry for a new key cannot be
    /// allocated. The table is left unchanged.
    pub fn set(&mut self, key: &str, value: i32) -> Result<Option<i32>, TableError> {
        let previous = self.buckets.place(key, value, &mut self.budget)?;
        if previous.is_none() && self.should_grow() {
            match self.buckets.count().checked_mul(2) {
                Some(target) => self.resize(target),
                None => warn!("bucket count {} cannot double", self.buckets.count()),
            }
        }
        Ok(previous)
    }

    /// Value stored for `key`
    #[must_use]
    pub fn get(&self, key: &str) -> Option<i32> {
        self.buckets.find(key).map(|entry| entry.value)
    }

    /// Mutable reference to the value stored for `key`
    pub fn get_mut(&mut self, key: &str) -> Option<&mut i32> {
        self.buckets.find_mut(key)
    }

    /// Returns true if `key` is stored
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.buckets.find(key).is_some()
    }

    /// Removes `key`, returning its value. Removing an absent key does nothing.
    ///
    /// A removal may trigger a shrink, which is postponed if it cannot get its memory.
    pub fn remove(&mut self, key: &str) -> Option<i32> {
        let entry = self.buckets.unlink(key)?;
        self.budget.release(entry_bytes(&entry.key));

        if self.should_shrink() {
            let target = (self.buckets.count() / 2).max(self.config.min_bucket_count());
            self.resize(target);
        }

        Some(entry.value)
    }

    /// Calls `visit` once for every stored pair, in no particular order.
    ///
    /// `visit` cannot reach the table mutably while it runs, so the table is
    /// never modified mid-walk.
    pub fn for_each<F>(&self, mut visit: F)
    where
        F: FnMut(&str, i32),
    {
        for (key, value) in self.iter() {
            visit(key, value);
        }
    }

    /// Iterator over the stored pairs, in no particular order
    #[must_use]
    pub fn iter(&self) -> Iter<'_> {
        self.buckets.iter()
    }

    /// Removes every entry and shrinks back to the minimum bucket count when
    /// that allocation succeeds
    pub fn clear(&mut self) {
        self.buckets.clear_entries(&mut self.budget);
        let min = self.config.min_bucket_count();
        if self.buckets.count() > min {
            self.resize(min);
        }
    }

    /// Number of stored entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.len
    }

    /// Returns true if nothing is stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.len == 0
    }

    /// Current number of buckets
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.buckets.count()
    }

    /// Entries per bucket
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn load_factor(&self) -> f64 {
        self.len() as f64 / self.bucket_count() as f64
    }

    /// Length of every chain, in bucket order
    pub fn chain_lengths(&self) -> impl Iterator<Item = usize> + '_ {
        self.buckets
            .heads
            .iter()
            .map(|head| std::iter::successors(head.as_deref(), |entry| entry.next.as_deref()).count())
    }

    /// Occupancy snapshot
    #[must_use]
    pub fn stats(&self) -> TableStats {
        let (empty_buckets, longest_chain) =
            self.chain_lengths().fold((0usize, 0usize), |(empty, longest), length| {
                (if length == 0 { empty.saturating_add(1) } else { empty }, longest.max(length))
            });
        TableStats { len: self.len(), bucket_count: self.bucket_count(), empty_buckets, longest_chain }
    }

    /// Resize policy in effect
    #[must_use]
    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Allocation budget
    #[must_use]
    pub fn budget(&self) -> &B {
        &self.budget
    }

    /// Mutable allocation budget, e.g. to adjust a [`Limited`](crate::Limited) cap
    pub fn budget_mut(&mut self) -> &mut B {
        &mut self.budget
    }

    /// Load factor is above the grow threshold
    #[allow(clippy::cast_precision_loss)]
    fn should_grow(&self) -> bool {
        self.len() as f64 > self.config.grow_load_factor() * self.bucket_count() as f64
    }

    /// Load factor is below the shrink threshold and there is room to shrink
    #[allow(clippy::cast_precision_loss)]
    fn should_shrink(&self) -> bool {
        self.bucket_count() > self.config.min_bucket_count() &&
            (self.len() as f64) < self.config.shrink_load_factor() * self.bucket_count() as f64
    }

    /// Moves the entries into `target` buckets, or leaves everything in place
    /// if the new storage cannot be built
    fn resize(&mut self, target: usize) {
        let from = self.buckets.count();
        match self.buckets.rehash(target, &mut self.budget) {
            Ok(fresh) => {
                let stale = mem::replace(&mut self.buckets, fresh);
                stale.discard(&mut self.budget);
                debug!("resized table from {from} to {target} buckets ({} entries)", self.len());
            }
            Err(error) => {
                warn!("deferring resize from {from} to {target} buckets: {error}");
            }
        }
    }
}

impl<B: Budget> fmt::Debug for Table<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, B: Budget> IntoIterator for &'a Table<B> {
    type Item = (&'a str, i32);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the key-value pairs of a table
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    /// Buckets not visited yet
    heads: slice::Iter<'a, Link>,
    /// Next entry of the chain being walked
    entry: Option<&'a Entry>,
    /// Entries not yielded yet
    remaining: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, i32);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.entry {
                self.entry = entry.next.as_deref();
                self.remaining = self.remaining.saturating_sub(1);
                return Some((entry.key.as_str(), entry.value));
            }
            self.entry = self.heads.next()?.as_deref();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl FusedIterator for Iter<'_> {}
