use byteorder::{BigEndian, ByteOrder};
use cuckoo::bucket::{Bucket, ENTRIES_PER_BUCKET};
use decompose::{ByteSink, Decomposable, Decomposer, DefaultDecomposer, SelfDecomposer};
use hash::{HashFunction, SipHash128};
use parking_lot::RwLock;
use rand::{self, Rng};
use std::cmp;
use std::fmt;
use std::marker::PhantomData;

const MAX_KICKS: usize = 500;

struct Table {
    buckets: Vec<Bucket>,
    count: usize,
}

/// A space-efficient probabilistic data structure to test for membership in
/// a set, with support for deletion.
///
/// A cuckoo filter stores a short fingerprint of each item in one of two
/// candidate buckets. The second candidate is derived from the first by
/// XORing with a hash of the fingerprint alone, so either candidate can be
/// recovered from the other without the original item; this is what lets an
/// occupant be displaced to its alternate bucket when a bucket fills up.
/// Insertion runs a bounded chain of such displacements and reports failure
/// once the chain exceeds its bound, at which point the filter is
/// considered full.
///
/// Mutations are serialized by a filter-wide lock that readers also take in
/// shared mode, so membership queries never observe a half-finished
/// eviction chain.
///
/// # Examples
///
/// ```
/// use membership_collections::cuckoo::CuckooFilter;
///
/// let filter = CuckooFilter::new(1024, 2);
///
/// filter.insert(&"foo");
/// assert!(filter.contains(&"foo"));
/// assert_eq!(filter.len(), 1);
///
/// assert!(filter.delete(&"foo"));
/// assert!(!filter.contains(&"foo"));
/// assert!(filter.is_empty());
/// ```
pub struct CuckooFilter<T, D = DefaultDecomposer> {
    table: RwLock<Table>,
    bucket_count: usize,
    fingerprint_size: usize,
    hasher: Box<HashFunction + Send + Sync>,
    decomposer: D,
    _marker: PhantomData<T>,
}

impl<T: fmt::Display> CuckooFilter<T> {
    /// Constructs a new, empty `CuckooFilter<T>` with room for roughly
    /// `capacity` items and fingerprints of `fingerprint_size` bytes,
    /// rendering items as UTF-8 text.
    ///
    /// The requested capacity is rounded up to the next power of two and
    /// divided into buckets of four slots each.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or `fingerprint_size` is not in `1..=8`.
    ///
    /// # Examples
    ///
    /// ```
    /// use membership_collections::cuckoo::CuckooFilter;
    ///
    /// let filter: CuckooFilter<u32> = CuckooFilter::new(1024, 2);
    ///
    /// assert_eq!(filter.bucket_count(), 256);
    /// assert_eq!(filter.capacity(), 1024);
    /// ```
    pub fn new(capacity: usize, fingerprint_size: usize) -> Self {
        Self::with_decomposer(capacity, fingerprint_size, DefaultDecomposer)
    }
}

impl<T: Decomposable> CuckooFilter<T, SelfDecomposer> {
    /// Constructs a new, empty `CuckooFilter<T>` for items that decompose
    /// themselves.
    pub fn from_decomposable(capacity: usize, fingerprint_size: usize) -> Self {
        Self::with_decomposer(capacity, fingerprint_size, SelfDecomposer)
    }
}

impl<T, D: Decomposer<T>> CuckooFilter<T, D> {
    /// Constructs a new, empty `CuckooFilter<T>` that renders items with
    /// `decomposer`.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or `fingerprint_size` is not in `1..=8`.
    pub fn with_decomposer(capacity: usize, fingerprint_size: usize, decomposer: D) -> Self {
        Self::with_hasher(
            capacity,
            fingerprint_size,
            decomposer,
            Box::new(SipHash128::new()),
        )
    }

    /// Constructs a new, empty `CuckooFilter<T>` with a specific hash
    /// provider. The filter consumes the big-endian byte form of each
    /// digest, which must be at least four bytes and at least
    /// `fingerprint_size` bytes long.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or `fingerprint_size` is not in `1..=8`.
    pub fn with_hasher(
        capacity: usize,
        fingerprint_size: usize,
        decomposer: D,
        hasher: Box<HashFunction + Send + Sync>,
    ) -> Self {
        assert!(capacity > 0);
        assert!(fingerprint_size >= 1 && fingerprint_size <= 8);
        let bucket_count = cmp::max(1, capacity.next_power_of_two() / ENTRIES_PER_BUCKET);
        CuckooFilter {
            table: RwLock::new(Table {
                buckets: vec![Bucket::new(); bucket_count],
                count: 0,
            }),
            bucket_count,
            fingerprint_size,
            hasher,
            decomposer,
            _marker: PhantomData,
        }
    }

    fn decomposed_value(&self, value: &T) -> Vec<u8> {
        let mut sink = ByteSink::new();
        self.decomposer.decompose(value, &mut sink);
        sink.into_bytes()
    }

    // fingerprints are never all-zero; an all-zero truncation is re-digested
    // until a non-zero one appears
    fn derive_fingerprint(&self, digest: &[u8]) -> Vec<u8> {
        let mut digest = digest.to_vec();
        let mut fingerprint = digest[..self.fingerprint_size].to_vec();

        while fingerprint.iter().all(|byte| *byte == 0) {
            digest = self.hasher.hash_bytes(&digest);
            fingerprint = digest[..self.fingerprint_size].to_vec();
        }
        fingerprint
    }

    fn alternate_index(&self, fingerprint: &[u8], index: usize) -> usize {
        let digest = self.hasher.hash_bytes(fingerprint);
        (index ^ BigEndian::read_u32(&digest) as usize) & (self.bucket_count - 1)
    }

    fn fingerprint_and_indexes(&self, bytes: &[u8]) -> (Vec<u8>, usize, usize) {
        let digest = self.hasher.hash_bytes(bytes);
        assert!(digest.len() >= self.fingerprint_size && digest.len() >= 4);

        let fingerprint = self.derive_fingerprint(&digest);
        let index_1 = BigEndian::read_u32(&digest) as usize & (self.bucket_count - 1);
        let index_2 = self.alternate_index(&fingerprint, index_1);
        (fingerprint, index_1, index_2)
    }

    /// Inserts an element into the cuckoo filter. Returns `false` if the
    /// filter could not accommodate the element within the eviction bound,
    /// in which case the filter is considered full.
    ///
    /// Inserting the same element twice stores its fingerprint twice.
    ///
    /// # Examples
    ///
    /// ```
    /// use membership_collections::cuckoo::CuckooFilter;
    ///
    /// let filter = CuckooFilter::new(1024, 2);
    ///
    /// assert!(filter.insert(&"foo"));
    /// assert!(filter.contains(&"foo"));
    /// ```
    pub fn insert(&self, value: &T) -> bool {
        let bytes = self.decomposed_value(value);
        let (fingerprint, index_1, index_2) = self.fingerprint_and_indexes(&bytes);

        let mut table = self.table.write();
        if table.buckets[index_1].insert(&fingerprint)
            || table.buckets[index_2].insert(&fingerprint)
        {
            table.count += 1;
            return true;
        }

        // both candidates full: displace occupants along an eviction chain
        let mut index = if rand::thread_rng().gen::<bool>() {
            index_1
        } else {
            index_2
        };
        let mut fingerprint = fingerprint;

        for _ in 0..MAX_KICKS {
            fingerprint = table.buckets[index].swap(fingerprint);
            index = self.alternate_index(&fingerprint, index);
            if table.buckets[index].insert(&fingerprint) {
                table.count += 1;
                return true;
            }
        }
        false
    }

    /// Checks if an element is possibly in the cuckoo filter.
    ///
    /// A `true` return may be a false positive from a fingerprint
    /// collision, but a `false` return means the element is definitely not
    /// present.
    pub fn contains(&self, value: &T) -> bool {
        let bytes = self.decomposed_value(value);
        let (fingerprint, index_1, index_2) = self.fingerprint_and_indexes(&bytes);

        let table = self.table.read();
        table.buckets[index_1].contains(&fingerprint)
            || table.buckets[index_2].contains(&fingerprint)
    }

    /// Removes an element from the cuckoo filter. Returns `false` if no
    /// matching fingerprint was found in either candidate bucket.
    ///
    /// # Examples
    ///
    /// ```
    /// use membership_collections::cuckoo::CuckooFilter;
    ///
    /// let filter = CuckooFilter::new(1024, 2);
    ///
    /// filter.insert(&"foo");
    /// assert!(filter.delete(&"foo"));
    /// assert!(!filter.delete(&"foo"));
    /// ```
    pub fn delete(&self, value: &T) -> bool {
        let bytes = self.decomposed_value(value);
        let (fingerprint, index_1, index_2) = self.fingerprint_and_indexes(&bytes);

        let mut table = self.table.write();
        if table.buckets[index_1].delete(&fingerprint) || table.buckets[index_2].delete(&fingerprint)
        {
            table.count -= 1;
            true
        } else {
            false
        }
    }

    /// Returns the number of fingerprints stored in the cuckoo filter.
    pub fn len(&self) -> usize {
        self.table.read().count
    }

    /// Returns `true` if the cuckoo filter holds no fingerprints.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of fingerprint slots in the cuckoo filter.
    pub fn capacity(&self) -> usize {
        self.bucket_count * ENTRIES_PER_BUCKET
    }

    /// Returns the number of buckets in the cuckoo filter.
    pub fn bucket_count(&self) -> usize {
        self.bucket_count
    }

    /// Returns the fingerprint length in bytes.
    pub fn fingerprint_size(&self) -> usize {
        self.fingerprint_size
    }
}
