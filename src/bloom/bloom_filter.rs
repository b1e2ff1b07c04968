use bit_vec::BitVec;
use decompose::{ByteSink, Decomposable, Decomposer, DefaultDecomposer, SelfDecomposer};
use hash::{Crc32Hash, HashFunction};
use std::cmp;
use std::f64::consts::LN_2;
use std::fmt;
use std::marker::PhantomData;

fn optimal_bit_count(expected_insertions: usize, fpp: f64) -> usize {
    let bit_count = -(expected_insertions as f64) * fpp.ln() / (LN_2 * LN_2);
    cmp::max(1, bit_count as usize)
}

fn optimal_hasher_count(expected_insertions: usize, bit_count: usize) -> usize {
    let hasher_count = (bit_count as f64 / expected_insertions as f64) * LN_2;
    cmp::max(1, hasher_count.round() as usize)
}

/// A space-efficient probabilistic data structure to test for membership in
/// a set.
///
/// At its core, a bloom filter is a bit array, initially all set to zero.
/// `K` hash functions map each element to `K` bits in the bit array. An
/// element definitely does not exist in the bloom filter if any of the `K`
/// bits are unset. An element is possibly in the set if all of the `K` bits
/// are set. This implementation derives the `K` bit indexes from a single
/// 64-bit digest split into two 32-bit halves, so one hash computation per
/// item simulates `K` hash functions without worsening the false positive
/// rate.
///
/// The bit count and hash function count are sized at construction from the
/// expected number of insertions and the target false positive rate, and
/// are fixed thereafter. Items cannot be removed.
///
/// # Examples
///
/// ```
/// use membership_collections::bloom::BloomFilter;
///
/// let mut filter = BloomFilter::new(10, 0.01);
///
/// assert!(!filter.contains(&"foo"));
/// filter.insert(&"foo");
/// assert!(filter.contains(&"foo"));
///
/// assert_eq!(filter.bit_count(), 95);
/// assert_eq!(filter.hasher_count(), 7);
///
/// filter.clear();
/// assert!(!filter.contains(&"foo"));
/// ```
pub struct BloomFilter<T, D = DefaultDecomposer> {
    bit_vec: BitVec,
    hasher: Box<HashFunction + Send + Sync>,
    hasher_count: usize,
    decomposer: D,
    _marker: PhantomData<T>,
}

impl<T: fmt::Display> BloomFilter<T> {
    /// Constructs a new, empty `BloomFilter<T>` sized for `expected_insertions`
    /// items and a false positive rate of at most `fpp`, rendering items as
    /// UTF-8 text.
    ///
    /// # Panics
    ///
    /// Panics if `expected_insertions` is zero or `fpp` is not in `(0, 1)`.
    ///
    /// # Examples
    ///
    /// ```
    /// use membership_collections::bloom::BloomFilter;
    ///
    /// let filter: BloomFilter<u32> = BloomFilter::new(100, 0.01);
    /// ```
    pub fn new(expected_insertions: usize, fpp: f64) -> Self {
        Self::with_decomposer(expected_insertions, fpp, DefaultDecomposer)
    }
}

impl<T: Decomposable> BloomFilter<T, SelfDecomposer> {
    /// Constructs a new, empty `BloomFilter<T>` for items that decompose
    /// themselves.
    ///
    /// # Examples
    ///
    /// ```
    /// use membership_collections::bloom::BloomFilter;
    ///
    /// let mut filter: BloomFilter<Vec<u8>, _> = BloomFilter::from_decomposable(100, 0.01);
    ///
    /// filter.insert(&vec![1, 2, 3]);
    /// assert!(filter.contains(&vec![1, 2, 3]));
    /// ```
    pub fn from_decomposable(expected_insertions: usize, fpp: f64) -> Self {
        Self::with_decomposer(expected_insertions, fpp, SelfDecomposer)
    }
}

impl<T, D: Decomposer<T>> BloomFilter<T, D> {
    /// Constructs a new, empty `BloomFilter<T>` that renders items with
    /// `decomposer`.
    ///
    /// # Panics
    ///
    /// Panics if `expected_insertions` is zero or `fpp` is not in `(0, 1)`.
    pub fn with_decomposer(expected_insertions: usize, fpp: f64, decomposer: D) -> Self {
        Self::with_hasher(expected_insertions, fpp, decomposer, Box::new(Crc32Hash))
    }

    /// Constructs a new, empty `BloomFilter<T>` with a specific hash
    /// provider. The filter consumes the first 64-bit digest of each item.
    ///
    /// # Panics
    ///
    /// Panics if `expected_insertions` is zero or `fpp` is not in `(0, 1)`.
    pub fn with_hasher(
        expected_insertions: usize,
        fpp: f64,
        decomposer: D,
        hasher: Box<HashFunction + Send + Sync>,
    ) -> Self {
        assert!(expected_insertions > 0);
        assert!(fpp > 0.0 && fpp < 1.0);
        let bit_count = optimal_bit_count(expected_insertions, fpp);
        BloomFilter {
            bit_vec: BitVec::new(bit_count),
            hasher,
            hasher_count: optimal_hasher_count(expected_insertions, bit_count),
            decomposer,
            _marker: PhantomData,
        }
    }

    fn decomposed_value(&self, value: &T) -> Vec<u8> {
        let mut sink = ByteSink::new();
        self.decomposer.decompose(value, &mut sink);
        sink.into_bytes()
    }

    fn bit_index(&self, hash_1: u32, hash_2: u32, round: u32) -> usize {
        let composed = hash_1.wrapping_add(round.wrapping_mul(hash_2));
        composed as usize % self.bit_vec.len()
    }

    /// Inserts a byte slice into the bloom filter. Returns `true` if any bit
    /// of the filter changed.
    ///
    /// # Examples
    ///
    /// ```
    /// use membership_collections::bloom::BloomFilter;
    ///
    /// let mut filter: BloomFilter<&str> = BloomFilter::new(100, 0.01);
    ///
    /// assert!(filter.insert_bytes(b"foo"));
    /// assert!(!filter.insert_bytes(b"foo"));
    /// ```
    pub fn insert_bytes(&mut self, bytes: &[u8]) -> bool {
        let hash = self.hasher.hash(bytes);
        let hash_1 = hash as u32;
        let hash_2 = (hash >> 32) as u32;

        let mut changed = false;
        for round in 1..self.hasher_count + 1 {
            let index = self.bit_index(hash_1, hash_2, round as u32);
            changed |= self.bit_vec.get(index) == Some(false);
            self.bit_vec.set(index, true);
        }
        changed
    }

    /// Checks if a byte slice is possibly in the bloom filter. Returns
    /// `false` as soon as any derived bit is unset.
    pub fn contains_bytes(&self, bytes: &[u8]) -> bool {
        let hash = self.hasher.hash(bytes);
        let hash_1 = hash as u32;
        let hash_2 = (hash >> 32) as u32;

        (1..self.hasher_count + 1).all(|round| {
            let index = self.bit_index(hash_1, hash_2, round as u32);
            self.bit_vec.get(index) == Some(true)
        })
    }

    /// Inserts an element into the bloom filter. Returns `true` if any bit
    /// of the filter changed.
    ///
    /// # Examples
    ///
    /// ```
    /// use membership_collections::bloom::BloomFilter;
    ///
    /// let mut filter = BloomFilter::new(100, 0.01);
    ///
    /// filter.insert(&"foo");
    /// assert!(filter.contains(&"foo"));
    /// ```
    pub fn insert(&mut self, value: &T) -> bool {
        let bytes = self.decomposed_value(value);
        self.insert_bytes(&bytes)
    }

    /// Checks if an element is possibly in the bloom filter.
    ///
    /// A `true` return may be a false positive, but a `false` return means
    /// the element was definitely never inserted.
    pub fn contains(&self, value: &T) -> bool {
        self.contains_bytes(&self.decomposed_value(value))
    }

    /// Returns the number of bits in the bloom filter.
    ///
    /// # Examples
    ///
    /// ```
    /// use membership_collections::bloom::BloomFilter;
    ///
    /// let filter: BloomFilter<u32> = BloomFilter::new(10, 0.01);
    ///
    /// assert_eq!(filter.bit_count(), 95);
    /// ```
    pub fn bit_count(&self) -> usize {
        self.bit_vec.len()
    }

    /// Returns the number of hash functions simulated by the bloom filter.
    ///
    /// # Examples
    ///
    /// ```
    /// use membership_collections::bloom::BloomFilter;
    ///
    /// let filter: BloomFilter<u32> = BloomFilter::new(10, 0.01);
    ///
    /// assert_eq!(filter.hasher_count(), 7);
    /// ```
    pub fn hasher_count(&self) -> usize {
        self.hasher_count
    }

    /// Returns the fraction of bits that are set.
    ///
    /// # Examples
    ///
    /// ```
    /// use membership_collections::bloom::BloomFilter;
    ///
    /// let mut filter = BloomFilter::new(10, 0.01);
    ///
    /// assert_eq!(filter.fill_ratio(), 0.0);
    /// filter.insert(&"foo");
    /// assert!(filter.fill_ratio() > 0.0);
    /// ```
    pub fn fill_ratio(&self) -> f64 {
        self.bit_vec.count_ones() as f64 / self.bit_vec.len() as f64
    }

    /// Clears the bloom filter, removing all elements.
    ///
    /// # Examples
    ///
    /// ```
    /// use membership_collections::bloom::BloomFilter;
    ///
    /// let mut filter = BloomFilter::new(10, 0.01);
    ///
    /// filter.insert(&"foo");
    /// filter.clear();
    ///
    /// assert!(!filter.contains(&"foo"));
    /// ```
    pub fn clear(&mut self) {
        self.bit_vec.set_all(false)
    }
}
