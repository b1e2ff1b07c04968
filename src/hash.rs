//! Hash providers for the filters.
//!
//! Both filters depend only on the [`HashFunction`] contract: a provider
//! digests a byte slice into one 64-bit word, several 64-bit words, or the
//! big-endian byte rendering of those words. The bloom filter consumes the
//! first 64-bit word; the cuckoo filter consumes the byte form.

use byteorder::{BigEndian, ByteOrder};
use crc32fast;
use rand::{Rng, XorShiftRng};
use siphasher::sip::SipHasher;
use std::hash::Hasher;

/// A digest over a byte slice.
///
/// Providers may be single-valued or multi-valued; the default methods
/// derive the multi-word and byte forms from the single 64-bit digest, so a
/// single-valued provider only implements [`hash`](HashFunction::hash).
pub trait HashFunction {
    /// Returns the 64-bit digest of `bytes`.
    fn hash(&self, bytes: &[u8]) -> u64;

    /// Returns the digest of `bytes` as one or more 64-bit words.
    ///
    /// Single-valued providers return exactly one word.
    fn hash_multiple(&self, bytes: &[u8]) -> Vec<u64> {
        vec![self.hash(bytes)]
    }

    /// Returns the digest of `bytes` as big-endian bytes.
    fn hash_bytes(&self, bytes: &[u8]) -> Vec<u8> {
        let words = self.hash_multiple(bytes);
        let mut ret = vec![0; words.len() * 8];
        for (index, word) in words.iter().enumerate() {
            BigEndian::write_u64(&mut ret[index * 8..(index + 1) * 8], *word);
        }
        ret
    }
}

/// The CRC-32 hash function, zero-extended to 64 bits.
///
/// # Examples
///
/// ```
/// use membership_collections::hash::{Crc32Hash, HashFunction};
///
/// let hasher = Crc32Hash;
///
/// assert_eq!(hasher.hash(b"123456789"), 0xCBF4_3926);
/// assert_eq!(hasher.hash_bytes(b"123456789"), vec![0xCB, 0xF4, 0x39, 0x26]);
/// ```
#[derive(Clone, Copy, Default)]
pub struct Crc32Hash;

impl HashFunction for Crc32Hash {
    fn hash(&self, bytes: &[u8]) -> u64 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(bytes);
        u64::from(hasher.finalize())
    }

    // the upper four bytes of the zero-extended word carry no entropy, so
    // the byte form is the checksum alone
    fn hash_bytes(&self, bytes: &[u8]) -> Vec<u8> {
        let mut ret = vec![0; 4];
        BigEndian::write_u32(&mut ret, self.hash(bytes) as u32);
        ret
    }
}

/// A 128-bit hash function built from two keyed SipHash instances.
///
/// # Examples
///
/// ```
/// use membership_collections::hash::{HashFunction, SipHash128};
///
/// let hasher = SipHash128::new();
///
/// assert_eq!(hasher.hash_multiple(b"foo").len(), 2);
/// assert_eq!(hasher.hash_bytes(b"foo").len(), 16);
/// assert_eq!(hasher.hash(b"foo"), hasher.hash(b"foo"));
/// ```
#[derive(Clone)]
pub struct SipHash128 {
    hashers: [SipHasher; 2],
}

impl SipHash128 {
    /// Constructs a new `SipHash128` with a fixed pair of keys.
    pub fn new() -> Self {
        let mut rng = XorShiftRng::new_unseeded();
        SipHash128 {
            hashers: [
                SipHasher::new_with_keys(rng.next_u64(), rng.next_u64()),
                SipHasher::new_with_keys(rng.next_u64(), rng.next_u64()),
            ],
        }
    }

    fn hash_index(&self, bytes: &[u8], index: usize) -> u64 {
        let mut sip = self.hashers[index].clone();
        sip.write(bytes);
        sip.finish()
    }
}

impl HashFunction for SipHash128 {
    fn hash(&self, bytes: &[u8]) -> u64 {
        self.hash_index(bytes, 0)
    }

    fn hash_multiple(&self, bytes: &[u8]) -> Vec<u64> {
        vec![self.hash_index(bytes, 0), self.hash_index(bytes, 1)]
    }
}

impl Default for SipHash128 {
    fn default() -> Self {
        Self::new()
    }
}
