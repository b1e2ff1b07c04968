//! # membership-collections
//!
//! `membership-collections` contains in-memory collections for approximate
//! membership testing and ordered-key lookup under concurrent mutation:
//!
//! - [`bloom::BloomFilter`] answers membership queries with no false
//!   negatives and a configurable false positive rate, using two hash
//!   functions to simulate `k` hash functions.
//! - [`cuckoo::CuckooFilter`] stores short fingerprints in two candidate
//!   buckets per item, supports deletion, and resolves collisions with a
//!   bounded chain of evictions.
//! - [`skiplist::SkipList`] is a lazy, optimistic, fine-grained-locking
//!   ordered set with lock-free traversal and range scans.
//!
//! The filters accept arbitrary item types through the [`decompose`]
//! pipeline and hash the resulting bytes through the
//! [`hash::HashFunction`] contract.
//!
//! ## References
//!  - [Less hashing, same performance: Building a better Bloom filter](https://dl.acm.org/citation.cfm?id=1400125)
//!  > Kirsch, Adam, and Michael Mitzenmacher. 2008. “Less Hashing, Same Performance: Building a Better Bloom Filter.” *Random Struct. Algorithms* 33 (2). New York, NY, USA: John Wiley & Sons, Inc.: 187–218. doi:[10.1002/rsa.v33:2](https://doi.org/10.1002/rsa.v33:2).
//!  - [Cuckoo Filter: Practically Better Than Bloom](https://dl.acm.org/citation.cfm?id=2674994)
//!  > Fan, Bin, Dave G. Andersen, Michael Kaminsky, and Michael D. Mitzenmacher. 2014. “Cuckoo Filter: Practically Better Than Bloom.” In *Proceedings of the 10th Acm International on Conference on Emerging Networking Experiments and Technologies*, 75–88. CoNEXT ’14. New York, NY, USA: ACM. doi:[10.1145/2674005.2674994](https://doi.org/10.1145/2674005.2674994).
//!  - [Skip Lists: A Probabilistic Alternative to Balanced Trees](https://dl.acm.org/citation.cfm?id=78977)
//!  > Pugh, William. 1990. “Skip Lists: A Probabilistic Alternative to Balanced Trees.” *Commun. ACM* 33 (6). New York, NY, USA: ACM: 668–76. doi:[10.1145/78973.78977](https://doi.org/10.1145/78973.78977).
//!  - [A Simple Optimistic Skiplist Algorithm](https://dl.acm.org/citation.cfm?id=1760633)
//!  > Herlihy, Maurice, Yossi Lev, Victor Luchangco, and Nir Shavit. 2007. “A Simple Optimistic Skiplist Algorithm.” In *Proceedings of the 14th International Conference on Structural Information and Communication Complexity*, 124–38. SIROCCO ’07. Berlin, Heidelberg: Springer-Verlag.

#![warn(missing_docs)]

extern crate byteorder;
extern crate crc32fast;
extern crate crossbeam_epoch as epoch;
extern crate parking_lot;
extern crate rand;
extern crate siphasher;

pub mod bit_vec;
pub mod bloom;
pub mod cuckoo;
pub mod decompose;
pub mod hash;
pub mod skiplist;
