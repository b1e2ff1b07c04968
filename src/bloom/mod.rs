//! Space-efficient probabilistic set with no false negatives.

mod bloom_filter;

pub use self::bloom_filter::BloomFilter;
