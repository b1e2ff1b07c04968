//! Fingerprint-based probabilistic set with deletion support.

mod bucket;
mod cuckoo_filter;

pub use self::cuckoo_filter::CuckooFilter;
