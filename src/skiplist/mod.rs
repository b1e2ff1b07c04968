//! Concurrent ordered set based on a lazy, optimistic skip list.

mod list;
mod node;

pub use self::list::{SkipList, SkipListIter};
