//! A hash map that keeps its entries in the order they were first inserted.
//!
//! ```
//! use ordered_map::OrderedMap;
//!
//! let mut map = OrderedMap::new();
//! map.store(1, "a");
//! map.store(2, "b");
//! map.store(3, "c");
//! map.delete(&2);
//! map.store(1, "z");
//!
//! let entries: Vec<_> = map.iter().collect();
//! assert_eq!(entries, [(&1, &"z"), (&3, &"c")]);
//! ```
//!
//! With the `shared_map` feature (on by default), [`SharedOrderedMap`] wraps
//! a map behind a lock for use from several threads.

pub mod iter;
mod linked_list;
mod ordered_map;
#[cfg(feature = "shared_map")]
mod shared_map;

pub use iter::{IntoIter, Iter, Keys, Values};
pub use ordered_map::OrderedMap;
#[cfg(feature = "shared_map")]
pub use shared_map::SharedOrderedMap;
