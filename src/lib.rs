//! A byte-bounded LRU cache for string keys, plus a thread-safe wrapper around it for storing raw bytes.
//!
//! This is meant as the storage layer of something bigger, such as a node in a distributed cache, rather than as a
//! service on its own.  Two types do the work:
//!
//! [SizedLru] is a plain, single-threaded Lru cache which charges every entry the length of its key plus the length its
//! value reports through [SizedValue].  When the total goes over the configured budget the least recently used entries
//! are evicted, one at a time, until it fits again, optionally handing each one to a callback.  A budget of zero turns
//! eviction off.
//!
//! [ConcurrentCache] wraps a [SizedLru] of [ByteView]s in a mutex, builds it lazily on first write, and returns copies
//! of the views so that nothing read out of the cache can change what it holds.
//!
//! ```
//! use byte_lru::{ByteView, ConcurrentCache};
//!
//! let cache = ConcurrentCache::new(64);
//! cache.add("greeting", ByteView::from("hello"));
//! assert_eq!(cache.get("greeting").unwrap().to_string(), "hello");
//! assert!(cache.get("missing").is_none());
//! ```
mod byte_view;
mod concurrent_cache;
mod config;
mod error;
mod sized_lru;
mod traits;

pub use byte_view::*;
pub use concurrent_cache::*;
pub use config::*;
pub use error::*;
pub use sized_lru::*;
pub use traits::*;
