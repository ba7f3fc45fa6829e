//! nlsh Storage - history log and response cache on the local filesystem.
//!
//! - [`JsonlHistoryStore`]: one JSON record per line, fsynced on append
//! - [`FileResponseCache`]: one JSON file per cache key with TTL and a size bound
//!
//! Both implement the engine's collaborator traits.


pub mod cache;
pub mod error;
pub mod history;
pub mod paths;

pub use cache::FileResponseCache;
pub use error::{Result, StorageError};
pub use history::JsonlHistoryStore;
pub use paths::{cache_dir, default_cache_dir, history_path};
