//! Document caching keyed by file identity.

mod document_cache;
mod identity;

pub use document_cache::{CacheEntry, CacheStats, DocumentCache};
pub use identity::{FileIdentity, FileStat, FileSystem, OsFileSystem};
