//! DocPivot - adaptive loading of Docling JSON documents
//!
//! Reads Docling JSON files of any size with one call. The loader picks an
//! I/O strategy from the file size (a single read, bounded-memory streaming,
//! or a read-only memory map), validates the schema header, builds a
//! [`DoclingDocument`] and caches it until the file changes on disk.
//!
//! # Quick start
//!
//! ```ignore
//! use docpivot::{AdaptiveDocumentLoader, LoadRequest};
//!
//! let loader = AdaptiveDocumentLoader::global();
//! let doc = loader.load(LoadRequest::new("paper.docling.json"))?;
//! for line in doc.body_text() {
//!     println!("{}", line);
//! }
//! ```
//!
//! # Modules
//!
//! - [`reader`]: the [`AdaptiveDocumentLoader`] entry point
//! - [`loader`]: strategy selection and the three byte-level loaders
//! - [`json`]: pluggable JSON decoding
//! - [`schema`]: header validation
//! - [`document`]: the document model and builder
//! - [`cache`]: identity-keyed document cache
//! - [`format`]: cheap file-type detection
//! - [`config`] / [`logging`]: ambient setup for binaries

pub mod cache;
pub mod config;
pub mod document;
pub mod error;
pub mod format;
pub mod json;
pub mod loader;
pub mod logging;
pub mod reader;
pub mod schema;

pub use document::{DoclingDocument, DocumentBuilder};
pub use error::{LoadError, LoadResult};
pub use format::detect_format;
pub use loader::Strategy;
pub use reader::{AdaptiveDocumentLoader, CacheInfo, LoadRequest, LoaderConfig, LoaderStats};
pub use schema::SchemaViolation;
