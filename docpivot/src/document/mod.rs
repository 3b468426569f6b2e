//! Docling document model and the builder that produces it.
//!
//! The model covers what the loader needs to hand callers a navigable tree:
//! the body/furniture roots, groups and text items with their `$ref` links,
//! and the origin metadata. Tables, pictures, key-value items and pages are
//! kept as opaque JSON so nothing in the file is lost.

mod builder;
mod model;

pub use builder::{BuildError, DoclingDocumentBuilder, DocumentBuilder};
pub use model::{
    ContentLayer, DoclingDocument, DocumentOrigin, GroupItem, NodeItem, NodeRef, TextItem,
};
