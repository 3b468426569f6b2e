//! Turning a parsed JSON tree into a [`DoclingDocument`].

use std::fmt;

use super::model::{DoclingDocument, NodeRef};
use crate::json::ParsedValue;

/// The builder rejected the document body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildError {
    /// One entry per problem found.
    pub details: Vec<String>,
}

impl BuildError {
    pub fn new(details: Vec<String>) -> Self {
        Self { details }
    }
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "document validation failed: {}", self.details.join("; "))
    }
}

impl std::error::Error for BuildError {}

/// Constructs a document from a schema-checked JSON tree.
///
/// Implementations must be pure: the same input always yields an equal
/// document or the same error.
pub trait DocumentBuilder: Send + Sync {
    fn build(&self, parsed: ParsedValue) -> Result<DoclingDocument, BuildError>;
}

/// Default builder: deserializes the tree and checks that every child link of
/// the body, furniture and groups points at an existing node.
#[derive(Debug, Clone, Copy, Default)]
pub struct DoclingDocumentBuilder;

impl DocumentBuilder for DoclingDocumentBuilder {
    fn build(&self, parsed: ParsedValue) -> Result<DoclingDocument, BuildError> {
        let document: DoclingDocument = serde_json::from_value(parsed)
            .map_err(|e| BuildError::new(vec![e.to_string()]))?;

        let mut details = Vec::new();
        check_children(&document, &document.body.self_ref, &document.body.children, &mut details);
        check_children(
            &document,
            &document.furniture.self_ref,
            &document.furniture.children,
            &mut details,
        );
        for group in &document.groups {
            check_children(&document, &group.self_ref, &group.children, &mut details);
        }
        for text in &document.texts {
            check_children(&document, &text.self_ref, &text.children, &mut details);
        }

        if details.is_empty() {
            Ok(document)
        } else {
            Err(BuildError::new(details))
        }
    }
}

fn check_children(
    document: &DoclingDocument,
    owner: &str,
    children: &[NodeRef],
    details: &mut Vec<String>,
) {
    for child in children {
        if document.resolve(child).is_none() {
            details.push(format!("{}: dangling child reference {}", owner, child.cref));
        }
    }
}
