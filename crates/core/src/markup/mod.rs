//! Layout markup: a small XML subset turned into an untyped element tree.
//!
//! This layer does no semantic interpretation. Unknown tags and attributes are
//! preserved as-is; the model builder decides what they mean.

mod parser;

use indexmap::IndexMap;
use thiserror::Error;

pub use parser::parse;

/// Malformed markup, with the 1-based position of the offending character.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Parse error at line {line}, column {column}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self { line, column, message: message.into() }
    }
}

/// One element of the parsed document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawNode {
    pub tag: String,
    /// Attributes in document order, values already unescaped.
    pub attributes: IndexMap<String, String>,
    pub children: Vec<RawNode>,
    /// Concatenated non-whitespace text content, trimmed. Empty for most elements.
    pub text: String,
    /// Line of the element's opening `<`.
    pub line: usize,
}

impl RawNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into(), ..Self::default() }
    }

    /// Builder-style helper, mostly for tests.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Builder-style helper, mostly for tests.
    pub fn with_child(mut self, child: RawNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}
