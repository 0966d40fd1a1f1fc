//! Architecture:
//! - `types`: the `Node` tree and its `serde_json::Value` conversions
//! - `error`: markup error type
//! - `xml_writer`: `Node` → XML document
//! - `xml_parser`: XML document → `Node`

pub mod types;
pub mod error;
pub mod xml_writer;
pub mod xml_parser;

pub use error::{MarkupError, MarkupResult};
pub use types::Node;

/// Converts a data tree to a markup document and back.
pub trait Serializer {
    /// Render `tree` as a document whose root element is `root_name`.
    fn encode(&self, tree: &Node, root_name: &str) -> MarkupResult<String>;

    /// Parse a document into the tree under its root element.
    fn decode(&self, markup: &str) -> MarkupResult<Node>;
}

/// XML implementation backed by quick-xml.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlSerializer;

impl Serializer for XmlSerializer {
    fn encode(&self, tree: &Node, root_name: &str) -> MarkupResult<String> {
        xml_writer::write_xml(tree, root_name)
    }

    fn decode(&self, markup: &str) -> MarkupResult<Node> {
        xml_parser::parse_xml(markup).map(|(_, node)| node)
    }
}
