//! XML writer: `Node` tree → document string.
//!
//! - Scalar → text content of its element
//! - Mapping → one child element per entry
//! - Sequence under key `K` → repeated `<K>` siblings
//! - Numeric key (`0`, `1`, …) → the value's content is merged into the parent

use std::io::Cursor;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::error::{MarkupError, MarkupResult};
use super::types::Node;

/// Serialize `tree` under a `<root_name>` element.
pub fn write_xml(tree: &Node, root_name: &str) -> MarkupResult<String> {
    check_name(root_name)?;
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    emit(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
    )?;
    write_element(&mut writer, root_name, tree)?;

    let bytes = writer.into_inner().into_inner();
    String::from_utf8(bytes).map_err(|e| MarkupError::Write(e.to_string()))
}

fn write_element<W: std::io::Write>(writer: &mut Writer<W>, name: &str, node: &Node) -> MarkupResult<()> {
    if is_empty(node) {
        return emit(writer, Event::Empty(BytesStart::new(name)));
    }
    emit(writer, Event::Start(BytesStart::new(name)))?;
    write_content(writer, name, node)?;
    emit(writer, Event::End(BytesEnd::new(name)))
}

/// Content of the element `parent`.
fn write_content<W: std::io::Write>(writer: &mut Writer<W>, parent: &str, node: &Node) -> MarkupResult<()> {
    match node {
        Node::Scalar(text) => emit(writer, Event::Text(BytesText::new(text))),
        Node::Mapping(entries) => {
            for (key, value) in entries {
                write_entry(writer, parent, key, value)?;
            }
            Ok(())
        }
        // An unkeyed sequence behaves like keys 0, 1, … : items merge.
        Node::Sequence(items) => {
            for item in items {
                merge_into(writer, parent, item)?;
            }
            Ok(())
        }
    }
}

fn write_entry<W: std::io::Write>(
    writer: &mut Writer<W>,
    parent: &str,
    key: &str,
    value: &Node,
) -> MarkupResult<()> {
    if is_numeric_key(key) {
        return merge_into(writer, parent, value);
    }
    check_name(key)?;
    match value {
        Node::Sequence(items) => {
            for item in items {
                write_entry(writer, parent, key, item)?;
            }
            Ok(())
        }
        _ => write_element(writer, key, value),
    }
}

fn merge_into<W: std::io::Write>(writer: &mut Writer<W>, parent: &str, node: &Node) -> MarkupResult<()> {
    match node {
        Node::Scalar(_) => Err(MarkupError::UnkeyedScalar(parent.to_string())),
        _ => write_content(writer, parent, node),
    }
}

fn emit<W: std::io::Write>(writer: &mut Writer<W>, event: Event<'_>) -> MarkupResult<()> {
    writer
        .write_event(event)
        .map_err(|e| MarkupError::Write(e.to_string()))
}

fn is_empty(node: &Node) -> bool {
    match node {
        Node::Scalar(s) => s.is_empty(),
        Node::Mapping(entries) => entries.is_empty(),
        Node::Sequence(items) => items.is_empty(),
    }
}

fn is_numeric_key(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit())
}

/// XML 1.0 `Name`, without the namespace colon.
fn check_name(name: &str) -> MarkupResult<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => chars
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.')),
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(MarkupError::InvalidName(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DECL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

    #[test]
    fn writes_declaration_and_root() {
        let xml = write_xml(&Node::mapping([("a", Node::scalar("1"))]), "root").unwrap();
        assert_eq!(xml, format!("{}<root><a>1</a></root>", DECL));
    }

    #[test]
    fn sequence_repeats_the_key() {
        let tree = Node::mapping([(
            "item",
            Node::Sequence(vec![Node::scalar("x"), Node::scalar("y")]),
        )]);
        let xml = write_xml(&tree, "list").unwrap();
        assert!(xml.ends_with("<list><item>x</item><item>y</item></list>"));
    }

    #[test]
    fn numeric_keys_merge_into_parent() {
        let tree = Node::mapping([
            ("0", Node::mapping([("a", Node::scalar("1"))])),
            ("1", Node::mapping([("b", Node::scalar("2"))])),
        ]);
        let xml = write_xml(&tree, "root").unwrap();
        assert!(xml.ends_with("<root><a>1</a><b>2</b></root>"));
    }

    #[test]
    fn text_is_escaped() {
        let xml = write_xml(&Node::mapping([("q", Node::scalar("a < b & c"))]), "root").unwrap();
        assert!(xml.contains("<q>a &lt; b &amp; c</q>"));
    }

    #[test]
    fn empty_values_are_empty_elements() {
        let tree = Node::mapping([("e", Node::scalar("")), ("m", Node::Mapping(vec![]))]);
        let xml = write_xml(&tree, "root").unwrap();
        assert!(xml.ends_with("<root><e/><m/></root>"));
    }

    #[test]
    fn rejects_invalid_names() {
        let tree = Node::mapping([("bad name", Node::scalar("x"))]);
        assert_eq!(
            write_xml(&tree, "root"),
            Err(MarkupError::InvalidName("bad name".into()))
        );
        assert!(write_xml(&Node::scalar("x"), "1root").is_err());
    }

    #[test]
    fn rejects_scalar_under_numeric_key() {
        let tree = Node::mapping([("0", Node::scalar("x"))]);
        assert_eq!(
            write_xml(&tree, "root"),
            Err(MarkupError::UnkeyedScalar("root".into()))
        );
    }
}
