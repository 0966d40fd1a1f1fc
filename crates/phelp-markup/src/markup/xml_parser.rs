//! XML parser: document string → `Node` tree.
//!
//! - Element without child elements → `Scalar` of its text
//! - Element with child elements → `Mapping`, text between children ignored
//! - Repeated sibling names → one `Sequence` at the first occurrence
//! - Attributes, comments and processing instructions are skipped

use std::str;

use log::trace;
use quick_xml::events::Event;
use quick_xml::Reader;

use super::error::{MarkupError, MarkupResult};
use super::types::Node;

struct Frame {
    name: String,
    text: String,
    children: Vec<(String, Node)>,
}

impl Frame {
    fn new(name: String) -> Self {
        Self {
            name,
            text: String::new(),
            children: Vec::new(),
        }
    }

    fn into_node(self) -> (String, Node) {
        let node = if self.children.is_empty() {
            Node::Scalar(self.text)
        } else {
            Node::Mapping(group_siblings(self.children))
        };
        (self.name, node)
    }
}

/// Parse a document; returns the root element name and its content.
pub fn parse_xml(xml: &str) -> MarkupResult<(String, Node)> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Frame> = Vec::new();
    let mut root: Option<(String, Node)> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            MarkupError::Parse(format!("at position {}: {}", reader.buffer_position(), e))
        })?;
        match event {
            Event::Start(ref e) => {
                ensure_single_root(&root)?;
                stack.push(Frame::new(tag_name(e.name().as_ref())?));
            }
            Event::Empty(ref e) => {
                ensure_single_root(&root)?;
                let finished = (tag_name(e.name().as_ref())?, Node::Scalar(String::new()));
                attach(&mut stack, &mut root, finished);
            }
            Event::Text(ref t) => {
                if let Some(frame) = stack.last_mut() {
                    let text = t
                        .unescape()
                        .map_err(|e| MarkupError::Parse(e.to_string()))?;
                    frame.text.push_str(&text);
                }
            }
            Event::CData(c) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::End(_) => {
                let frame = stack
                    .pop()
                    .ok_or_else(|| MarkupError::Parse("unexpected closing tag".into()))?;
                let finished = frame.into_node();
                attach(&mut stack, &mut root, finished);
            }
            Event::Eof => break,
            other => trace!("skipping {:?}", other),
        }
    }

    if let Some(open) = stack.last() {
        return Err(MarkupError::Parse(format!("unclosed element <{}>", open.name)));
    }
    root.ok_or(MarkupError::Empty)
}

fn attach(stack: &mut [Frame], root: &mut Option<(String, Node)>, finished: (String, Node)) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(finished),
        None => *root = Some(finished),
    }
}

fn ensure_single_root(root: &Option<(String, Node)>) -> MarkupResult<()> {
    match root {
        Some((name, _)) => Err(MarkupError::Parse(format!(
            "content after root element <{}>",
            name
        ))),
        None => Ok(()),
    }
}

fn tag_name(raw: &[u8]) -> MarkupResult<String> {
    str::from_utf8(raw)
        .map(str::to_owned)
        .map_err(|_| MarkupError::Parse("invalid UTF-8 in tag name".into()))
}

/// Fold repeated names into a `Sequence` placed where the name first appeared.
fn group_siblings(children: Vec<(String, Node)>) -> Vec<(String, Node)> {
    let mut grouped: Vec<(String, Node)> = Vec::with_capacity(children.len());
    let mut repeated: Vec<bool> = Vec::with_capacity(children.len());

    for (name, node) in children {
        match grouped.iter().position(|(n, _)| *n == name) {
            Some(idx) => {
                let slot = &mut grouped[idx].1;
                if repeated[idx] {
                    if let Node::Sequence(items) = slot {
                        items.push(node);
                    }
                } else {
                    let first = std::mem::replace(slot, Node::Sequence(Vec::new()));
                    *slot = Node::Sequence(vec![first, node]);
                    repeated[idx] = true;
                }
            }
            None => {
                grouped.push((name, node));
                repeated.push(false);
            }
        }
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaves_and_nesting() {
        let (root, node) =
            parse_xml("<?xml version=\"1.0\"?><cfg><host>ftp.example.com</host><opts><p>21</p></opts></cfg>")
                .unwrap();
        assert_eq!(root, "cfg");
        assert_eq!(node.get("host").and_then(Node::as_str), Some("ftp.example.com"));
        assert_eq!(
            node.get("opts").and_then(|o| o.get("p")).and_then(Node::as_str),
            Some("21")
        );
    }

    #[test]
    fn repeated_siblings_become_sequence_in_place() {
        let (_, node) = parse_xml("<r><a>1</a><b>x</b><a>2</a><a>3</a></r>").unwrap();
        assert_eq!(
            node,
            Node::mapping([
                (
                    "a",
                    Node::Sequence(vec![Node::scalar("1"), Node::scalar("2"), Node::scalar("3")])
                ),
                ("b", Node::scalar("x")),
            ])
        );
    }

    #[test]
    fn indentation_between_children_is_ignored() {
        let (_, node) = parse_xml("<r>\n  <a> padded </a>\n  <e/>\n</r>").unwrap();
        assert_eq!(node.get("a").and_then(Node::as_str), Some(" padded "));
        assert_eq!(node.get("e").and_then(Node::as_str), Some(""));
    }

    #[test]
    fn entities_and_cdata_are_text() {
        let (_, node) = parse_xml("<r><q>a &lt; b</q><c><![CDATA[<raw>]]></c></r>").unwrap();
        assert_eq!(node.get("q").and_then(Node::as_str), Some("a < b"));
        assert_eq!(node.get("c").and_then(Node::as_str), Some("<raw>"));
    }

    #[test]
    fn malformed_input_is_an_error() {
        assert!(matches!(parse_xml("<r><a></b></r>"), Err(MarkupError::Parse(_))));
        assert!(matches!(parse_xml("<r><a>"), Err(MarkupError::Parse(_))));
        assert_eq!(parse_xml("   "), Err(MarkupError::Empty));
        assert!(matches!(parse_xml("<a/><b/>"), Err(MarkupError::Parse(_))));
    }
}
