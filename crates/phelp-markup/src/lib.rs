//! # phelp-markup: structured data ⇄ XML
//!
//! A stateless tree walk between [`Node`] values (scalar, sequence, mapping)
//! and XML documents, reachable through the [`Serializer`] trait.
//!
//! Two conventions keep the existing document shape:
//! - a sequence under key `K` becomes repeated `<K>` sibling elements;
//! - mapping entries keyed `0`, `1`, … are not elements of their own, their
//!   value's content is merged into the parent.
//!
//! ```
//! use phelp_markup::{Node, Serializer, XmlSerializer};
//!
//! let tree = Node::mapping([
//!     ("name", Node::scalar("report")),
//!     ("tag", Node::Sequence(vec![Node::scalar("a"), Node::scalar("b")])),
//! ]);
//! let xml = XmlSerializer.encode(&tree, "root").unwrap();
//! assert!(xml.contains("<tag>a</tag><tag>b</tag>"));
//! assert_eq!(XmlSerializer.decode(&xml).unwrap(), tree);
//! ```

pub mod markup;

pub use markup::*;
