//! Page model - the document tree the engine operates on
//!
//! Contains the mutable element tree, the selector engine, HTML loading,
//! and the per-tab page wrapper.

pub mod document;
pub mod html;
pub mod page;
pub mod selector;

pub use document::{Document, DomEvent, Element, EventKind, Mutation, NodeId};
pub use html::parse_html;
pub use page::Page;
pub use selector::{css_escape, escape_attr_value, Selector};
