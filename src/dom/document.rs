//! Mutable element tree standing in for one tab's document
//!
//! The embedder keeps this model synchronized with the live page. Structural
//! and form-state changes publish mutation notices, and user gestures or
//! injected actions publish interaction events; both travel over broadcast
//! channels so observers (element waits, quiescence waits, the recorder)
//! can subscribe and drop out independently.

use std::collections::HashMap;

use tokio::sync::broadcast;

/// Index of an element within its document
pub type NodeId = usize;

const CHANNEL_CAPACITY: usize = 256;

/// Kinds of interaction events dispatched on the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Input,
    Change,
    Click,
}

/// An interaction event observed on the tree
#[derive(Debug, Clone)]
pub struct DomEvent {
    pub target: NodeId,
    pub kind: EventKind,
}

/// Mutation notices published when the tree or form state changes
#[derive(Debug, Clone)]
pub enum Mutation {
    ChildAdded { parent: NodeId, node: NodeId },
    ChildRemoved { parent: NodeId, node: NodeId },
    AttributeChanged { node: NodeId, name: String },
    TextChanged { node: NodeId },
    /// Value or checked-state change
    StateChanged { node: NodeId },
}

/// One element in the tree
#[derive(Debug, Clone)]
pub struct Element {
    tag: String,
    attrs: HashMap<String, String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    text: String,
    value: String,
    checked: bool,
    value_shadowed: bool,
}

impl Element {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: HashMap::new(),
            parent: None,
            children: Vec::new(),
            text: String::new(),
            value: String::new(),
            checked: false,
            value_shadowed: false,
        }
    }

    /// Lowercase tag name
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Attribute lookup
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(|v| v.as_str())
    }

    /// Attribute lookup, treating the empty string as absent
    pub fn non_empty_attr(&self, name: &str) -> Option<&str> {
        self.attr(name).filter(|v| !v.is_empty())
    }

    /// Whether the attribute is present at all
    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    /// Direct text of this element (excluding descendants)
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Current form value
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Current checked state
    pub fn is_checked(&self) -> bool {
        self.checked
    }

    /// Parent node, if attached
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child nodes in order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// The `type` attribute of an input, lowercased, defaulting to "text"
    pub fn input_type(&self) -> String {
        self.attr("type")
            .map(|t| t.to_ascii_lowercase())
            .unwrap_or_else(|| "text".to_string())
    }

    /// Whether this is an `<input>`, `<select>`, or `<textarea>`
    pub fn is_form_control(&self) -> bool {
        matches!(self.tag.as_str(), "input" | "select" | "textarea")
    }
}

/// The element tree for one document
pub struct Document {
    nodes: Vec<Element>,
    root: NodeId,
    body: NodeId,
    mutations: broadcast::Sender<Mutation>,
    events: broadcast::Sender<DomEvent>,
}

impl Document {
    /// Create a document with the standard html/head/body skeleton
    pub fn new() -> Self {
        let (mutations, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (events, _) = broadcast::channel(CHANNEL_CAPACITY);
        let mut doc = Self {
            nodes: Vec::new(),
            root: 0,
            body: 0,
            mutations,
            events,
        };
        let root = doc.push_node(Element::new("html"));
        doc.root = root;
        let head = doc.push_node(Element::new("head"));
        doc.link(root, head);
        let body = doc.push_node(Element::new("body"));
        doc.link(root, body);
        doc.body = body;
        doc
    }

    fn push_node(&mut self, element: Element) -> NodeId {
        self.nodes.push(element);
        self.nodes.len() - 1
    }

    fn link(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
    }

    /// Root `<html>` element
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The `<body>` element
    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Immutable element access
    pub fn element(&self, node: NodeId) -> &Element {
        &self.nodes[node]
    }

    /// Create a detached element; attach it with [`Document::append_child`]
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push_node(Element::new(tag))
    }

    /// Attach a node as the last child of `parent`
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.link(parent, child);
        self.notify(Mutation::ChildAdded { parent, node: child });
    }

    /// Detach a node from its parent
    pub fn remove_child(&mut self, child: NodeId) {
        if let Some(parent) = self.nodes[child].parent.take() {
            self.nodes[parent].children.retain(|c| *c != child);
            self.notify(Mutation::ChildRemoved { parent, node: child });
        }
    }

    /// Set an attribute value
    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        self.nodes[node]
            .attrs
            .insert(name.to_string(), value.to_string());
        self.notify(Mutation::AttributeChanged {
            node,
            name: name.to_string(),
        });
    }

    /// Set the element's direct text
    pub fn set_text(&mut self, node: NodeId, text: &str) {
        self.nodes[node].text = text.to_string();
        self.notify(Mutation::TextChanged { node });
    }

    /// Assign a value through the instance property path
    ///
    /// A shadowing shim installed by [`Document::shadow_value`] swallows this
    /// write, emulating frameworks that intercept the value property for
    /// two-way binding. Injection must use [`Document::set_value_native`]
    /// for text-like fields.
    pub fn assign_value(&mut self, node: NodeId, value: &str) {
        if self.nodes[node].value_shadowed {
            return;
        }
        self.set_value_native(node, value);
    }

    /// Write the value through the native setter, bypassing any shim
    pub fn set_value_native(&mut self, node: NodeId, value: &str) {
        self.nodes[node].value = value.to_string();
        self.notify(Mutation::StateChanged { node });
    }

    /// Emulate a framework that shadows the element's value property
    pub fn shadow_value(&mut self, node: NodeId) {
        self.nodes[node].value_shadowed = true;
    }

    /// Set checked state; checking a radio unchecks the rest of its group
    pub fn set_checked(&mut self, node: NodeId, on: bool) {
        if on && self.nodes[node].tag == "input" && self.nodes[node].input_type() == "radio" {
            for other in self.radio_group(node) {
                if other != node && self.nodes[other].checked {
                    self.nodes[other].checked = false;
                    self.notify(Mutation::StateChanged { node: other });
                }
            }
        }
        self.nodes[node].checked = on;
        self.notify(Mutation::StateChanged { node });
    }

    /// Members of a radio's group: same name, same containing form (or the
    /// whole document when unowned)
    fn radio_group(&self, node: NodeId) -> Vec<NodeId> {
        let name = match self.nodes[node].attr("name") {
            Some(n) => n.to_string(),
            None => return vec![node],
        };
        let form = self.closest(node, "form");
        self.walk()
            .into_iter()
            .filter(|&n| {
                let el = &self.nodes[n];
                el.tag == "input"
                    && el.input_type() == "radio"
                    && el.attr("name") == Some(name.as_str())
                    && self.closest(n, "form") == form
            })
            .collect()
    }

    /// Dispatch an interaction event on a node
    pub fn dispatch(&self, node: NodeId, kind: EventKind) {
        let _ = self.events.send(DomEvent { target: node, kind });
    }

    /// Subscribe to mutation notices
    pub fn subscribe_mutations(&self) -> broadcast::Receiver<Mutation> {
        self.mutations.subscribe()
    }

    /// Subscribe to interaction events
    pub fn subscribe_events(&self) -> broadcast::Receiver<DomEvent> {
        self.events.subscribe()
    }

    fn notify(&self, mutation: Mutation) {
        let _ = self.mutations.send(mutation);
    }

    /// All attached nodes in document order
    pub fn walk(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(node) = stack.pop() {
            out.push(node);
            for &child in self.nodes[node].children.iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    /// 1-based index of a node among its same-tag siblings
    pub fn nth_of_type(&self, node: NodeId) -> usize {
        let tag = &self.nodes[node].tag;
        match self.nodes[node].parent {
            Some(parent) => {
                self.nodes[parent]
                    .children
                    .iter()
                    .filter(|&&c| self.nodes[c].tag == *tag)
                    .position(|&c| c == node)
                    .unwrap_or(0)
                    + 1
            }
            None => 1,
        }
    }

    /// How many of the parent's children share this node's tag
    pub fn same_tag_sibling_count(&self, node: NodeId) -> usize {
        let tag = &self.nodes[node].tag;
        match self.nodes[node].parent {
            Some(parent) => self.nodes[parent]
                .children
                .iter()
                .filter(|&&c| self.nodes[c].tag == *tag)
                .count(),
            None => 1,
        }
    }

    /// Nearest ancestor-or-self with the given tag
    pub fn closest(&self, node: NodeId, tag: &str) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(n) = current {
            if self.nodes[n].tag == tag {
                return Some(n);
            }
            current = self.nodes[n].parent;
        }
        None
    }

    /// Whether any ancestor-or-self carries the given attribute
    pub fn within_attr(&self, node: NodeId, attr: &str) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if self.nodes[n].has_attr(attr) {
                return true;
            }
            current = self.nodes[n].parent;
        }
        false
    }

    /// Concatenated text of a node and its descendants, in document order
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        let mut stack = vec![node];
        while let Some(n) = stack.pop() {
            out.push_str(&self.nodes[n].text);
            for &child in self.nodes[n].children.iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    /// All `<form>` elements in document order
    pub fn forms(&self) -> Vec<NodeId> {
        self.walk()
            .into_iter()
            .filter(|&n| self.nodes[n].tag == "form")
            .collect()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an element with attributes and attach it under `parent` in
    /// one call
    pub fn append_element(
        &mut self,
        parent: NodeId,
        tag: &str,
        attrs: &[(&str, &str)],
    ) -> NodeId {
        let node = self.create_element(tag);
        for (name, value) in attrs {
            self.nodes[node]
                .attrs
                .insert((*name).to_string(), (*value).to_string());
        }
        self.append_child(parent, node);
        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skeleton() {
        let doc = Document::new();
        assert_eq!(doc.element(doc.root()).tag(), "html");
        assert_eq!(doc.element(doc.body()).tag(), "body");
    }

    #[test]
    fn test_nth_of_type_counts_same_tag_only() {
        let mut doc = Document::new();
        let body = doc.body();
        doc.append_element(body, "div", &[]);
        let span = doc.append_element(body, "span", &[]);
        let div2 = doc.append_element(body, "div", &[]);

        assert_eq!(doc.nth_of_type(span), 1);
        assert_eq!(doc.nth_of_type(div2), 2);
        assert_eq!(doc.same_tag_sibling_count(span), 1);
        assert_eq!(doc.same_tag_sibling_count(div2), 2);
    }

    #[test]
    fn test_radio_group_exclusivity() {
        let mut doc = Document::new();
        let form = doc.append_element(doc.body(), "form", &[]);
        let a = doc.append_element(form, "input", &[("type", "radio"), ("name", "size")]);
        let b = doc.append_element(form, "input", &[("type", "radio"), ("name", "size")]);
        let other = doc.append_element(form, "input", &[("type", "radio"), ("name", "color")]);

        doc.set_checked(a, true);
        doc.set_checked(other, true);
        doc.set_checked(b, true);

        assert!(!doc.element(a).is_checked());
        assert!(doc.element(b).is_checked());
        // Different group is untouched
        assert!(doc.element(other).is_checked());
    }

    #[test]
    fn test_shadowed_value_swallows_assignment() {
        let mut doc = Document::new();
        let input = doc.append_element(doc.body(), "input", &[("type", "text")]);
        doc.shadow_value(input);

        doc.assign_value(input, "ignored");
        assert_eq!(doc.element(input).value(), "");

        doc.set_value_native(input, "landed");
        assert_eq!(doc.element(input).value(), "landed");
    }

    #[test]
    fn test_mutation_notices() {
        let mut doc = Document::new();
        let mut rx = doc.subscribe_mutations();
        let div = doc.append_element(doc.body(), "div", &[]);
        doc.set_attr(div, "class", "x");

        assert!(matches!(rx.try_recv(), Ok(Mutation::ChildAdded { .. })));
        assert!(matches!(
            rx.try_recv(),
            Ok(Mutation::AttributeChanged { .. })
        ));
    }

    #[test]
    fn test_text_content_spans_descendants() {
        let mut doc = Document::new();
        let label = doc.append_element(doc.body(), "label", &[]);
        doc.set_text(label, "First ");
        let b = doc.append_element(label, "b", &[]);
        doc.set_text(b, "name");

        assert_eq!(doc.text_content(label), "First name");
    }

    #[test]
    fn test_remove_child_detaches_subtree_from_walk() {
        let mut doc = Document::new();
        let div = doc.append_element(doc.body(), "div", &[]);
        let span = doc.append_element(div, "span", &[]);
        doc.remove_child(div);

        let walked = doc.walk();
        assert!(!walked.contains(&div));
        assert!(!walked.contains(&span));
    }
}
