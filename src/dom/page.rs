//! One tab's page: a document plus its URL
//!
//! A `Page` is created per load; a navigation produces a fresh `Page` and the
//! old one's channels die with it, which is how the engine's execution
//! context gets "destroyed" in this model.

use parking_lot::{Mutex, MutexGuard};
use tokio::sync::broadcast;
use url::Url;

use crate::dom::document::{Document, DomEvent, EventKind, Mutation, NodeId};
use crate::dom::selector::Selector;

/// A document bound to the URL it was loaded from
pub struct Page {
    doc: Mutex<Document>,
    url: Url,
}

impl Page {
    /// Create an empty page at a URL
    pub fn new(url: Url) -> Self {
        Self {
            doc: Mutex::new(Document::new()),
            url,
        }
    }

    /// Parse HTML into a page at a URL
    pub fn from_html(html: &str, url: Url) -> Self {
        Self {
            doc: Mutex::new(crate::dom::html::parse_html(html)),
            url,
        }
    }

    /// Lock the document
    ///
    /// Callers must not hold the guard across an await point.
    pub fn doc(&self) -> MutexGuard<'_, Document> {
        self.doc.lock()
    }

    /// The page's URL
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Hostname component of the URL, empty when absent
    pub fn hostname(&self) -> String {
        self.url.host_str().unwrap_or_default().to_string()
    }

    /// Subscribe to the document's mutation notices
    pub fn subscribe_mutations(&self) -> broadcast::Receiver<Mutation> {
        self.doc.lock().subscribe_mutations()
    }

    /// Subscribe to the document's interaction events
    pub fn subscribe_events(&self) -> broadcast::Receiver<DomEvent> {
        self.doc.lock().subscribe_events()
    }

    /// First node matching a parsed selector
    pub fn query_first(&self, selector: &Selector) -> Option<NodeId> {
        selector.query_first(&self.doc.lock())
    }

    /// A user typing into a text-like control
    pub fn simulate_input(&self, node: NodeId, text: &str) {
        let mut doc = self.doc.lock();
        doc.set_value_native(node, text);
        doc.dispatch(node, EventKind::Input);
    }

    /// A user committing a value (blur or enter)
    pub fn simulate_change(&self, node: NodeId) {
        self.doc.lock().dispatch(node, EventKind::Change);
    }

    /// A user toggling a checkbox or picking a radio
    pub fn simulate_toggle(&self, node: NodeId, on: bool) {
        let mut doc = self.doc.lock();
        doc.set_checked(node, on);
        doc.dispatch(node, EventKind::Change);
    }

    /// A user choosing a select option
    pub fn simulate_select(&self, node: NodeId, value: &str) {
        let mut doc = self.doc.lock();
        doc.set_value_native(node, value);
        doc.dispatch(node, EventKind::Change);
    }

    /// A user clicking an element
    pub fn simulate_click(&self, node: NodeId) {
        self.doc.lock().dispatch(node, EventKind::Click);
    }
}
