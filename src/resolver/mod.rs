//! Selector resolution - deriving locators and finding elements
//!
//! `resolve` turns an element into the most stable selector the document
//! allows, preferring semantic anchors (id, unique name, data-qa) and only
//! falling back to a positional path when nothing better exists. Positional
//! selectors are flagged fragile so the UI can warn that structure changes
//! may break them. `find_element` is the replay-side inverse with a bounded
//! mutation-driven wait.

pub mod describe;

use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::time::{timeout, Instant};
use tracing::debug;

use crate::dom::{css_escape, escape_attr_value, Document, Mutation, NodeId, Page, Selector};

/// A derived locator plus its stability flag
#[derive(Debug, Clone, PartialEq)]
pub struct Locator {
    pub selector: String,
    pub fragile: bool,
}

impl Locator {
    fn stable(selector: String) -> Self {
        Self {
            selector,
            fragile: false,
        }
    }
}

/// Derive a selector for an element from the current tree
///
/// Tiers fall through strictly in order; ambiguity at one tier never
/// errors, it just tries the next.
pub fn resolve(doc: &Document, node: NodeId) -> Locator {
    if let Some(id) = doc.element(node).non_empty_attr("id") {
        return Locator::stable(format!("#{}", css_escape(id)));
    }
    if let Some(locator) = resolve_by_name(doc, node) {
        return locator;
    }
    if let Some(locator) = resolve_by_data_qa(doc, node) {
        return locator;
    }
    positional(doc, node)
}

/// Name tier: `tag[name="…"]` when unique, scoped to the containing form's
/// document-order index when not
fn resolve_by_name(doc: &Document, node: NodeId) -> Option<Locator> {
    let el = doc.element(node);
    let name = el.non_empty_attr("name")?;
    let candidate = format!("{}[name=\"{}\"]", el.tag(), escape_attr_value(name));
    if matches_one(doc, &candidate) {
        return Some(Locator::stable(candidate));
    }

    let form = doc.closest(node, "form")?;
    let form_index = doc.forms().iter().position(|&f| f == form)? + 1;
    let scoped = format!("form:nth-of-type({}) {}", form_index, candidate);
    if matches_one(doc, &scoped) {
        return Some(Locator::stable(scoped));
    }
    None
}

/// data-qa tier: usable only when the attribute value is unique
fn resolve_by_data_qa(doc: &Document, node: NodeId) -> Option<Locator> {
    let qa = doc.element(node).attr("data-qa")?;
    let candidate = format!("[data-qa=\"{}\"]", escape_attr_value(qa));
    if matches_one(doc, &candidate) {
        return Some(Locator::stable(candidate));
    }
    None
}

/// Positional fallback: a descendant path from just under `<body>` down to
/// the element, with `:nth-of-type` only where same-tag siblings exist
fn positional(doc: &Document, node: NodeId) -> Locator {
    let mut segments = Vec::new();
    let mut current = node;
    loop {
        let el = doc.element(current);
        if el.tag() == "body" || el.tag() == "html" {
            break;
        }
        if doc.same_tag_sibling_count(current) > 1 {
            segments.push(format!(
                "{}:nth-of-type({})",
                el.tag(),
                doc.nth_of_type(current)
            ));
        } else {
            segments.push(el.tag().to_string());
        }
        match el.parent() {
            Some(parent) => current = parent,
            None => break,
        }
    }
    if segments.is_empty() {
        segments.push(doc.element(node).tag().to_string());
    }
    segments.reverse();
    Locator {
        selector: segments.join(" "),
        fragile: true,
    }
}

fn matches_one(doc: &Document, selector: &str) -> bool {
    Selector::parse(selector)
        .map(|s| s.query_unique(doc).is_some())
        .unwrap_or(false)
}

/// Find the element a selector points at, waiting for it to appear
///
/// Queries immediately, then re-queries on node additions until the wait
/// elapses. The mutation subscription is taken before the first query so an
/// addition racing the call is not missed, and dropping the receiver on
/// every exit path is the observer disconnect.
pub async fn find_element(page: &Page, selector: &str, wait: Duration) -> Option<NodeId> {
    let parsed = match Selector::parse(selector) {
        Ok(s) => s,
        Err(e) => {
            debug!(selector, error = %e, "unparsable selector");
            return None;
        }
    };

    let mut mutations = page.subscribe_mutations();
    if let Some(node) = page.query_first(&parsed) {
        return Some(node);
    }

    let deadline = Instant::now() + wait;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return None;
        }
        match timeout(remaining, mutations.recv()).await {
            Ok(Ok(Mutation::ChildAdded { .. })) | Ok(Err(RecvError::Lagged(_))) => {
                if let Some(node) = page.query_first(&parsed) {
                    return Some(node);
                }
            }
            Ok(Ok(_)) => {}
            Ok(Err(RecvError::Closed)) => return None,
            Err(_) => return None,
        }
    }
}
