//! Record-time element description helpers
//!
//! Pure lookups used while recording: a display label for a field, its
//! injection kind, its current value, and a label for click targets.

use crate::core::types::{FieldKind, StepValue};
use crate::dom::{Document, NodeId};

const CLICK_LABEL_MAX: usize = 60;

/// Human-readable label for a form field
///
/// Priority: `<label for=…>` text, enclosing `<label>` text, placeholder,
/// aria-label, name attribute, empty string. Display only, never matched.
pub fn field_label(doc: &Document, node: NodeId) -> String {
    if let Some(id) = doc.element(node).non_empty_attr("id") {
        if let Some(label) = label_for(doc, id) {
            return label;
        }
    }
    if let Some(label) = doc.element(node).parent().and_then(|p| {
        doc.closest(p, "label")
            .map(|l| doc.text_content(l).trim().to_string())
    }) {
        if !label.is_empty() {
            return label;
        }
    }
    let el = doc.element(node);
    for attr in ["placeholder", "aria-label", "name"] {
        if let Some(value) = el.non_empty_attr(attr) {
            return value.to_string();
        }
    }
    String::new()
}

fn label_for(doc: &Document, id: &str) -> Option<String> {
    doc.walk()
        .into_iter()
        .find(|&n| doc.element(n).tag() == "label" && doc.element(n).attr("for") == Some(id))
        .map(|n| doc.text_content(n).trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Injection kind for a form field
///
/// Unknown tags and input types degrade to `Text`; there is no failure path.
pub fn field_kind(doc: &Document, node: NodeId) -> FieldKind {
    let el = doc.element(node);
    match el.tag() {
        "select" => FieldKind::Select,
        "textarea" => FieldKind::Textarea,
        "input" => FieldKind::from_input_type(&el.input_type()),
        _ => FieldKind::Text,
    }
}

/// Current value of a form field as a step value
pub fn field_value(doc: &Document, node: NodeId) -> StepValue {
    if field_kind(doc, node) == FieldKind::Checkbox {
        StepValue::Toggle(doc.element(node).is_checked())
    } else {
        StepValue::Text(doc.element(node).value().to_string())
    }
}

/// Label for a click target
///
/// Priority: trimmed visible text (truncated to 60 characters), aria-label,
/// title, the value attribute, lowercase tag name.
pub fn click_label(doc: &Document, node: NodeId) -> String {
    let text = doc.text_content(node).trim().to_string();
    if !text.is_empty() {
        return truncate(&text, CLICK_LABEL_MAX);
    }
    let el = doc.element(node);
    for attr in ["aria-label", "title", "value"] {
        if let Some(value) = el.non_empty_attr(attr) {
            return value.to_string();
        }
    }
    el.tag().to_string()
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        text.chars().take(max).collect()
    }
}
