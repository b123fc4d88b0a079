//! Value injection
//!
//! Writing a value is not enough for pages driven by reactive frameworks:
//! they observe fields through intercepted property setters and synthetic
//! events. Each field kind therefore gets the write path and event order the
//! matching native control produces, and text-like kinds write through the
//! native setter to defeat shadowed value properties.

use tracing::debug;

use crate::core::types::{FieldKind, StepValue};
use crate::dom::{Document, EventKind, NodeId};

/// Apply a fill step's value to an element
pub fn inject(doc: &mut Document, node: NodeId, kind: FieldKind, value: &StepValue) {
    match kind {
        FieldKind::Checkbox => {
            let desired = value.as_toggle();
            // Already in the target state: no write, no events
            if doc.element(node).is_checked() == desired {
                debug!(node, "checkbox already in target state");
                return;
            }
            doc.set_checked(node, desired);
            doc.dispatch(node, EventKind::Change);
            doc.dispatch(node, EventKind::Input);
        }
        FieldKind::Radio => {
            doc.set_checked(node, true);
            doc.dispatch(node, EventKind::Change);
            doc.dispatch(node, EventKind::Input);
        }
        FieldKind::Select => {
            doc.assign_value(node, &value.as_text());
            doc.dispatch(node, EventKind::Change);
            doc.dispatch(node, EventKind::Input);
        }
        _ => {
            doc.set_value_native(node, &value.as_text());
            doc.dispatch(node, EventKind::Input);
            doc.dispatch(node, EventKind::Change);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::DomEvent;
    use tokio::sync::broadcast;

    fn drain(rx: &mut broadcast::Receiver<DomEvent>) -> Vec<EventKind> {
        let mut kinds = Vec::new();
        while let Ok(event) = rx.try_recv() {
            kinds.push(event.kind);
        }
        kinds
    }

    #[test]
    fn test_text_injection_event_order() {
        let mut doc = Document::new();
        let body = doc.body();
        let input = doc.append_element(body, "input", &[("type", "text")]);
        let mut events = doc.subscribe_events();

        inject(
            &mut doc,
            input,
            FieldKind::Text,
            &StepValue::Text("hello".into()),
        );

        assert_eq!(doc.element(input).value(), "hello");
        assert_eq!(drain(&mut events), vec![EventKind::Input, EventKind::Change]);
    }

    #[test]
    fn test_text_injection_defeats_shadowed_value() {
        let mut doc = Document::new();
        let body = doc.body();
        let input = doc.append_element(body, "input", &[("type", "text")]);
        doc.shadow_value(input);

        inject(
            &mut doc,
            input,
            FieldKind::Text,
            &StepValue::Text("landed".into()),
        );

        assert_eq!(doc.element(input).value(), "landed");
    }

    #[test]
    fn test_select_injection_event_order() {
        let mut doc = Document::new();
        let body = doc.body();
        let select = doc.append_element(body, "select", &[]);
        let mut events = doc.subscribe_events();

        inject(
            &mut doc,
            select,
            FieldKind::Select,
            &StepValue::Text("pro".into()),
        );

        assert_eq!(doc.element(select).value(), "pro");
        assert_eq!(drain(&mut events), vec![EventKind::Change, EventKind::Input]);
    }

    #[test]
    fn test_checkbox_noop_dispatches_nothing() {
        let mut doc = Document::new();
        let body = doc.body();
        let checkbox = doc.append_element(body, "input", &[("type", "checkbox")]);
        doc.set_checked(checkbox, true);
        let mut events = doc.subscribe_events();

        inject(&mut doc, checkbox, FieldKind::Checkbox, &StepValue::Toggle(true));

        assert!(doc.element(checkbox).is_checked());
        assert!(drain(&mut events).is_empty());
    }

    #[test]
    fn test_checkbox_change_dispatches_change_then_input() {
        let mut doc = Document::new();
        let body = doc.body();
        let checkbox = doc.append_element(body, "input", &[("type", "checkbox")]);
        let mut events = doc.subscribe_events();

        inject(&mut doc, checkbox, FieldKind::Checkbox, &StepValue::Toggle(true));

        assert!(doc.element(checkbox).is_checked());
        assert_eq!(drain(&mut events), vec![EventKind::Change, EventKind::Input]);
    }

    #[test]
    fn test_radio_checks_and_unchecks_group() {
        let mut doc = Document::new();
        let body = doc.body();
        let form = doc.append_element(body, "form", &[]);
        let small = doc.append_element(form, "input", &[("type", "radio"), ("name", "size")]);
        let large = doc.append_element(form, "input", &[("type", "radio"), ("name", "size")]);
        doc.set_checked(small, true);

        inject(&mut doc, large, FieldKind::Radio, &StepValue::Text("on".into()));

        assert!(doc.element(large).is_checked());
        assert!(!doc.element(small).is_checked());
    }
}
