//! HTML loading for the page model
//!
//! Parses an HTML document with `scraper` and converts the body subtree into
//! a [`Document`], seeding form state (input values, checked flags, select
//! defaults) the way a browser would after load.

use scraper::{ElementRef, Html};

use crate::dom::document::{Document, NodeId};

/// Parse an HTML string into a page model document
pub fn parse_html(html: &str) -> Document {
    let parsed = Html::parse_document(html);
    let mut doc = Document::new();
    if let Some(body) = find_body(&parsed) {
        let attrs: Vec<(&str, &str)> = body.value().attrs().collect();
        let our_body = doc.body();
        for (name, value) in attrs {
            doc.set_attr(our_body, name, value);
        }
        convert_children(&mut doc, our_body, body);
    }
    doc
}

fn find_body<'a>(parsed: &'a Html) -> Option<ElementRef<'a>> {
    parsed
        .root_element()
        .children()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "body")
}

fn convert_children(doc: &mut Document, parent: NodeId, from: ElementRef<'_>) {
    let mut own_text = String::new();
    for child in from.children() {
        if let Some(el) = ElementRef::wrap(child) {
            let attrs: Vec<(&str, &str)> = el.value().attrs().collect();
            let node = doc.append_element(parent, el.value().name(), &attrs);
            convert_children(doc, node, el);
            seed_form_state(doc, node);
        } else if let Some(text) = child.value().as_text() {
            own_text.push_str(text);
        }
    }
    if !own_text.is_empty() {
        doc.set_text(parent, &own_text);
    }
}

/// Give a freshly converted control the state a browser would after load
fn seed_form_state(doc: &mut Document, node: NodeId) {
    match doc.element(node).tag() {
        "input" => {
            let value = doc.element(node).attr("value").map(str::to_string);
            let checked = doc.element(node).has_attr("checked");
            if let Some(v) = value {
                doc.set_value_native(node, &v);
            }
            if checked {
                doc.set_checked(node, true);
            }
        }
        "textarea" => {
            let v = doc.text_content(node);
            doc.set_value_native(node, &v);
        }
        "select" => {
            let options: Vec<NodeId> = doc
                .element(node)
                .children()
                .iter()
                .copied()
                .filter(|&c| doc.element(c).tag() == "option")
                .collect();
            let chosen = options
                .iter()
                .copied()
                .find(|&o| doc.element(o).has_attr("selected"))
                .or_else(|| options.first().copied());
            if let Some(option) = chosen {
                let v = option_value(doc, option);
                doc.set_value_native(node, &v);
            }
        }
        _ => {}
    }
}

fn option_value(doc: &Document, option: NodeId) -> String {
    match doc.element(option).attr("value") {
        Some(v) => v.to_string(),
        None => doc.text_content(option).trim().to_string(),
    }
}
