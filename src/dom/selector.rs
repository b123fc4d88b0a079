//! Parser and matcher for the locator grammar
//!
//! The resolver only ever emits a small CSS subset: `#id`, `tag[attr="v"]`,
//! `[data-qa="v"]`, `:nth-of-type(n)` suffixes, and descendant chains of
//! those. This module parses that subset (including identifier escapes) and
//! matches it against a [`Document`].

use crate::core::error::{RefillError, Result};
use crate::dom::document::{Document, NodeId};

/// One compound in a descendant chain
#[derive(Debug, Clone, Default, PartialEq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    attrs: Vec<(String, String)>,
    nth_of_type: Option<usize>,
}

/// A parsed selector: compounds joined by descendant combinators
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    parts: Vec<Compound>,
}

impl Selector {
    /// Parse a selector string
    pub fn parse(input: &str) -> Result<Self> {
        let parts = Parser::new(input).run()?;
        Ok(Self { parts })
    }

    /// Whether `node` matches the full chain
    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        let (last, rest) = match self.parts.split_last() {
            Some(split) => split,
            None => return false,
        };
        if !matches_compound(doc, node, last) {
            return false;
        }
        // Each earlier compound must match some strictly higher ancestor,
        // right to left.
        let mut current = doc.element(node).parent();
        for part in rest.iter().rev() {
            loop {
                let candidate = match current {
                    Some(n) => n,
                    None => return false,
                };
                current = doc.element(candidate).parent();
                if matches_compound(doc, candidate, part) {
                    break;
                }
            }
        }
        true
    }

    /// All matching nodes in document order
    pub fn query_all(&self, doc: &Document) -> Vec<NodeId> {
        doc.walk()
            .into_iter()
            .filter(|&n| self.matches(doc, n))
            .collect()
    }

    /// First matching node in document order
    pub fn query_first(&self, doc: &Document) -> Option<NodeId> {
        doc.walk().into_iter().find(|&n| self.matches(doc, n))
    }

    /// The node if and only if exactly one matches
    pub fn query_unique(&self, doc: &Document) -> Option<NodeId> {
        let mut found = None;
        for node in doc.walk() {
            if self.matches(doc, node) {
                if found.is_some() {
                    return None;
                }
                found = Some(node);
            }
        }
        found
    }
}

fn matches_compound(doc: &Document, node: NodeId, compound: &Compound) -> bool {
    let el = doc.element(node);
    if let Some(tag) = &compound.tag {
        if el.tag() != tag {
            return false;
        }
    }
    if let Some(id) = &compound.id {
        if el.attr("id") != Some(id.as_str()) {
            return false;
        }
    }
    for (name, value) in &compound.attrs {
        if el.attr(name) != Some(value.as_str()) {
            return false;
        }
    }
    if let Some(n) = compound.nth_of_type {
        if doc.nth_of_type(node) != n {
            return false;
        }
    }
    true
}

/// Escape a string for use as a CSS identifier
///
/// Follows the `CSS.escape` algorithm: leading digits and control characters
/// become hex escapes, identifier characters pass through, everything else
/// gets a backslash prefix.
pub fn css_escape(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len());
    let count = ident.chars().count();
    for (i, ch) in ident.chars().enumerate() {
        let code = ch as u32;
        if ch == '\0' {
            out.push('\u{FFFD}');
        } else if (0x01..=0x1f).contains(&code)
            || code == 0x7f
            || (i == 0 && ch.is_ascii_digit())
            || (i == 1 && ch.is_ascii_digit() && ident.starts_with('-'))
        {
            out.push_str(&format!("\\{:x} ", code));
        } else if i == 0 && ch == '-' && count == 1 {
            out.push('\\');
            out.push(ch);
        } else if code >= 0x80 || ch == '-' || ch == '_' || ch.is_ascii_alphanumeric() {
            out.push(ch);
        } else {
            out.push('\\');
            out.push(ch);
        }
    }
    out
}

/// Escape a string for use inside a double-quoted attribute value
pub fn escape_attr_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn run(mut self) -> Result<Vec<Compound>> {
        let mut parts = Vec::new();
        loop {
            self.skip_whitespace();
            if self.peek().is_none() {
                break;
            }
            parts.push(self.parse_compound()?);
        }
        if parts.is_empty() {
            return Err(RefillError::selector("empty selector"));
        }
        Ok(parts)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        match self.bump() {
            Some(ch) if ch == expected => Ok(()),
            other => Err(RefillError::selector(format!(
                "expected '{}', found {:?}",
                expected, other
            ))),
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(ch) if ch.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn parse_compound(&mut self) -> Result<Compound> {
        let mut compound = Compound::default();

        if matches!(self.peek(), Some(ch) if is_ident_start(ch)) {
            compound.tag = Some(self.parse_ident()?.to_ascii_lowercase());
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.pos += 1;
                    compound.id = Some(self.parse_ident()?);
                }
                Some('[') => {
                    self.pos += 1;
                    let name = self.parse_ident()?;
                    self.expect('=')?;
                    self.expect('"')?;
                    let value = self.parse_quoted()?;
                    self.expect(']')?;
                    compound.attrs.push((name, value));
                }
                Some(':') => {
                    self.pos += 1;
                    let name = self.parse_ident()?;
                    if name != "nth-of-type" {
                        return Err(RefillError::selector(format!(
                            "unsupported pseudo-class ':{}'",
                            name
                        )));
                    }
                    self.expect('(')?;
                    compound.nth_of_type = Some(self.parse_number()?);
                    self.expect(')')?;
                }
                Some(ch) if ch.is_whitespace() => break,
                None => break,
                Some(ch) => {
                    return Err(RefillError::selector(format!(
                        "unexpected character '{}'",
                        ch
                    )));
                }
            }
        }

        if compound == Compound::default() {
            return Err(RefillError::selector("empty compound selector"));
        }
        Ok(compound)
    }

    fn parse_ident(&mut self) -> Result<String> {
        let mut out = String::new();
        loop {
            match self.peek() {
                Some('\\') => {
                    self.pos += 1;
                    out.push(self.parse_escape()?);
                }
                Some(ch) if is_ident_char(ch) => {
                    out.push(ch);
                    self.pos += 1;
                }
                _ => break,
            }
        }
        if out.is_empty() {
            return Err(RefillError::selector("expected identifier"));
        }
        Ok(out)
    }

    /// Decode one backslash escape: up to six hex digits with an optional
    /// trailing whitespace terminator, or a literal next character.
    fn parse_escape(&mut self) -> Result<char> {
        let first = self
            .peek()
            .ok_or_else(|| RefillError::selector("dangling escape"))?;
        if first.is_ascii_hexdigit() {
            let mut hex = String::new();
            while hex.len() < 6 {
                match self.peek() {
                    Some(ch) if ch.is_ascii_hexdigit() => {
                        hex.push(ch);
                        self.pos += 1;
                    }
                    _ => break,
                }
            }
            if matches!(self.peek(), Some(ch) if ch.is_whitespace()) {
                self.pos += 1;
            }
            let code = u32::from_str_radix(&hex, 16)
                .map_err(|e| RefillError::selector(format!("bad hex escape: {}", e)))?;
            char::from_u32(code)
                .ok_or_else(|| RefillError::selector(format!("invalid code point {:x}", code)))
        } else {
            self.pos += 1;
            Ok(first)
        }
    }

    fn parse_quoted(&mut self) -> Result<String> {
        let mut out = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(out),
                Some('\\') => match self.bump() {
                    Some(ch) => out.push(ch),
                    None => return Err(RefillError::selector("dangling escape in value")),
                },
                Some(ch) => out.push(ch),
                None => return Err(RefillError::selector("unterminated attribute value")),
            }
        }
    }

    fn parse_number(&mut self) -> Result<usize> {
        let mut digits = String::new();
        while let Some(ch) = self.peek() {
            if !ch.is_ascii_digit() {
                break;
            }
            digits.push(ch);
            self.pos += 1;
        }
        digits
            .parse()
            .map_err(|e| RefillError::selector(format!("bad index: {}", e)))
    }
}

fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || ch as u32 >= 0x80 || ch == '\\'
}

fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || ch as u32 >= 0x80
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with_form() -> (Document, NodeId, NodeId) {
        let mut doc = Document::new();
        let form = doc.append_element(doc.body(), "form", &[]);
        let input = doc.append_element(form, "input", &[("name", "email"), ("id", "em")]);
        (doc, form, input)
    }

    #[test]
    fn test_id_selector() {
        let (doc, _, input) = doc_with_form();
        let sel = Selector::parse("#em").unwrap();
        assert_eq!(sel.query_first(&doc), Some(input));
    }

    #[test]
    fn test_tag_attr_selector() {
        let (doc, _, input) = doc_with_form();
        let sel = Selector::parse("input[name=\"email\"]").unwrap();
        assert_eq!(sel.query_unique(&doc), Some(input));
    }

    #[test]
    fn test_descendant_chain_with_nth() {
        let mut doc = Document::new();
        let form1 = doc.append_element(doc.body(), "form", &[]);
        let form2 = doc.append_element(doc.body(), "form", &[]);
        doc.append_element(form1, "input", &[("name", "q")]);
        let second = doc.append_element(form2, "input", &[("name", "q")]);

        let sel = Selector::parse("form:nth-of-type(2) input[name=\"q\"]").unwrap();
        assert_eq!(sel.query_unique(&doc), Some(second));
    }

    #[test]
    fn test_query_unique_rejects_ambiguity() {
        let mut doc = Document::new();
        doc.append_element(doc.body(), "input", &[("name", "q")]);
        doc.append_element(doc.body(), "input", &[("name", "q")]);

        let sel = Selector::parse("input[name=\"q\"]").unwrap();
        assert_eq!(sel.query_unique(&doc), None);
    }

    #[test]
    fn test_css_escape_leading_digit_round_trip() {
        let escaped = css_escape("1email");
        assert_eq!(escaped, "\\31 email");

        let mut doc = Document::new();
        let input = doc.append_element(doc.body(), "input", &[("id", "1email")]);
        let sel = Selector::parse(&format!("#{}", escaped)).unwrap();
        assert_eq!(sel.query_first(&doc), Some(input));
    }

    #[test]
    fn test_css_escape_punctuation_round_trip() {
        let escaped = css_escape("user.name");
        assert_eq!(escaped, "user\\.name");

        let mut doc = Document::new();
        let input = doc.append_element(doc.body(), "input", &[("id", "user.name")]);
        let sel = Selector::parse(&format!("#{}", escaped)).unwrap();
        assert_eq!(sel.query_first(&doc), Some(input));
    }

    #[test]
    fn test_attr_value_with_spaces() {
        let mut doc = Document::new();
        let node = doc.append_element(doc.body(), "div", &[("data-qa", "main panel")]);
        let sel = Selector::parse("[data-qa=\"main panel\"]").unwrap();
        assert_eq!(sel.query_first(&doc), Some(node));
    }

    #[test]
    fn test_bare_positional_chain() {
        let mut doc = Document::new();
        let div = doc.append_element(doc.body(), "div", &[]);
        doc.append_element(div, "span", &[]);
        let span2 = doc.append_element(div, "span", &[]);

        let sel = Selector::parse("div span:nth-of-type(2)").unwrap();
        assert_eq!(sel.query_first(&doc), Some(span2));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Selector::parse("").is_err());
        assert!(Selector::parse("div >> p").is_err());
        assert!(Selector::parse("input[name=unquoted]").is_err());
        assert!(Selector::parse("p:first-child").is_err());
    }
}
