//! Owned HTML node tree.
//!
//! Renderers build [`Element`] trees instead of strings so tests can inspect
//! structure (child counts, attributes, visible text) and escaping happens in
//! exactly one place: [`Node::write_html`].

use std::fmt::Write as _;

/// Elements serialized without a closing tag.
const VOID_TAGS: [&str; 4] = ["br", "img", "input", "hr"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    #[must_use]
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_owned(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Sets `name` to `value`, replacing any previous value.
    #[must_use]
    pub fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value,
            None => self.attrs.push((name.to_owned(), value)),
        }
    }

    #[must_use]
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    #[must_use]
    pub fn text(self, text: impl Into<String>) -> Self {
        self.child(Node::Text(text.into()))
    }

    pub fn append(&mut self, node: impl Into<Node>) {
        self.children.push(node.into());
    }

    pub fn clear(&mut self) {
        self.children.clear();
    }

    /// Child elements, skipping text nodes.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// Depth-first search for every descendant element matching `pred`.
    #[must_use]
    pub fn find_all(&self, pred: &dyn Fn(&Element) -> bool) -> Vec<&Element> {
        let mut out = Vec::new();
        collect(self, pred, &mut out);
        out
    }

    /// Whether the `class` attribute lists `class`.
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.get_attr("class")
            .is_some_and(|c| c.split_whitespace().any(|c| c == class))
    }

    /// Concatenated text of all descendants; `<br>` becomes `\n`.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        Node::Element(self.clone()).push_text(&mut out);
        out
    }

    #[must_use]
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        write_element(self, &mut out);
        out
    }
}

fn collect<'a>(el: &'a Element, pred: &dyn Fn(&Element) -> bool, out: &mut Vec<&'a Element>) {
    for child in el.child_elements() {
        if pred(child) {
            out.push(child);
        }
        collect(child, pred, out);
    }
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Node::Element(el)
    }
}

impl Node {
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    pub fn write_html(&self, out: &mut String) {
        match self {
            Node::Element(el) => write_element(el, out),
            Node::Text(text) => out.push_str(&escape_html(text)),
        }
    }

    fn push_text(&self, out: &mut String) {
        match self {
            Node::Text(t) => out.push_str(t),
            Node::Element(el) if el.tag == "br" => out.push('\n'),
            Node::Element(el) => {
                for child in &el.children {
                    child.push_text(out);
                }
            }
        }
    }
}

fn write_element(el: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&el.tag);
    for (name, value) in &el.attrs {
        if value.is_empty() && is_boolean_attr(name) {
            let _ = write!(out, " {name}");
        } else {
            let _ = write!(out, " {name}=\"{}\"", escape_html(value));
        }
    }
    out.push('>');

    if VOID_TAGS.contains(&el.tag.as_str()) {
        return;
    }

    for child in &el.children {
        child.write_html(out);
    }
    let _ = write!(out, "</{}>", el.tag);
}

fn is_boolean_attr(name: &str) -> bool {
    matches!(name, "allowfullscreen" | "hidden" | "disabled")
}

/// Escapes the five HTML-significant characters.
#[must_use]
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Formats `fraction * 100` as a CSS percentage with at most four decimals,
/// e.g. `0.125` → `"12.5%"`.
#[must_use]
pub fn css_percent(fraction: f64) -> String {
    let formatted = format!("{:.4}", fraction * 100.0);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    let trimmed = if trimmed.is_empty() || trimmed == "-" { "0" } else { trimmed };
    format!("{trimmed}%")
}
