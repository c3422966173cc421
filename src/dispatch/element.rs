//! Page elements and the selectors used to match them
//!
//! An `Element` is the minimal shape an event target needs for delegation:
//! tag name, optional id, class list, `data-*` attributes, an input value
//! and a link to its parent so `closest()` can walk up the tree.

use std::collections::BTreeMap;

/// An element that can be the target of a page event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    /// `data-*` attributes, keyed without the `data-` prefix
    pub data: BTreeMap<String, String>,
    /// Current value for input elements
    pub value: Option<String>,
    pub parent: Option<Box<Element>>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Nest this element inside `parent`
    pub fn within(mut self, parent: Element) -> Self {
        self.parent = Some(Box::new(parent));
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn data(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }

    pub fn matches(&self, selector: &Selector) -> bool {
        if let Some(tag) = &selector.tag {
            if &self.tag != tag {
                return false;
            }
        }
        if let Some(id) = &selector.id {
            if self.id.as_ref() != Some(id) {
                return false;
            }
        }
        selector.classes.iter().all(|c| self.has_class(c))
    }

    /// First element matching `selector`, starting at self and walking up
    pub fn closest_matching(&self, selector: &Selector) -> Option<&Element> {
        let mut current = Some(self);
        while let Some(el) = current {
            if el.matches(selector) {
                return Some(el);
            }
            current = el.parent.as_deref();
        }
        None
    }

    /// String form of `closest_matching`. Invalid selectors match nothing.
    pub fn closest(&self, selector: &str) -> Option<&Element> {
        Selector::parse(selector).and_then(|s| self.closest_matching(&s))
    }
}

/// A compound simple selector: `tag`, `#id`, `.class`, or combinations
/// such as `tr.link-view` and `button#btnList.btn`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

impl Selector {
    /// Parse a selector. Returns `None` for empty input, descendant
    /// combinators (whitespace), empty names, or more than one id.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.is_empty() || input.contains(char::is_whitespace) {
            return None;
        }

        let mut selector = Selector::default();
        let tag_end = input.find(['#', '.']).unwrap_or(input.len());
        if tag_end > 0 {
            selector.tag = Some(input[..tag_end].to_ascii_lowercase());
        }

        let mut rest = &input[tag_end..];
        while let Some(marker) = rest.chars().next() {
            let body = &rest[marker.len_utf8()..];
            let end = body.find(['#', '.']).unwrap_or(body.len());
            let name = &body[..end];
            if name.is_empty() {
                return None;
            }
            if marker == '#' {
                if selector.id.is_some() {
                    return None;
                }
                selector.id = Some(name.to_string());
            } else {
                selector.classes.push(name.to_string());
            }
            rest = &body[end..];
        }

        Some(selector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view_link() -> Element {
        let row = Element::new("tr").with_class("link-view").with_data("pid", "42");
        Element::new("a").with_class("link-view").within(row)
    }

    #[test]
    fn parses_compound_selectors() {
        let s = Selector::parse("tr.link-view").unwrap();
        assert_eq!(s.tag.as_deref(), Some("tr"));
        assert_eq!(s.classes, vec!["link-view".to_string()]);

        let s = Selector::parse("#HOAsearch").unwrap();
        assert_eq!(s.id.as_deref(), Some("HOAsearch"));
        assert!(s.tag.is_none());
    }

    #[test]
    fn rejects_malformed_selectors() {
        assert!(Selector::parse("").is_none());
        assert!(Selector::parse("div p").is_none());
        assert!(Selector::parse("a.").is_none());
        assert!(Selector::parse("#a#b").is_none());
    }

    #[test]
    fn matches_by_tag_id_and_class() {
        let input = Element::new("INPUT").with_id("HOAsearch");
        assert!(input.matches(&Selector::parse("input").unwrap()));
        assert!(input.matches(&Selector::parse("#HOAsearch").unwrap()));
        assert!(input.matches(&Selector::parse("input#HOAsearch").unwrap()));
        assert!(!input.matches(&Selector::parse("#btnList").unwrap()));
        assert!(!input.matches(&Selector::parse(".link-view").unwrap()));
    }

    #[test]
    fn closest_walks_up_to_the_row() {
        let link = view_link();
        let row = link.closest("tr").expect("row ancestor");
        assert_eq!(row.data("pid"), Some("42"));

        // Self counts as a candidate
        assert_eq!(link.closest(".link-view").map(|e| e.tag.as_str()), Some("a"));
        assert!(link.closest("table").is_none());
    }
}
