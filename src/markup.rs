//! Plain-text views of registry markup
//!
//! The registry returns small, regular HTML fragments. These helpers turn
//! parsed elements into text lines for field extraction, and whole payloads
//! into readable text for the terminal.

use scraper::{ElementRef, Html, Node};

/// Every non-blank line of every text node under `el`, trimmed, in
/// document order. Separate text nodes never share a line.
pub fn element_lines(el: ElementRef<'_>) -> Vec<String> {
    el.text()
        .flat_map(|chunk| chunk.split('\n'))
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// All text under `el` joined without separators, trimmed
pub fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn breaks_line(tag: &str) -> bool {
    matches!(
        tag,
        "br" | "p"
            | "div"
            | "tr"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "li"
            | "table"
            | "thead"
            | "tbody"
    )
}

fn render_into(el: ElementRef<'_>, out: &mut String) {
    for child in el.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(element) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    render_into(child_el, out);
                }
                match element.name() {
                    "td" | "th" => out.push_str(" | "),
                    name if breaks_line(name) => out.push('\n'),
                    _ => {}
                }
            }
            _ => {}
        }
    }
}

/// Readable rendering for the terminal: block elements break lines,
/// table cells are separated by " | "
pub fn to_display_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut raw = String::new();
    render_into(fragment.root_element(), &mut raw);

    raw.lines()
        .map(|line| line.trim().trim_end_matches(" |").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
