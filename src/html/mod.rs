//! Document helpers over `scraper`
//!
//! Thin tree queries shared by the table scraper, the sample matcher and the
//! submission flow.

mod form;

pub use form::FormSender;

use encoding_rs::{Encoding, UTF_8};
use itertools::Itertools as _;
use scraper::{ElementRef, Html, Node};
use tracing::warn;

use crate::transport::Response;

/// Decode a response body by its declared charset and parse it as an HTML
/// document. Bodies without a charset are read as UTF-8.
pub fn parse(response: &Response) -> Html {
    let encoding = match response.encoding.as_deref() {
        None => UTF_8,
        Some(label) => Encoding::for_label(label.as_bytes()).unwrap_or_else(|| {
            warn!(charset = label, url = %response.final_url, "unknown charset, reading as utf-8");
            UTF_8
        }),
    };
    let (text, encoding, malformed) = encoding.decode(&response.body);
    if malformed {
        warn!(charset = encoding.name(), url = %response.final_url, "malformed bytes in body");
    }
    Html::parse_document(&text)
}

pub fn parent_element(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element.parent().and_then(ElementRef::wrap)
}

/// Nearest preceding sibling that is an element, skipping text and comments.
pub fn previous_sibling_element(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element.prev_siblings().find_map(ElementRef::wrap)
}

/// Child elements in document order.
pub fn child_elements<'a>(element: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    element.children().filter_map(ElementRef::wrap)
}

/// Text content, trimmed at both ends.
pub fn trimmed_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_owned()
}

/// Text content with every whitespace run collapsed into one space.
pub fn collapsed_text(element: ElementRef<'_>) -> String {
    element.text().flat_map(str::split_whitespace).join(" ")
}

pub fn has_exact_classes(element: ElementRef<'_>, classes: &[&str]) -> bool {
    element.value().classes().eq(classes.iter().copied())
}

/// Raw content of a pre-formatted block: text nodes in order, `<br>` as a
/// newline, comments dropped.
pub fn pre_content(element: ElementRef<'_>) -> String {
    let mut content = String::new();
    for node in element.descendants() {
        match node.value() {
            Node::Text(text) => content.push_str(text),
            Node::Element(e) if e.name() == "br" => content.push('\n'),
            _ => {}
        }
    }
    content
}

/// Normalize CRLF and lone CR line endings to LF and guarantee a trailing
/// newline.
pub fn textfile(s: &str) -> String {
    let mut s = s.replace("\r\n", "\n").replace('\r', "\n");
    if !s.ends_with('\n') {
        s.push('\n');
    }
    s
}

/// Drop leading lines that contain only whitespace.
pub fn strip_leading_blank_lines(s: &str) -> &str {
    let mut rest = s;
    while let Some((line, tail)) = rest.split_once('\n') {
        if !line.trim().is_empty() {
            break;
        }
        rest = tail;
    }
    if rest.trim().is_empty() { "" } else { rest }
}
