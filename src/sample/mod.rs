//! Sample test case extraction
//!
//! Problem pages show samples as `pre` blocks. Whether a block is a sample,
//! and what it is called, is decided purely from the elements around it:
//!
//! ```text
//! <h5>サンプル1</h5>              group heading (previous sibling of the container)
//! <div class="paragraph">         container
//!   <h6>入力</h6>                 sub-heading (previous sibling of the block)
//!   <pre>1 2</pre>                candidate block
//! </div>
//! ```
//!
//! The layout is described by [`SampleLayout`] as data and checked against
//! each candidate; accepted halves are paired by [`SampleZipper`].

mod zipper;

pub use zipper::{Role, SampleZipper};

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, trace, warn};

use crate::html;

/// An input/output pair, bytes kept exactly as shown on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedSample {
    pub name: String,
    pub input_name: String,
    pub input: Vec<u8>,
    pub output_name: String,
    pub output: Vec<u8>,
}

/// Where a structural element sits relative to the candidate block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    PreviousSibling,
    Parent,
    ParentPreviousSibling,
}

impl Relation {
    fn resolve(self, block: ElementRef<'_>) -> Option<ElementRef<'_>> {
        match self {
            Relation::PreviousSibling => html::previous_sibling_element(block),
            Relation::Parent => html::parent_element(block),
            Relation::ParentPreviousSibling => {
                html::parent_element(block).and_then(html::previous_sibling_element)
            }
        }
    }
}

/// A required element: its position, tag and (if given) exact class list.
#[derive(Debug, Clone, Copy)]
pub struct Shape {
    pub relation: Relation,
    pub tag: &'static str,
    pub classes: Option<&'static [&'static str]>,
}

impl Shape {
    pub fn find<'a>(&self, block: ElementRef<'a>) -> Option<ElementRef<'a>> {
        self.relation
            .resolve(block)
            .filter(|element| element.value().name() == self.tag)
            .filter(|element| {
                self.classes
                    .is_none_or(|classes| html::has_exact_classes(*element, classes))
            })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SampleLayout {
    pub candidates: &'static str,
    pub sub_heading: Shape,
    pub container: Shape,
    pub group_heading: Shape,
}

pub const YUKICODER_LAYOUT: SampleLayout = SampleLayout {
    candidates: ".sample pre",
    sub_heading: Shape {
        relation: Relation::PreviousSibling,
        tag: "h6",
        classes: None,
    },
    container: Shape {
        relation: Relation::Parent,
        tag: "div",
        classes: Some(&["paragraph"]),
    },
    group_heading: Shape {
        relation: Relation::ParentPreviousSibling,
        tag: "h5",
        classes: None,
    },
};

/// A candidate block that satisfied every shape of the layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedBlock {
    pub group: String,
    pub sub_heading: String,
    pub content: String,
}

impl AcceptedBlock {
    pub fn name(&self) -> String {
        format!("{} {}", self.group, self.sub_heading)
    }
}

impl SampleLayout {
    pub fn accept(&self, block: ElementRef<'_>) -> Option<AcceptedBlock> {
        let sub_heading = self.sub_heading.find(block)?;
        self.container.find(block)?;
        let group = self.group_heading.find(block)?;
        let content = html::pre_content(block);
        Some(AcceptedBlock {
            group: html::trimmed_text(group),
            sub_heading: html::trimmed_text(sub_heading),
            content: html::textfile(html::strip_leading_blank_lines(&content)),
        })
    }

    pub fn extract(&self, document: &Html) -> Vec<NamedSample> {
        let selector = match Selector::parse(self.candidates) {
            Ok(selector) => selector,
            Err(error) => {
                warn!(candidates = self.candidates, %error, "invalid candidate selector");
                return Vec::new();
            }
        };
        let mut samples = SampleZipper::default();
        for block in document.select(&selector) {
            match self.accept(block) {
                Some(accepted) => {
                    debug!(name = accepted.name(), "sample block");
                    samples.add(&accepted.group, &accepted.sub_heading, accepted.content.into_bytes());
                }
                None => trace!(html = block.html(), "skip pre block"),
            }
        }
        samples.finish()
    }
}

pub fn extract_samples(document: &Html) -> Vec<NamedSample> {
    YUKICODER_LAYOUT.extract(document)
}
