use std::sync::LazyLock;

use indexmap::IndexMap;
use itertools::Itertools as _;
use regex::Regex;
use tracing::warn;

use super::NamedSample;

static INPUT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)input|入力").unwrap());
static OUTPUT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)output|出力").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Input,
    Output,
    Unknown,
}

impl Role {
    pub fn from_heading(heading: &str) -> Self {
        match (INPUT.is_match(heading), OUTPUT.is_match(heading)) {
            (true, false) => Role::Input,
            (false, true) => Role::Output,
            _ => Role::Unknown,
        }
    }
}

#[derive(Default)]
struct Halves {
    group: String,
    input: Option<(String, Vec<u8>)>,
    output: Option<(String, Vec<u8>)>,
}

/// Pairs input and output halves that share a case-group heading.
///
/// Cases come out in the order their first half was seen. A case still
/// missing a half at [`SampleZipper::finish`] is dropped.
#[derive(Default)]
pub struct SampleZipper {
    cases: IndexMap<String, Halves>,
}

fn case_key(group: &str) -> String {
    group.split_whitespace().join(" ")
}

impl SampleZipper {
    pub fn add(&mut self, group: &str, sub_heading: &str, content: Vec<u8>) {
        let name = format!("{group} {sub_heading}");
        let halves = self
            .cases
            .entry(case_key(group))
            .or_insert_with(|| Halves {
                group: group.to_owned(),
                ..Default::default()
            });
        let slot = match Role::from_heading(sub_heading) {
            Role::Input => &mut halves.input,
            Role::Output => &mut halves.output,
            Role::Unknown => {
                warn!(name, "sample heading names neither input nor output");
                if halves.input.is_none() {
                    &mut halves.input
                } else {
                    &mut halves.output
                }
            }
        };
        if slot.is_some() {
            warn!(name, "duplicated sample half, keeping the first one");
            return;
        }
        *slot = Some((name, content));
    }

    pub fn finish(self) -> Vec<NamedSample> {
        self.cases
            .into_values()
            .filter_map(|halves| match halves {
                Halves {
                    group,
                    input: Some((input_name, input)),
                    output: Some((output_name, output)),
                } => Some(NamedSample {
                    name: group,
                    input_name,
                    input,
                    output_name,
                    output,
                }),
                Halves { group, .. } => {
                    warn!(group, "dropping incomplete sample");
                    None
                }
            })
            .collect()
    }
}
