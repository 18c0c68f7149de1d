//! System test case archives
//!
//! Archive entries are matched against a path pattern where `%s` stands for
//! the case name and `%e` for its role (`in` or `out`).

use std::{
    collections::BTreeMap,
    io::{Cursor, Read as _},
};

use regex::Regex;
use tracing::{debug, trace};

use crate::sample::NamedSample;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read archive: {0}")]
    Zip(zip::result::ZipError),
    #[error("failed to read archive entry {name}: {error}")]
    Entry { error: std::io::Error, name: String },
    #[error("invalid entry pattern {0:?}")]
    Pattern(String),
    #[error("test case {0} lacks its input or output")]
    Unpaired(String),
}

/// Layout of the judge's `testcase.zip`.
pub const YUKICODER_PATTERN: &str = "test_%e/%s";

fn compile(pattern: &str) -> Result<Regex, Error> {
    if !pattern.contains("%s") {
        return Err(Error::Pattern(pattern.to_owned()));
    }
    let mut source = String::from("^");
    let mut rest = pattern;
    while let Some(index) = rest.find('%') {
        source.push_str(&regex::escape(&rest[..index]));
        match rest.get(index + 1..index + 2) {
            Some("s") => source.push_str("(?P<name>[^/]+)"),
            Some("e") => source.push_str("(?P<role>in|out)"),
            _ => return Err(Error::Pattern(pattern.to_owned())),
        }
        rest = &rest[index + 2..];
    }
    source.push_str(&regex::escape(rest));
    source.push('$');
    Regex::new(&source).map_err(|_| Error::Pattern(pattern.to_owned()))
}

#[derive(Default)]
struct Entries {
    input: Option<(String, Vec<u8>)>,
    output: Option<(String, Vec<u8>)>,
}

/// Unpack `archive` into cases keyed by the `%s` part, sorted by name.
pub fn extract_from_zip(archive: &[u8], pattern: &str) -> Result<Vec<NamedSample>, Error> {
    let regex = compile(pattern)?;
    let mut zip = zip::ZipArchive::new(Cursor::new(archive)).map_err(Error::Zip)?;
    let mut cases = BTreeMap::<String, Entries>::new();
    for index in 0..zip.len() {
        let mut file = zip.by_index(index).map_err(Error::Zip)?;
        if file.is_dir() {
            continue;
        }
        let path = file.name().to_owned();
        let Some(captures) = regex.captures(&path) else {
            trace!(path, "skip archive entry");
            continue;
        };
        let name = captures["name"].to_owned();
        let role = captures.name("role").map(|role| role.as_str().to_owned());
        let mut content = Vec::new();
        file.read_to_end(&mut content)
            .map_err(|error| Error::Entry {
                error,
                name: path.clone(),
            })?;
        debug!(path, len = content.len(), "archive entry");
        let entries = cases.entry(name).or_default();
        match role.as_deref() {
            Some("out") => entries.output = Some((path, content)),
            _ => entries.input = Some((path, content)),
        }
    }
    cases
        .into_iter()
        .map(|(name, entries)| match entries {
            Entries {
                input: Some((input_name, input)),
                output: Some((output_name, output)),
            } => Ok(NamedSample {
                name,
                input_name,
                input,
                output_name,
                output,
            }),
            _ => Err(Error::Unpaired(name)),
        })
        .collect()
}
