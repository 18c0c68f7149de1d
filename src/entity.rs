//! URL to entity resolution
//!
//! Every resolver is a plain function from a parsed judge URL to an entity.
//! [`RESOLVERS`] tries them in a fixed order and the first match wins, so the
//! catch-all service resolver comes last.

use std::fmt;

use serde::Serialize;
use url::Url;

use crate::config::Config;

/// The judge site itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Service;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Contest {
    pub contest_id: u64,
}

/// A problem addressed either by its display number or by its internal id.
///
/// The two address different pages and are never converted into each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Problem {
    No(u64),
    Id(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    Service,
    Contest(Contest),
    Problem(Problem),
}

/// A URL on the configured judge host, with its path normalized into segments.
pub struct JudgeUrl {
    pub url: Url,
    pub segments: Vec<String>,
}

fn normalize_segments(path: &str) -> Vec<String> {
    let mut segments: Vec<String> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            segment => segments.push(segment.to_owned()),
        }
    }
    segments
}

impl JudgeUrl {
    pub fn parse(src: &str, config: &Config) -> Option<Self> {
        let url = match Url::parse(src) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                Url::parse(&format!("https://{src}")).ok()?
            }
            Err(_) => return None,
        };
        if !matches!(url.scheme(), "http" | "https") {
            return None;
        }
        if url.host_str() != config.host() {
            return None;
        }
        let segments = normalize_segments(url.path());
        Some(Self { url, segments })
    }

    fn parts(&self) -> Vec<&str> {
        self.segments.iter().map(String::as_str).collect()
    }
}

pub struct Resolver {
    pub name: &'static str,
    pub try_match: fn(&JudgeUrl) -> Option<Entity>,
}

pub const RESOLVERS: [Resolver; 3] = [
    Resolver {
        name: "problem",
        try_match: |url| Problem::try_match(url).map(Entity::Problem),
    },
    Resolver {
        name: "contest",
        try_match: |url| Contest::try_match(url).map(Entity::Contest),
    },
    Resolver {
        name: "service",
        try_match: |url| Service::try_match(url).map(|_| Entity::Service),
    },
];

/// Resolve `src` against [`RESOLVERS`]; `None` when nothing matches.
pub fn resolve(src: &str, config: &Config) -> Option<Entity> {
    let url = JudgeUrl::parse(src, config)?;
    RESOLVERS
        .iter()
        .find_map(|resolver| (resolver.try_match)(&url))
}

impl Service {
    fn try_match(_: &JudgeUrl) -> Option<Self> {
        Some(Service)
    }

    pub fn from_url(src: &str, config: &Config) -> Option<Self> {
        Self::try_match(&JudgeUrl::parse(src, config)?)
    }

    pub fn url(&self, config: &Config) -> Url {
        config.base_url.clone()
    }
}

impl Contest {
    // https://yukicoder.me/contests/276
    // https://yukicoder.me/contests/276/all
    fn try_match(url: &JudgeUrl) -> Option<Self> {
        match url.parts().as_slice() {
            ["contests", id, ..] => id.parse().ok().map(|contest_id| Contest { contest_id }),
            _ => None,
        }
    }

    pub fn from_url(src: &str, config: &Config) -> Option<Self> {
        Self::try_match(&JudgeUrl::parse(src, config)?)
    }

    pub fn url(&self, config: &Config) -> Result<Url, url::ParseError> {
        config.endpoint(&format!("contests/{}", self.contest_id))
    }
}

impl Problem {
    // https://yukicoder.me/problems/no/499
    // https://yukicoder.me/problems/1476
    fn try_match(url: &JudgeUrl) -> Option<Self> {
        match url.parts().as_slice() {
            ["problems", "no", no] => no.parse().ok().map(Problem::No),
            ["problems", id] => id.parse().ok().map(Problem::Id),
            _ => None,
        }
    }

    pub fn from_url(src: &str, config: &Config) -> Option<Self> {
        Self::try_match(&JudgeUrl::parse(src, config)?)
    }

    pub fn url(&self, config: &Config) -> Result<Url, url::ParseError> {
        config.endpoint(&self.path())
    }

    /// Endpoint below the problem page, e.g. `submit`.
    pub fn subpage(&self, config: &Config, name: &str) -> Result<Url, url::ParseError> {
        config.endpoint(&format!("{}/{name}", self.path()))
    }

    fn path(&self) -> String {
        match self {
            Problem::No(no) => format!("problems/no/{no}"),
            Problem::Id(id) => format!("problems/{id}"),
        }
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Problem::No(no) => write!(f, "No.{no}"),
            Problem::Id(id) => write!(f, "problem id {id}"),
        }
    }
}
