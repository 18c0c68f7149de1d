use url::Url;

pub mod archive;
pub mod cache;
pub mod config;
pub mod entity;
pub mod html;
pub mod sample;
pub mod service;
pub mod table;
pub mod transport;

#[cfg(test)]
mod tests;

pub use cache::ApiCache;
pub use config::Config;
pub use entity::{Contest, Entity, Problem, Service};
pub use sample::NamedSample;
pub use service::{
    Client, Language, ProblemListOptions, ProblemSort, SubmissionOutcome, SubmissionStatus,
};
pub use table::{ColumnValue, PageShape, TabularRecord};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("transport error: {0}")]
    Transport(transport::Error),
    #[error("unexpected page shape ({url}): {detail}")]
    PageShape { url: Url, detail: PageShape },
    #[error("not logged in")]
    NotAuthenticated,
    #[error("failed to resolve: {0}")]
    Resolution(cache::Unresolved),
    #[error("failed to extract system test cases ({url}): {error}")]
    Archive { url: Url, error: archive::Error },
    #[error("failed to decode api response ({url}): {error}")]
    DecodeApi { url: Url, error: serde_json::Error },
    #[error("invalid url: {0}")]
    Url(url::ParseError),
}

impl Error {
    fn page_shape(url: &Url) -> impl FnOnce(PageShape) -> Error {
        move |detail| Error::PageShape {
            url: url.clone(),
            detail,
        }
    }
}
