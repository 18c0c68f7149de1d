//! HTTP transport seam
//!
//! The service layer talks to the judge only through [`Transport`], so that
//! the scraping and submission logic can run against canned pages.

mod http;

pub use http::HttpTransport;

use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to build http client: {0}")]
    Build(reqwest::Error),
    #[error("request failed ({url}): {error}")]
    Request { error: reqwest::Error, url: Url },
    #[error("unexpected status {status} ({url})")]
    Status { status: u16, url: Url },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub name: String,
    pub filename: String,
    pub content: Vec<u8>,
}

/// Multipart form payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    pub fields: Vec<(String, String)>,
    pub files: Vec<FilePart>,
}

impl FormData {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn file(&self, name: &str) -> Option<&FilePart> {
        self.files.iter().find(|file| file.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Empty,
    Multipart(FormData),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub body: Body,
}

impl Request {
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::Get,
            url,
            body: Body::Empty,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    /// URL after redirects.
    pub final_url: Url,
    pub body: Vec<u8>,
    /// Charset declared by `Content-Type`, if any.
    pub encoding: Option<String>,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn error_for_status(self) -> Result<Self, Error> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(Error::Status {
                status: self.status,
                url: self.final_url,
            })
        }
    }
}

pub trait Transport {
    /// Perform a single round trip. Network failures are errors, HTTP
    /// statuses are not.
    fn request(&self, request: Request) -> impl Future<Output = Result<Response, Error>> + Send;
}
