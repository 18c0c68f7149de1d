use indexmap::IndexMap;
use scraper::{ElementRef, Selector};
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

use crate::transport::{Body, FilePart, FormData, Method, Request};

static INPUT: LazyLock<Selector> = LazyLock::new(|| Selector::parse("input").unwrap());

/// Fills in an HTML form the way a browser would submit it.
///
/// Starts from the named `input` elements that carry a value (checkboxes and
/// radio buttons excluded); fields are then overridden, removed or joined by
/// file parts before the form is turned into a [`Request`].
#[derive(Debug, Clone)]
pub struct FormSender {
    action: Url,
    method: Method,
    payload: IndexMap<String, String>,
    files: IndexMap<String, FilePart>,
}

impl FormSender {
    pub fn new(form: ElementRef<'_>, page_url: &Url) -> Self {
        let action = form
            .value()
            .attr("action")
            .and_then(|action| page_url.join(action).ok())
            .unwrap_or_else(|| page_url.clone());
        let method = match form.value().attr("method") {
            Some(method) if method.eq_ignore_ascii_case("post") => Method::Post,
            _ => Method::Get,
        };
        let mut payload = IndexMap::new();
        for input in form.select(&INPUT) {
            let input = input.value();
            if matches!(input.attr("type"), Some("checkbox" | "radio")) {
                continue;
            }
            if let (Some(name), Some(value)) = (input.attr("name"), input.attr("value")) {
                debug!(name, value, "form input");
                payload.insert(name.to_owned(), value.to_owned());
            }
        }
        Self {
            action,
            method,
            payload,
            files: IndexMap::new(),
        }
    }

    pub fn action(&self) -> &Url {
        &self.action
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.payload.get(name).map(String::as_str)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.payload.insert(name.into(), value.into());
    }

    pub fn set_file(
        &mut self,
        name: impl Into<String>,
        filename: impl Into<String>,
        content: impl Into<Vec<u8>>,
    ) {
        let name = name.into();
        self.files.insert(
            name.clone(),
            FilePart {
                name,
                filename: filename.into(),
                content: content.into(),
            },
        );
    }

    pub fn unset(&mut self, name: &str) {
        self.payload.shift_remove(name);
    }

    /// The request the form's declared method produces. A form carrying file
    /// parts is always posted as multipart, whatever its method.
    pub fn into_request(self) -> Request {
        match self.method {
            Method::Get if self.files.is_empty() => {
                let mut url = self.action;
                url.query_pairs_mut().extend_pairs(self.payload);
                Request::get(url)
            }
            Method::Get => {
                debug!(action = %self.action, "get form with file parts, posting instead");
                self.into_multipart()
            }
            Method::Post => self.into_multipart(),
        }
    }

    /// Multipart POST to the form's action.
    pub fn into_multipart(self) -> Request {
        Request {
            method: Method::Post,
            url: self.action,
            body: Body::Multipart(FormData {
                fields: self.payload.into_iter().collect(),
                files: self.files.into_values().collect(),
            }),
        }
    }
}
