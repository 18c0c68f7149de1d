use std::sync::Arc;

use reqwest::{
    cookie::Jar,
    header::CONTENT_TYPE,
    multipart::{Form, Part},
};
use tracing::debug;

use crate::config::{Config, SESSION_COOKIE};

use super::{Body, Error, Method, Request, Response, Transport};

/// [`Transport`] backed by a cookie-holding `reqwest::Client`.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &Config) -> Result<Self, Error> {
        let jar = Arc::new(Jar::default());
        if let Some(session) = &config.session {
            jar.add_cookie_str(
                &format!("{SESSION_COOKIE}={session}; Path=/"),
                &config.base_url,
            );
        }
        let mut builder = reqwest::Client::builder().cookie_provider(jar);
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent);
        }
        Ok(Self {
            client: builder.build().map_err(Error::Build)?,
        })
    }
}

fn charset(response: &reqwest::Response) -> Option<String> {
    let content_type = response.headers().get(CONTENT_TYPE)?.to_str().ok()?;
    let mime = content_type.parse::<mime::Mime>().ok()?;
    mime.get_param(mime::CHARSET).map(|charset| charset.to_string())
}

fn multipart(data: super::FormData) -> Form {
    let form = data
        .fields
        .into_iter()
        .fold(Form::new(), |acc, (name, value)| acc.text(name, value));
    data.files.into_iter().fold(form, |acc, file| {
        acc.part(file.name, Part::bytes(file.content).file_name(file.filename))
    })
}

impl Transport for HttpTransport {
    async fn request(&self, request: Request) -> Result<Response, Error> {
        let Request { method, url, body } = request;
        debug!(?method, %url, "request");
        let builder = match method {
            Method::Get => self.client.get(url.clone()),
            Method::Post => self.client.post(url.clone()),
        };
        let builder = match body {
            Body::Empty => builder,
            Body::Multipart(form) => builder.multipart(multipart(form)),
        };
        let response = builder
            .send()
            .await
            .map_err(|error| Error::Request {
                error,
                url: url.clone(),
            })?;
        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let encoding = charset(&response);
        let body = response
            .bytes()
            .await
            .map_err(|error| Error::Request { error, url })?
            .to_vec();
        debug!(status, %final_url, len = body.len(), "response");
        Ok(Response {
            status,
            final_url,
            body,
            encoding,
        })
    }
}
