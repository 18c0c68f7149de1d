//! Caller-facing operations against the judge
//!
//! [`Client`] combines a [`Transport`], the [`Config`] and an [`ApiCache`];
//! every operation is one or two request/response round trips.

mod listing;
mod problem;
mod submit;

pub use listing::{
    PROBLEM_COLUMNS, ProblemListOptions, ProblemSort, SUBMISSION_COLUMNS, SubmissionStatus,
};
pub use problem::Language;
pub use submit::{SubmissionOutcome, classify_response, find_submit_form};

use std::sync::Arc;

use scraper::Html;
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use url::Url;

use crate::{
    Error,
    cache::{self, ApiCache, ApiContest, ApiProblem},
    config::Config,
    entity::{Contest, Problem},
    html,
    transport::{Request, Response, Transport},
};

pub struct Client<T> {
    transport: T,
    config: Config,
    cache: Arc<ApiCache>,
}

impl<T: Transport> Client<T> {
    pub fn new(transport: T, config: Config) -> Self {
        Self::with_cache(transport, config, Arc::default())
    }

    pub fn with_cache(transport: T, config: Config, cache: Arc<ApiCache>) -> Self {
        Self {
            transport,
            config,
            cache,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn endpoint(&self, path: &str) -> Result<Url, Error> {
        self.config.endpoint(path).map_err(Error::Url)
    }

    /// GET `url`; any non-2xx status is a transport error.
    async fn fetch(&self, url: Url) -> Result<Response, Error> {
        debug!(%url, "fetch");
        self.transport
            .request(Request::get(url))
            .await
            .and_then(Response::error_for_status)
            .map_err(Error::Transport)
    }

    async fn fetch_document(&self, url: Url) -> Result<(Url, Html), Error> {
        let response = self.fetch(url).await?;
        let document = html::parse(&response);
        Ok((response.final_url, document))
    }

    async fn fetch_json<D: DeserializeOwned>(&self, url: Url) -> Result<D, Error> {
        let response = self.fetch(url).await?;
        serde_json::from_slice(&response.body).map_err(|error| Error::DecodeApi {
            url: response.final_url,
            error,
        })
    }

    /// Whether the session is logged in: the home page shows a login button
    /// only to anonymous visitors.
    pub async fn is_logged_in(&self) -> Result<bool, Error> {
        let response = self.fetch(self.config.base_url.clone()).await?;
        let logged_in = !String::from_utf8_lossy(&response.body).contains("login-btn");
        debug!(logged_in, "login probe");
        Ok(logged_in)
    }

    pub async fn api_problems(&self) -> Result<&[ApiProblem], Error> {
        self.cache
            .problems(|| async {
                let problems: Vec<ApiProblem> =
                    self.fetch_json(self.endpoint("api/v1/problems")?).await?;
                info!(count = problems.len(), "problem list cached");
                Ok(problems)
            })
            .await
    }

    pub async fn api_contests(&self) -> Result<&[ApiContest], Error> {
        self.cache
            .contests(|| async {
                let mut contests = Vec::new();
                for path in ["api/v1/contest/past", "api/v1/contest/future"] {
                    let chunk: Vec<ApiContest> = self.fetch_json(self.endpoint(path)?).await?;
                    contests.extend(chunk);
                }
                info!(count = contests.len(), "contest list cached");
                Ok(contests)
            })
            .await
    }

    /// Problems of `contest`, resolved through the cached API snapshots.
    pub async fn list_contest_problems(&self, contest: &Contest) -> Result<Vec<Problem>, Error> {
        let contests = self.api_contests().await?;
        let problems = self.api_problems().await?;
        cache::contest_members(contests, problems, contest.contest_id).map_err(Error::Resolution)
    }
}
