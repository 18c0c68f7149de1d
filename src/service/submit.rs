//! Code submission
//!
//! ```text
//! FormFetch --(no #submit_form)--> NotLoggedIn
//!     |
//! FormFound --post--> Posted --(submission detail URL)--> Accepted
//!                        \--(anything else)-------------> Rejected(alerts)
//! ```

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use serde::Serialize;
use tracing::{error, info, warn};
use url::Url;

use crate::{
    Error,
    config::Config,
    entity::Problem,
    html::{self, FormSender},
    transport::{Response, Transport},
};

use super::Client;

static SUBMIT_FORM: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("form#submit_form").unwrap());
static ALERT: LazyLock<Selector> = LazyLock::new(|| Selector::parse(r#"[role="alert"]"#).unwrap());
// https://yukicoder.me/submissions/314087
static SUBMISSION_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/submissions/\d+/?$").unwrap());

/// How the judge answered a submission.
///
/// `Accepted` means the submission was queued for judging, not that it
/// passed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionOutcome {
    Accepted(Url),
    NotLoggedIn,
    Rejected(Vec<String>),
}

/// The submission form, which is only rendered to logged in users.
pub fn find_submit_form(document: &Html, page_url: &Url) -> Option<FormSender> {
    document
        .select(&SUBMIT_FORM)
        .next()
        .map(|form| FormSender::new(form, page_url))
}

/// Classify the response to the form post.
pub fn classify_response(response: &Response, config: &Config) -> SubmissionOutcome {
    let url = &response.final_url;
    if url.host_str() == config.host() && SUBMISSION_PATH.is_match(url.path()) {
        return SubmissionOutcome::Accepted(url.clone());
    }
    let document = html::parse(response);
    SubmissionOutcome::Rejected(
        document
            .select(&ALERT)
            .map(html::collapsed_text)
            .collect(),
    )
}

impl<T: Transport> Client<T> {
    /// Submit `code` to `problem`. Every call is a new submission.
    pub async fn submit_code(
        &self,
        problem: &Problem,
        code: &[u8],
        language_id: &str,
        filename: Option<&str>,
    ) -> Result<SubmissionOutcome, Error> {
        let url = problem.subpage(&self.config, "submit").map_err(Error::Url)?;
        let form = {
            let (url, document) = self.fetch_document(url).await?;
            find_submit_form(&document, &url)
        };
        let Some(mut form) = form else {
            error!(%problem, "submit form not found");
            return Ok(SubmissionOutcome::NotLoggedIn);
        };

        form.set("lang", language_id);
        form.set_file(
            "file",
            filename.unwrap_or(&self.config.default_filename),
            code,
        );
        // a leftover custom test flag turns the post into a test run
        form.unset("custom_test");

        let response = self
            .transport
            .request(form.into_multipart())
            .await
            .and_then(Response::error_for_status)
            .map_err(Error::Transport)?;

        let outcome = classify_response(&response, &self.config);
        match &outcome {
            SubmissionOutcome::Accepted(url) => info!(%url, "submitted"),
            SubmissionOutcome::Rejected(messages) => {
                error!(%problem, final_url = %response.final_url, "submission rejected");
                for message in messages {
                    warn!(alert = %message, "judge says");
                }
            }
            SubmissionOutcome::NotLoggedIn => {}
        }
        Ok(outcome)
    }
}
