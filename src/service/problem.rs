use std::sync::LazyLock;

use scraper::Selector;
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    Error, archive,
    entity::Problem,
    html,
    sample::{self, NamedSample},
    table::PageShape,
    transport::Transport,
};

use super::Client;

static LANGUAGE_OPTION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("select#lang option").unwrap());
static H4: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h4").unwrap());
static PRE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("pre").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Language {
    pub id: String,
    pub name: String,
}

impl<T: Transport> Client<T> {
    pub async fn download_sample_cases(&self, problem: &Problem) -> Result<Vec<NamedSample>, Error> {
        let url = problem.url(&self.config).map_err(Error::Url)?;
        let (url, document) = self.fetch_document(url).await?;
        let samples = sample::extract_samples(&document);
        debug!(%url, count = samples.len(), "sample cases");
        Ok(samples)
    }

    /// Full judge data. Requires a logged in session, which is checked before
    /// the archive is requested.
    pub async fn download_system_cases(&self, problem: &Problem) -> Result<Vec<NamedSample>, Error> {
        if !self.is_logged_in().await? {
            return Err(Error::NotAuthenticated);
        }
        let url = problem
            .subpage(&self.config, "testcase.zip")
            .map_err(Error::Url)?;
        let response = self.fetch(url).await?;
        let cases = archive::extract_from_zip(&response.body, archive::YUKICODER_PATTERN)
            .map_err(|error| Error::Archive {
                url: response.final_url.clone(),
                error,
            })?;
        info!(%problem, count = cases.len(), "system cases");
        Ok(cases)
    }

    /// Languages offered by the submission form. Read from the problem page,
    /// which is public.
    pub async fn list_available_languages(&self, problem: &Problem) -> Result<Vec<Language>, Error> {
        let url = problem.url(&self.config).map_err(Error::Url)?;
        let (url, document) = self.fetch_document(url).await?;
        let languages = document
            .select(&LANGUAGE_OPTION)
            .filter_map(|option| {
                Some(Language {
                    id: option.value().attr("value")?.to_owned(),
                    name: html::collapsed_text(option),
                })
            })
            .collect::<Vec<_>>();
        if languages.is_empty() {
            return Err(Error::PageShape {
                url,
                detail: PageShape::MissingElement("select#lang"),
            });
        }
        Ok(languages)
    }

    /// Raw HTML of the input format block, if the page has one.
    pub async fn input_format(&self, problem: &Problem) -> Result<Option<String>, Error> {
        let url = problem.url(&self.config).map_err(Error::Url)?;
        let (_, document) = self.fetch_document(url).await?;
        Ok(document
            .select(&H4)
            .filter(|h4| html::trimmed_text(*h4) == "入力")
            .find_map(|h4| html::parent_element(h4)?.select(&PRE).next())
            .map(|pre| pre.inner_html()))
    }
}
