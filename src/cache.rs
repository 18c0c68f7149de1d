//! Read API snapshots
//!
//! The problem and contest lists change slowly, so each is fetched at most
//! once per [`ApiCache`] and never refreshed. Share one cache (behind an
//! `Arc`) between clients to get process-wide behavior.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

use crate::entity::Problem;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct ApiProblem {
    pub no: u64,
    pub problem_id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub level: Option<f64>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct ApiContest {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub problem_id_list: Vec<u64>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Unresolved {
    #[error("contest {0} is not in the contest list")]
    Contest(u64),
    #[error("problem id {0} is not in the problem list")]
    Problem(u64),
}

#[derive(Default)]
pub struct ApiCache {
    problems: OnceCell<Vec<ApiProblem>>,
    contests: OnceCell<Vec<ApiContest>>,
}

impl ApiCache {
    /// A cache that already holds both snapshots.
    pub fn preloaded(problems: Vec<ApiProblem>, contests: Vec<ApiContest>) -> Self {
        Self {
            problems: OnceCell::from(problems),
            contests: OnceCell::from(contests),
        }
    }

    pub async fn problems<E, F, Fut>(&self, fetch: F) -> Result<&[ApiProblem], E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<ApiProblem>, E>>,
    {
        self.problems.get_or_try_init(fetch).await.map(Vec::as_slice)
    }

    pub async fn contests<E, F, Fut>(&self, fetch: F) -> Result<&[ApiContest], E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<ApiContest>, E>>,
    {
        self.contests.get_or_try_init(fetch).await.map(Vec::as_slice)
    }
}

/// Member problems of `contest_id`, addressed by number, in contest order.
pub fn contest_members(
    contests: &[ApiContest],
    problems: &[ApiProblem],
    contest_id: u64,
) -> Result<Vec<Problem>, Unresolved> {
    let contest = contests
        .iter()
        .find(|contest| contest.id == contest_id)
        .ok_or(Unresolved::Contest(contest_id))?;
    let numbers = problems
        .iter()
        .map(|problem| (problem.problem_id, problem.no))
        .collect::<HashMap<_, _>>();
    contest
        .problem_id_list
        .iter()
        .map(|id| {
            numbers
                .get(id)
                .map(|no| Problem::No(*no))
                .ok_or(Unresolved::Problem(*id))
        })
        .collect()
}
