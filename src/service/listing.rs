use std::num::NonZeroU32;

use indexmap::{IndexMap, indexmap};
use tracing::debug;

use crate::{
    Error,
    table::{self, ColumnTransform, RawTable, TabularRecord},
    transport::Transport,
};

use super::Client;

/// The blank column is the magnifier icon linking to the user's submissions.
pub const SUBMISSION_COLUMNS: [&str; 9] = [
    "#",
    "提出日時",
    "",
    "提出者",
    "問題",
    "言語",
    "結果",
    "実行時間",
    "コード長",
];

pub const PROBLEM_COLUMNS: [&str; 7] = [
    "ナンバー",
    "問題名",
    "レベル",
    "タグ",
    "作問者",
    "解いた人数",
    "Fav",
];

fn submission_transforms() -> IndexMap<&'static str, ColumnTransform> {
    indexmap! {
        "#" => table::integer as ColumnTransform,
    }
}

fn problem_transforms() -> IndexMap<&'static str, ColumnTransform> {
    indexmap! {
        "ナンバー" => table::integer as ColumnTransform,
        "解いた人数" => table::integer,
        "Fav" => table::integer,
        "レベル" => table::stars,
        // empty unless logged in
        "タグ" => table::words,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStatus {
    AC,
    WA,
    RE,
    TLE,
    MLE,
    OLE,
    JudgeTle,
    CE,
    WJ,
    Judge,
    NoOut,
    IE,
}

impl SubmissionStatus {
    pub const ALL: [SubmissionStatus; 12] = [
        SubmissionStatus::AC,
        SubmissionStatus::WA,
        SubmissionStatus::RE,
        SubmissionStatus::TLE,
        SubmissionStatus::MLE,
        SubmissionStatus::OLE,
        SubmissionStatus::JudgeTle,
        SubmissionStatus::CE,
        SubmissionStatus::WJ,
        SubmissionStatus::Judge,
        SubmissionStatus::NoOut,
        SubmissionStatus::IE,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::AC => "AC",
            SubmissionStatus::WA => "WA",
            SubmissionStatus::RE => "RE",
            SubmissionStatus::TLE => "TLE",
            SubmissionStatus::MLE => "MLE",
            SubmissionStatus::OLE => "OLE",
            SubmissionStatus::JudgeTle => "J_TLE",
            SubmissionStatus::CE => "CE",
            SubmissionStatus::WJ => "WJ",
            SubmissionStatus::Judge => "Judge",
            SubmissionStatus::NoOut => "NoOut",
            SubmissionStatus::IE => "IE",
        }
    }
}

impl std::str::FromStr for SubmissionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown submission status: {s}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProblemSort {
    NoAsc,
    LevelAsc,
    LevelDesc,
    SolvedAsc,
    SolvedDesc,
    FavAsc,
    FavDesc,
}

impl ProblemSort {
    pub const ALL: [ProblemSort; 7] = [
        ProblemSort::NoAsc,
        ProblemSort::LevelAsc,
        ProblemSort::LevelDesc,
        ProblemSort::SolvedAsc,
        ProblemSort::SolvedDesc,
        ProblemSort::FavAsc,
        ProblemSort::FavDesc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProblemSort::NoAsc => "no_asc",
            ProblemSort::LevelAsc => "level_asc",
            ProblemSort::LevelDesc => "level_desc",
            ProblemSort::SolvedAsc => "solved_asc",
            ProblemSort::SolvedDesc => "solved_desc",
            ProblemSort::FavAsc => "fav_asc",
            ProblemSort::FavDesc => "fav_desc",
        }
    }
}

impl std::str::FromStr for ProblemSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|sort| sort.as_str() == s)
            .ok_or_else(|| format!("unknown sort order: {s}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProblemListOptions {
    /// List the "other" problems instead of the main archive.
    pub other: bool,
    /// Hide unfinished problems; they are listed otherwise, even to logged in users.
    pub comp_problem: bool,
    pub sort: Option<ProblemSort>,
}

impl Default for ProblemListOptions {
    fn default() -> Self {
        Self {
            other: false,
            comp_problem: true,
            sort: None,
        }
    }
}

impl<T: Transport> Client<T> {
    async fn scrape(
        &self,
        url: url::Url,
        expected: &[&str],
        transforms: &IndexMap<&str, ColumnTransform>,
    ) -> Result<Vec<TabularRecord>, Error> {
        let (url, document) = self.fetch_document(url).await?;
        let table = RawTable::parse(&document).map_err(Error::page_shape(&url))?;
        table
            .expect_columns(expected)
            .map_err(Error::page_shape(&url))?;
        let records = table
            .transform(transforms)
            .map_err(Error::page_shape(&url))?;
        debug!(%url, rows = records.len(), "scraped table");
        Ok(records)
    }

    /// One page of the public submission list. Only the requested page is
    /// read; walking further pages is up to the caller.
    pub async fn list_submissions(
        &self,
        page: NonZeroU32,
        status: Option<SubmissionStatus>,
    ) -> Result<Vec<TabularRecord>, Error> {
        let mut url = self.endpoint("submissions")?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("page", &page.to_string());
            if let Some(status) = status {
                query.append_pair("status", status.as_str());
            }
        }
        self.scrape(url, &SUBMISSION_COLUMNS, &submission_transforms())
            .await
    }

    /// One page of the problem list.
    pub async fn list_problems(
        &self,
        page: NonZeroU32,
        options: &ProblemListOptions,
    ) -> Result<Vec<TabularRecord>, Error> {
        let mut url = self.endpoint(if options.other {
            "problems/other"
        } else {
            "problems"
        })?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("page", &page.to_string());
            if options.comp_problem {
                query.append_pair("comp_problem", "on");
            }
            if let Some(sort) = options.sort {
                query.append_pair("sort", sort.as_str());
            }
        }
        self.scrape(url, &PROBLEM_COLUMNS, &problem_transforms())
            .await
    }
}
