//! Tabular page scraping
//!
//! A listing page holds exactly one data table. Its header row names the
//! columns, and every body row becomes one record keyed by those names.
//! Cells are turned into typed values by per-column transforms.

use std::sync::LazyLock;

use indexmap::IndexMap;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

use crate::html;

static TABLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table").unwrap());
static HEADER_ROW: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("thead > tr").unwrap());
static BODY_ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tbody > tr").unwrap());
static LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());
static STAR: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".fa-star").unwrap());
static HALF_STAR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".fa-star-half-full").unwrap());

/// Structural mismatch between a live page and what this crate expects.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PageShape {
    #[error("expected exactly one table, found {0}")]
    TableCount(usize),
    #[error("table has no header row")]
    MissingHeader,
    #[error("table has no body")]
    MissingBody,
    #[error("row {row} has {got} cells, header has {expected}")]
    RowLength {
        row: usize,
        expected: usize,
        got: usize,
    },
    #[error("unexpected columns: expected {expected:?}, got {got:?}")]
    UnexpectedColumns {
        expected: Vec<String>,
        got: Vec<String>,
    },
    #[error("invalid value in column {column:?}: {value:?}")]
    InvalidCell { column: String, value: String },
    #[error("missing element: {0}")]
    MissingElement(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ColumnValue {
    Text(String),
    Integer(i64),
    List(Vec<String>),
}

impl ColumnValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ColumnValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            ColumnValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            ColumnValue::List(list) => Some(list),
            _ => None,
        }
    }
}

pub type TabularRecord = IndexMap<String, ColumnValue>;

/// Converts one raw cell into a typed value.
pub type ColumnTransform = fn(ElementRef<'_>) -> Result<ColumnValue, String>;

/// Trimmed text; used for every column without an explicit transform.
pub fn text(cell: ElementRef<'_>) -> Result<ColumnValue, String> {
    Ok(ColumnValue::Text(html::trimmed_text(cell)))
}

pub fn integer(cell: ElementRef<'_>) -> Result<ColumnValue, String> {
    let raw = html::trimmed_text(cell);
    raw.parse().map(ColumnValue::Integer).map_err(|_| raw)
}

pub fn words(cell: ElementRef<'_>) -> Result<ColumnValue, String> {
    Ok(ColumnValue::List(
        cell.text()
            .flat_map(str::split_whitespace)
            .map(ToOwned::to_owned)
            .collect(),
    ))
}

/// Difficulty as a star count, with a `.5` suffix for a half star.
pub fn stars(cell: ElementRef<'_>) -> Result<ColumnValue, String> {
    let mut level = cell.select(&STAR).count().to_string();
    if cell.select(&HALF_STAR).next().is_some() {
        level.push_str(".5");
    }
    Ok(ColumnValue::Text(level))
}

/// The single data table of a page with its cells still unparsed.
pub struct RawTable<'a> {
    pub columns: Vec<String>,
    pub rows: Vec<IndexMap<String, ElementRef<'a>>>,
}

impl<'a> RawTable<'a> {
    pub fn parse(document: &'a Html) -> Result<Self, PageShape> {
        let tables = document.select(&TABLE).collect::<Vec<_>>();
        let [table] = tables.as_slice() else {
            return Err(PageShape::TableCount(tables.len()));
        };
        let header = table
            .select(&HEADER_ROW)
            .next()
            .ok_or(PageShape::MissingHeader)?;
        let columns = html::child_elements(header)
            .filter(|cell| cell.value().name() == "th")
            .map(html::trimmed_text)
            .collect::<Vec<_>>();

        if !html::child_elements(*table).any(|child| child.value().name() == "tbody") {
            return Err(PageShape::MissingBody);
        }
        let rows = table
            .select(&BODY_ROW)
            .enumerate()
            .map(|(index, row)| {
                let cells = html::child_elements(row)
                    .filter(|cell| cell.value().name() == "td")
                    .collect::<Vec<_>>();
                if cells.len() != columns.len() {
                    return Err(PageShape::RowLength {
                        row: index,
                        expected: columns.len(),
                        got: cells.len(),
                    });
                }
                Ok(columns.iter().cloned().zip(cells).collect())
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { columns, rows })
    }

    /// Fails unless the header row is exactly `expected`, in order.
    pub fn expect_columns(&self, expected: &[&str]) -> Result<(), PageShape> {
        if self.columns.iter().map(String::as_str).eq(expected.iter().copied()) {
            Ok(())
        } else {
            Err(PageShape::UnexpectedColumns {
                expected: expected.iter().map(|c| c.to_string()).collect(),
                got: self.columns.clone(),
            })
        }
    }

    /// Apply `transforms` to every cell.
    ///
    /// A linked cell also yields `<column>/url` with the link target. Columns
    /// with an empty header are decorative and dropped.
    pub fn transform(
        &self,
        transforms: &IndexMap<&str, ColumnTransform>,
    ) -> Result<Vec<TabularRecord>, PageShape> {
        self.rows
            .iter()
            .map(|row| {
                let mut record = TabularRecord::new();
                let mut links = Vec::new();
                for (column, cell) in row {
                    if column.is_empty() {
                        continue;
                    }
                    if let Some(href) = cell.select(&LINK).next().and_then(|a| a.attr("href")) {
                        links.push((format!("{column}/url"), ColumnValue::Text(href.to_owned())));
                    }
                    let transform = transforms.get(column.as_str()).copied().unwrap_or(text);
                    let value = transform(*cell).map_err(|value| PageShape::InvalidCell {
                        column: column.clone(),
                        value,
                    })?;
                    record.insert(column.clone(), value);
                }
                record.extend(links);
                Ok(record)
            })
            .collect()
    }
}
