//! Persistence access, one module per entity.
//!
//! Every function takes a `&Connection` (a `Transaction` derefs to one),
//! returns `anyhow::Result<T>` with typed structs, and never applies business
//! rules. Search functions compose a `WHERE` clause from optional filters,
//! count the matches, then fetch one sorted page.

pub mod activity;
pub mod label;
pub mod project;
pub mod reference;
pub mod team;
pub mod todo;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::types::{ToSql, Type};
use rusqlite::{Connection, params_from_iter};
use std::str::FromStr;

use crate::model::ParseEnumError;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Accumulates `AND`-joined predicates and their positional parameters.
#[derive(Default)]
pub(crate) struct Conditions {
    clauses: Vec<String>,
    params: Vec<Box<dyn ToSql>>,
}

impl Conditions {
    /// Register a parameter and return its `?N` placeholder.
    pub(crate) fn bind(&mut self, value: impl ToSql + 'static) -> String {
        self.params.push(Box::new(value));
        format!("?{}", self.params.len())
    }

    pub(crate) fn push(&mut self, clause: impl Into<String>) {
        self.clauses.push(clause.into());
    }

    /// Case-insensitive substring match on `column`.
    pub(crate) fn like(&mut self, column: &str, needle: &str) {
        let placeholder = self.bind(like_pattern(needle));
        self.push(format!("{column} LIKE {placeholder} ESCAPE '\\'"));
    }

    /// `id_column` must have a row in `table` for every value in `values`
    /// (array-contains-all). `values` must be deduplicated.
    pub(crate) fn contains_all<T>(
        &mut self,
        id_column: &str,
        table: &str,
        fk_column: &str,
        value_column: &str,
        values: &[T],
    ) where
        T: ToSql + Clone + 'static,
    {
        if values.is_empty() {
            return;
        }
        let placeholders: Vec<String> = values.iter().map(|v| self.bind(v.clone())).collect();
        self.push(format!(
            "{id_column} IN (SELECT {fk_column} FROM {table} \
             WHERE {value_column} IN ({}) \
             GROUP BY {fk_column} HAVING COUNT(DISTINCT {value_column}) = {})",
            placeholders.join(", "),
            values.len()
        ));
    }

    pub(crate) fn where_clause(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }

    pub(crate) fn params(&self) -> Vec<&dyn ToSql> {
        self.params.iter().map(AsRef::as_ref).collect()
    }

    /// Run `SELECT COUNT(*) FROM {from}` with the accumulated predicates.
    pub(crate) fn count(&self, conn: &Connection, from: &str) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {from}{}", self.where_clause());
        let total: i64 = conn
            .query_row(&sql, params_from_iter(self.params()), |row| row.get(0))
            .with_context(|| format!("execute count query: {sql}"))?;
        Ok(u64::try_from(total).unwrap_or_default())
    }
}

/// Wrap `needle` as `%needle%`, escaping LIKE wildcards.
pub(crate) fn like_pattern(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len() + 2);
    out.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub(crate) fn parse_date(idx: usize, raw: Option<String>) -> rusqlite::Result<Option<NaiveDate>> {
    raw.map(|s| {
        NaiveDate::parse_from_str(&s, DATE_FORMAT)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

pub(crate) fn parse_enum<T>(idx: usize, raw: &str) -> rusqlite::Result<T>
where
    T: FromStr<Err = ParseEnumError>,
{
    raw.parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
