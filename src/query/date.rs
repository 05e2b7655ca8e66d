//! Date field expressions.
//!
//! Four forms are understood: `<date` (before), `>date` (after),
//! `date - date` (inclusive range) and a plain `date` (that day). Dates use
//! the locale's short numeric layout and are parsed leniently, so day and
//! month overflow roll forward (`6/34/02` is July 4th 2002). Every date
//! becomes a `YYYYMMDD` key.

use crate::config::DateLocale;
use crate::error::{CompileError, Result};
use crate::query::node::QueryNode;
use chrono::{Datelike, Days, Months, NaiveDate};

/// Turns the text of a date field search into a query
pub trait DateParser: Send + Sync {
    fn parse(&self, field: &str, text: &str, locale: DateLocale) -> Result<QueryNode>;
}

/// Window for two-digit years: [start, start + 100)
#[derive(Debug, Clone, Copy)]
pub struct DefaultDateParser {
    century_start: Option<i32>,
}

impl DefaultDateParser {
    pub fn new() -> Self {
        Self {
            century_start: None,
        }
    }

    /// Fix the first year of the two-digit-year window instead of deriving it
    /// from the current date
    pub fn with_century_start(year: i32) -> Self {
        Self {
            century_start: Some(year),
        }
    }

    fn century_start(&self) -> i32 {
        self.century_start
            .unwrap_or_else(|| chrono::Local::now().year() - 80)
    }

    /// Parse one date into its `YYYYMMDD` key
    pub fn date_key(&self, text: &str, locale: DateLocale) -> Result<String> {
        let date = self
            .parse_date(text.trim(), locale)
            .ok_or_else(|| CompileError::DateSyntax(text.trim().to_string()))?;
        Ok(date.format("%Y%m%d").to_string())
    }

    fn parse_date(&self, text: &str, locale: DateLocale) -> Option<NaiveDate> {
        let separator = match locale {
            DateLocale::De => '.',
            _ => '/',
        };
        let parts: Vec<&str> = text.split(separator).map(str::trim).collect();
        if parts.len() != 3 || parts.iter().any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit())) {
            return None;
        }

        let (year, month, day) = match locale {
            DateLocale::EnUs => (parts[2], parts[0], parts[1]),
            DateLocale::EnGb | DateLocale::De => (parts[2], parts[1], parts[0]),
            DateLocale::Ja => (parts[0], parts[1], parts[2]),
        };

        let year = self.resolve_year(year)?;
        let month: i64 = month.parse().ok()?;
        let day: i64 = day.parse().ok()?;
        lenient_date(year, month, day)
    }

    fn resolve_year(&self, text: &str) -> Option<i32> {
        let value: i32 = text.parse().ok()?;
        if text.len() != 2 {
            return Some(value);
        }
        let start = self.century_start();
        let mut year = start - start.rem_euclid(100) + value;
        if year < start {
            year += 100;
        }
        Some(year)
    }
}

impl Default for DefaultDateParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Rolls month and day overflow into the following months/years
fn lenient_date(year: i32, month: i64, day: i64) -> Option<NaiveDate> {
    let base = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let months = month - 1;
    let base = if months >= 0 {
        base.checked_add_months(Months::new(u32::try_from(months).ok()?))?
    } else {
        base.checked_sub_months(Months::new(u32::try_from(-months).ok()?))?
    };
    let days = day - 1;
    if days >= 0 {
        base.checked_add_days(Days::new(u64::try_from(days).ok()?))
    } else {
        base.checked_sub_days(Days::new(u64::try_from(-days).ok()?))
    }
}

impl DateParser for DefaultDateParser {
    fn parse(&self, field: &str, text: &str, locale: DateLocale) -> Result<QueryNode> {
        let text = text.trim();
        if text.is_empty() {
            return Err(CompileError::DateSyntax(text.to_string()));
        }

        if let Some(rest) = text.strip_prefix('<') {
            return Ok(QueryNode::Range {
                field: field.to_string(),
                lo: None,
                hi: Some(self.date_key(rest, locale)?),
                inclusive_lo: false,
                inclusive_hi: false,
            });
        }

        if let Some(rest) = text.strip_prefix('>') {
            return Ok(QueryNode::Range {
                field: field.to_string(),
                lo: Some(self.date_key(rest, locale)?),
                hi: None,
                inclusive_lo: false,
                inclusive_hi: false,
            });
        }

        if let Some((from, to)) = text.rsplit_once('-') {
            return Ok(QueryNode::Range {
                field: field.to_string(),
                lo: Some(self.date_key(from, locale)?),
                hi: Some(self.date_key(to, locale)?),
                inclusive_lo: true,
                inclusive_hi: true,
            });
        }

        Ok(QueryNode::term(field, self.date_key(text, locale)?))
    }
}
