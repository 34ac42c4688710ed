//! Per-location recap: what to eat first.

use chrono::NaiveDateTime;

use crate::freshness::{Freshness, classify};
use crate::item::StockItem;
use crate::view::compare_names;

/// Shown instead of a date for rows without a readable timestamp.
pub const NO_DATE: &str = "no date";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecapLine<'a> {
    pub item: &'a StockItem,
    pub freshness: Freshness,
    dated: Option<NaiveDateTime>,
}

impl RecapLine<'_> {
    /// `dd/mm/YYYY`, or "no date".
    pub fn date_label(&self) -> String {
        self.dated
            .map(|d| d.format("%d/%m/%Y").to_string())
            .unwrap_or_else(|| NO_DATE.to_string())
    }
}

impl core::fmt::Display for RecapLine<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{} - {} {} ({})",
            self.item.name(),
            self.item.quantity(),
            self.item.unit(),
            self.date_label()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recap<'a> {
    location: String,
    lines: Vec<RecapLine<'a>>,
    stale: usize,
    warning: usize,
}

impl<'a> Recap<'a> {
    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn lines(&self) -> &[RecapLine<'a>] {
        &self.lines
    }

    pub fn stale(&self) -> usize {
        self.stale
    }

    pub fn warning(&self) -> usize {
        self.warning
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Summary of what should be eaten soon, or `None` when nothing is due.
    pub fn alert(&self) -> Option<String> {
        let mut parts = Vec::new();
        if self.stale > 0 {
            parts.push(format!("{} older than 6 months", self.stale));
        }
        if self.warning > 0 {
            parts.push(format!("{} older than 3 months", self.warning));
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" / "))
        }
    }
}

/// Items stored at `location`, oldest first, undated rows last.
pub fn recap<'a>(
    items: impl Iterator<Item = &'a StockItem>,
    location: &str,
    now: NaiveDateTime,
) -> Recap<'a> {
    let mut lines: Vec<RecapLine<'a>> = items
        .filter(|item| item.location() == location)
        .map(|item| {
            let dated = item.added_at().instant();
            RecapLine {
                item,
                freshness: classify(dated, now),
                dated,
            }
        })
        .collect();
    lines.sort_by(|a, b| match (a.dated, b.dated) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| compare_names(a.item.name(), b.item.name())),
        (Some(_), None) => core::cmp::Ordering::Less,
        (None, Some(_)) => core::cmp::Ordering::Greater,
        (None, None) => compare_names(a.item.name(), b.item.name()),
    });

    let stale = lines
        .iter()
        .filter(|l| l.freshness == Freshness::Stale)
        .count();
    let warning = lines
        .iter()
        .filter(|l| l.freshness == Freshness::Warning)
        .count();

    Recap {
        location: location.to_string(),
        lines,
        stale,
        warning,
    }
}
