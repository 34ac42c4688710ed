//! Presentation state consumed by `Ledger::query`.
//!
//! The ledger never keeps this itself: whoever renders the list owns a
//! `ViewState` and passes it in.

use core::cmp::Ordering;

use serde::{Deserialize, Serialize};

use pantry_core::{DomainError, ItemId};

use crate::item::StockItem;

/// Exact-match filter on a registry field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    #[default]
    All,
    Only(String),
}

impl Filter {
    pub fn only(value: impl Into<String>) -> Self {
        Self::Only(value.into())
    }

    pub fn admits(&self, value: &str) -> bool {
        match self {
            Filter::All => true,
            Filter::Only(expected) => expected == value,
        }
    }
}

impl From<Option<String>> for Filter {
    fn from(value: Option<String>) -> Self {
        value.map_or(Filter::All, Filter::Only)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    #[default]
    Alpha,
    Newest,
    Oldest,
}

impl SortMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::Alpha => "alpha",
            SortMode::Newest => "newest",
            SortMode::Oldest => "oldest",
        }
    }

    /// Next mode in the alpha → newest → oldest cycle.
    pub fn next(self) -> Self {
        match self {
            SortMode::Alpha => SortMode::Newest,
            SortMode::Newest => SortMode::Oldest,
            SortMode::Oldest => SortMode::Alpha,
        }
    }

    /// Ordering of two rows under this mode. Undated rows sort last in both
    /// date orders; ties fall back to the name.
    pub fn compare(&self, a: &StockItem, b: &StockItem) -> Ordering {
        let by_date = match self {
            SortMode::Alpha => Ordering::Equal,
            SortMode::Newest | SortMode::Oldest => {
                match (a.added_at().instant(), b.added_at().instant()) {
                    (Some(x), Some(y)) if *self == SortMode::Newest => y.cmp(&x),
                    (Some(x), Some(y)) => x.cmp(&y),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                }
            }
        };
        by_date.then_with(|| compare_names(a.name(), b.name()))
    }
}

impl core::fmt::Display for SortMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for SortMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "alpha" => Ok(SortMode::Alpha),
            "newest" => Ok(SortMode::Newest),
            "oldest" => Ok(SortMode::Oldest),
            other => Err(DomainError::validation(format!("unknown sort mode: {other:?}"))),
        }
    }
}

/// Case-insensitive name order, made total by the raw comparison.
pub(crate) fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Search text, filters, sort mode and the "just added" marker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    pub search: String,
    pub category: Filter,
    pub location: Filter,
    pub sort: SortMode,
    last_added: Option<ItemId>,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_added(&self) -> Option<ItemId> {
        self.last_added
    }

    pub fn mark_added(&mut self, id: ItemId) {
        self.last_added = Some(id);
    }

    /// Drop the marker if it points at `id`.
    pub fn forget(&mut self, id: ItemId) {
        if self.last_added == Some(id) {
            self.last_added = None;
        }
    }

    pub fn cycle_sort(&mut self) -> SortMode {
        self.sort = self.sort.next();
        self.sort
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Whether `item` passes the search text and both filters.
    pub fn admits(&self, item: &StockItem) -> bool {
        let needle = &self.search;
        if !needle.is_empty() && !item.name().to_lowercase().contains(&needle.to_lowercase()) {
            return false;
        }
        self.category.admits(item.category()) && self.location.admits(item.location())
    }
}
