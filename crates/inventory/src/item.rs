use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use pantry_core::{DomainError, Entity, ItemId};

use crate::registry::RegistryKind;

/// Format used to stamp newly added items.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const DATETIME_FORMATS: &[&str] = &[
    TIMESTAMP_FORMAT,
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];

/// Unit a quantity is counted in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    #[default]
    #[serde(rename = "Portions")]
    Portions,
    #[serde(rename = "kg")]
    Kilograms,
    #[serde(rename = "Pièces")]
    Pieces,
}

impl Unit {
    pub const ALL: [Unit; 3] = [Unit::Portions, Unit::Kilograms, Unit::Pieces];

    /// Label as written in the stock table.
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Portions => "Portions",
            Unit::Kilograms => "kg",
            Unit::Pieces => "Pièces",
        }
    }
}

impl core::fmt::Display for Unit {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for Unit {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "portions" | "portion" => Ok(Unit::Portions),
            "kg" => Ok(Unit::Kilograms),
            "pièces" | "pièce" | "pieces" | "piece" => Ok(Unit::Pieces),
            other => Err(DomainError::validation(format!("unknown unit: {other:?}"))),
        }
    }
}

/// Creation timestamp of a stock item, kept as written.
///
/// Legacy rows may carry an empty or free-form date. The raw text is kept so
/// that saving the ledger never rewrites a value it could not interpret.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddedAt(String);

impl AddedAt {
    pub fn stamp(now: NaiveDateTime) -> Self {
        Self(now.format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The parsed instant, or `None` when the text is missing or unreadable.
    pub fn instant(&self) -> Option<NaiveDateTime> {
        parse_timestamp(&self.0)
    }
}

/// Parse a stock-table date, accepting ISO and day-first layouts.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// A stock row as persisted (no identity).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRow {
    pub name: String,
    pub category: String,
    pub quantity: u32,
    pub unit: Unit,
    pub location: String,
    pub added_at: AddedAt,
    pub container: String,
}

/// Input of `Ledger::add`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDraft {
    pub name: String,
    pub category: String,
    pub location: String,
    pub container: String,
    pub quantity: u32,
    pub unit: Unit,
}

/// Partial update applied by `Ledger::edit`. Quantity and timestamp are not
/// editable through a patch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub container: Option<String>,
    pub unit: Option<Unit>,
}

impl ItemPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.category.is_none()
            && self.location.is_none()
            && self.container.is_none()
            && self.unit.is_none()
    }
}

/// One inventory record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockItem {
    id: ItemId,
    name: String,
    category: String,
    quantity: u32,
    unit: Unit,
    location: String,
    container: String,
    added_at: AddedAt,
}

impl StockItem {
    pub(crate) fn from_row(id: ItemId, row: StockRow) -> Self {
        Self {
            id,
            name: row.name,
            category: row.category,
            quantity: row.quantity,
            unit: row.unit,
            location: row.location,
            container: row.container,
            added_at: row.added_at,
        }
    }

    pub(crate) fn from_draft(id: ItemId, draft: ItemDraft, now: NaiveDateTime) -> Self {
        Self {
            id,
            name: draft.name,
            category: draft.category,
            quantity: draft.quantity,
            unit: draft.unit,
            location: draft.location,
            container: draft.container,
            added_at: AddedAt::stamp(now),
        }
    }

    pub fn to_row(&self) -> StockRow {
        StockRow {
            name: self.name.clone(),
            category: self.category.clone(),
            quantity: self.quantity,
            unit: self.unit,
            location: self.location.clone(),
            added_at: self.added_at.clone(),
            container: self.container.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn added_at(&self) -> &AddedAt {
        &self.added_at
    }

    /// The registry value this item references for `kind`.
    pub fn reference(&self, kind: RegistryKind) -> &str {
        match kind {
            RegistryKind::Location => &self.location,
            RegistryKind::Category => &self.category,
            RegistryKind::Container => &self.container,
        }
    }

    pub(crate) fn reference_mut(&mut self, kind: RegistryKind) -> &mut String {
        match kind {
            RegistryKind::Location => &mut self.location,
            RegistryKind::Category => &mut self.category,
            RegistryKind::Container => &mut self.container,
        }
    }

    pub(crate) fn increment(&mut self) {
        self.quantity = self.quantity.saturating_add(1);
    }

    /// Decrease by one while above one. Returns whether anything changed.
    pub(crate) fn decrement(&mut self) -> bool {
        if self.quantity > 1 {
            self.quantity -= 1;
            true
        } else {
            false
        }
    }

    pub(crate) fn apply(&mut self, patch: ItemPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(location) = patch.location {
            self.location = location;
        }
        if let Some(container) = patch.container {
            self.container = container;
        }
        if let Some(unit) = patch.unit {
            self.unit = unit;
        }
    }
}

impl Entity for StockItem {
    type Id = ItemId;

    fn id(&self) -> ItemId {
        self.id
    }
}
