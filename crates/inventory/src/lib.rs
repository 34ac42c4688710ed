//! Pantry stock domain.
//!
//! This crate contains the rules of the stock ledger and its lookup
//! registries, implemented as deterministic domain logic (no IO, no clock,
//! no storage). Callers pass `now` and the view state explicitly.

pub mod freshness;
pub mod item;
pub mod ledger;
pub mod recap;
pub mod registry;
pub mod view;

pub use freshness::{Freshness, STALE_AFTER_DAYS, WARNING_AFTER_DAYS, classify};
pub use item::{AddedAt, ItemDraft, ItemPatch, StockItem, StockRow, TIMESTAMP_FORMAT, Unit};
pub use ledger::{Ledger, ListedItem, RowStatus, StockView};
pub use recap::{Recap, RecapLine};
pub use registry::{Registry, RegistryKind};
pub use view::{Filter, SortMode, ViewState};
