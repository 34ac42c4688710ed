//! The stock ledger: every inventory record plus its derived views.

use chrono::NaiveDateTime;

use pantry_core::{DomainError, DomainResult, Entity, ItemId};

use crate::freshness::{Freshness, classify};
use crate::item::{ItemDraft, ItemPatch, StockItem, StockRow};
use crate::recap::{Recap, recap};
use crate::registry::RegistryKind;
use crate::view::ViewState;

/// In-memory collection of stock items, newest rows first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ledger {
    items: Vec<StockItem>,
    next_id: ItemId,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            next_id: ItemId::new(1),
        }
    }

    /// Build a ledger from persisted rows.
    ///
    /// Rows are numbered from the bottom of the file up. New items are
    /// written at the top, so an item keeps its number across reloads no
    /// matter how many items were added after it.
    pub fn from_rows(rows: impl IntoIterator<Item = StockRow>) -> Self {
        let rows: Vec<StockRow> = rows.into_iter().collect();
        let count = rows.len() as u64;
        let items = rows
            .into_iter()
            .enumerate()
            .map(|(pos, row)| StockItem::from_row(ItemId::new(count - pos as u64), row))
            .collect();
        Self {
            items,
            next_id: ItemId::new(count + 1),
        }
    }

    /// Items whose name is exactly `name`.
    pub fn named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a StockItem> + 'a {
        self.items.iter().filter(move |item| item.name() == name)
    }

    pub fn to_rows(&self) -> Vec<StockRow> {
        self.items.iter().map(StockItem::to_row).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in storage order.
    pub fn iter(&self) -> impl Iterator<Item = &StockItem> {
        self.items.iter()
    }

    pub fn get(&self, id: ItemId) -> Option<&StockItem> {
        self.items.iter().find(|item| item.id() == id)
    }

    fn allocate_id(&mut self) -> ItemId {
        let id = self.next_id;
        self.next_id = id.next();
        id
    }

    fn position(&self, id: ItemId) -> DomainResult<usize> {
        self.items
            .iter()
            .position(|item| item.id() == id)
            .ok_or_else(|| DomainError::not_found(format!("item {id}")))
    }

    fn item_mut(&mut self, id: ItemId) -> DomainResult<&mut StockItem> {
        let pos = self.position(id)?;
        Ok(&mut self.items[pos])
    }

    /// Record a new item stamped with `now` and return its identifier.
    pub fn add(&mut self, draft: ItemDraft, now: NaiveDateTime) -> DomainResult<ItemId> {
        if draft.quantity < 1 {
            return Err(DomainError::validation("quantity must be at least 1"));
        }
        let id = self.allocate_id();
        self.items.insert(0, StockItem::from_draft(id, draft, now));
        Ok(id)
    }

    /// Returns the new quantity.
    pub fn increment(&mut self, id: ItemId) -> DomainResult<u32> {
        let item = self.item_mut(id)?;
        item.increment();
        Ok(item.quantity())
    }

    /// Decrease the quantity unless it is already at one. Returns whether the
    /// quantity changed.
    pub fn decrement(&mut self, id: ItemId) -> DomainResult<bool> {
        Ok(self.item_mut(id)?.decrement())
    }

    pub fn remove(&mut self, id: ItemId) -> DomainResult<StockItem> {
        let pos = self.position(id)?;
        Ok(self.items.remove(pos))
    }

    pub fn edit(&mut self, id: ItemId, patch: ItemPatch) -> DomainResult<&StockItem> {
        let item = self.item_mut(id)?;
        item.apply(patch);
        Ok(item)
    }

    /// Rewrite every `kind` field equal to `old`. Returns how many items
    /// were touched.
    pub fn rename_reference(&mut self, kind: RegistryKind, old: &str, new: &str) -> usize {
        let mut touched = 0;
        for item in &mut self.items {
            let field = item.reference_mut(kind);
            if field.as_str() == old {
                *field = new.to_string();
                touched += 1;
            }
        }
        touched
    }

    /// Filtered, sorted and annotated view of the ledger.
    ///
    /// The marked "last added" item always comes first; the rest follow the
    /// view's sort mode.
    pub fn query(&self, view: &ViewState, now: NaiveDateTime) -> StockView<'_> {
        let pinned = view.last_added();
        let mut rows: Vec<ListedItem<'_>> = self
            .items
            .iter()
            .filter(|item| view.admits(item))
            .map(|item| ListedItem {
                item,
                status: if Some(item.id()) == pinned {
                    RowStatus::New
                } else {
                    RowStatus::Aged(classify(item.added_at().instant(), now))
                },
            })
            .collect();
        rows.sort_by(|a, b| {
            b.is_new()
                .cmp(&a.is_new())
                .then_with(|| view.sort.compare(a.item, b.item))
        });
        StockView { rows }
    }

    /// Per-location summary, oldest first.
    pub fn recap(&self, location: &str, now: NaiveDateTime) -> Recap<'_> {
        recap(self.iter(), location, now)
    }
}

/// Display status of a listed row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStatus {
    /// The item added last in this session.
    New,
    Aged(Freshness),
}

impl RowStatus {
    pub fn label(&self) -> &'static str {
        match self {
            RowStatus::New => "new",
            RowStatus::Aged(freshness) => freshness.label(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListedItem<'a> {
    pub item: &'a StockItem,
    pub status: RowStatus,
}

impl ListedItem<'_> {
    pub fn is_new(&self) -> bool {
        self.status == RowStatus::New
    }
}

/// Result of `Ledger::query`. Iterating does not consume it, so the same
/// view can be walked any number of times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockView<'a> {
    rows: Vec<ListedItem<'a>>,
}

impl<'a> StockView<'a> {
    pub fn iter(&self) -> impl Iterator<Item = &ListedItem<'a>> + '_ {
        self.rows.iter()
    }

    pub fn items(&self) -> impl Iterator<Item = &'a StockItem> + '_ {
        self.rows.iter().map(|row| row.item)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<'v, 'a> IntoIterator for &'v StockView<'a> {
    type Item = &'v ListedItem<'a>;
    type IntoIter = core::slice::Iter<'v, ListedItem<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{AddedAt, Unit};
    use crate::view::{Filter, SortMode};
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn draft(name: &str, location: &str) -> ItemDraft {
        ItemDraft {
            name: name.to_string(),
            category: "Plat cuisiné".to_string(),
            location: location.to_string(),
            container: "Tupperware".to_string(),
            quantity: 2,
            unit: Unit::Portions,
        }
    }

    fn row(name: &str, category: &str, location: &str, added_at: &str) -> StockRow {
        StockRow {
            name: name.to_string(),
            category: category.to_string(),
            quantity: 1,
            unit: Unit::Portions,
            location: location.to_string(),
            added_at: AddedAt::from_raw(added_at),
            container: "Pyrex".to_string(),
        }
    }

    fn names(view: &StockView<'_>) -> Vec<String> {
        view.items().map(|item| item.name().to_string()).collect()
    }

    fn sample() -> Ledger {
        Ledger::from_rows(vec![
            row("pizza", "Surgelé", "Cuisine", "2024-05-20 12:00:00"),
            row("Boeuf", "Plat cuisiné", "Buanderie", "2023-10-01 12:00:00"),
            row("Ancien", "Autre", "Cuisine", "n/a"),
            row("Curry", "Plat cuisiné", "Cuisine", "01/01/2024"),
        ])
    }

    #[test]
    fn add_records_all_fields_and_timestamp() {
        let mut ledger = Ledger::new();
        let draft = ItemDraft {
            name: "Soup".to_string(),
            category: "Plat cuisiné".to_string(),
            location: "Cuisine".to_string(),
            container: "Tupperware".to_string(),
            quantity: 3,
            unit: Unit::Portions,
        };
        let id = ledger.add(draft, now()).unwrap();

        assert_eq!(ledger.len(), 1);
        let item = ledger.get(id).unwrap();
        assert_eq!(item.name(), "Soup");
        assert_eq!(item.category(), "Plat cuisiné");
        assert_eq!(item.location(), "Cuisine");
        assert_eq!(item.container(), "Tupperware");
        assert_eq!(item.quantity(), 3);
        assert_eq!(item.unit(), Unit::Portions);
        assert_eq!(item.added_at().instant(), Some(now()));
    }

    #[test]
    fn add_rejects_zero_quantity() {
        let mut ledger = Ledger::new();
        let mut d = draft("Soup", "Cuisine");
        d.quantity = 0;
        assert!(matches!(ledger.add(d, now()), Err(DomainError::Validation(_))));
        assert!(ledger.is_empty());
    }

    #[test]
    fn new_items_go_to_the_front_with_fresh_ids() {
        let mut ledger = sample();
        let id = ledger.add(draft("Soup", "Cuisine"), now()).unwrap();
        assert_eq!(ledger.iter().next().unwrap().id(), id);
        assert!(ledger.iter().skip(1).all(|item| item.id() < id));
    }

    #[test]
    fn loaded_rows_are_numbered_from_the_bottom() {
        let ledger = sample();
        let ids: Vec<u64> = ledger.iter().map(|item| item.id().get()).collect();
        assert_eq!(ids, vec![4, 3, 2, 1]);
    }

    #[test]
    fn added_item_keeps_its_number_after_reload() {
        let mut ledger = sample();
        let id = ledger.add(draft("Soup", "Cuisine"), now()).unwrap();
        let before: Vec<(ItemId, String)> = ledger
            .iter()
            .map(|item| (item.id(), item.name().to_string()))
            .collect();

        let reloaded = Ledger::from_rows(ledger.to_rows());
        let after: Vec<(ItemId, String)> = reloaded
            .iter()
            .map(|item| (item.id(), item.name().to_string()))
            .collect();
        assert_eq!(after, before);
        assert_eq!(reloaded.get(id).unwrap().name(), "Soup");
    }

    #[test]
    fn search_text_is_matched_as_typed() {
        let ledger = sample();
        let mut view = ViewState::new();
        view.search = "PIZ".to_string();
        assert_eq!(names(&ledger.query(&view, now())), vec!["pizza"]);
        view.search = " pizza".to_string();
        assert!(ledger.query(&view, now()).is_empty());
    }

    #[test]
    fn named_matches_exactly() {
        let mut ledger = sample();
        ledger.add(draft("Curry", "Buanderie"), now()).unwrap();
        assert_eq!(ledger.named("Curry").count(), 2);
        assert_eq!(ledger.named("curry").count(), 0);
    }

    #[test]
    fn ids_stay_valid_after_removals() {
        let mut ledger = sample();
        let ids: Vec<ItemId> = ledger.iter().map(StockItem::id).collect();
        ledger.remove(ids[1]).unwrap();
        assert_eq!(ledger.get(ids[3]).unwrap().name(), "Curry");
        assert_eq!(ledger.increment(ids[3]).unwrap(), 2);
        assert!(matches!(ledger.remove(ids[1]), Err(DomainError::NotFound(_))));
    }

    #[test]
    fn decrement_is_a_no_op_at_one() {
        let mut ledger = sample();
        let id = ledger.iter().next().unwrap().id();
        assert!(!ledger.decrement(id).unwrap());
        assert_eq!(ledger.get(id).unwrap().quantity(), 1);
        ledger.increment(id).unwrap();
        assert!(ledger.decrement(id).unwrap());
        assert_eq!(ledger.get(id).unwrap().quantity(), 1);
    }

    #[test]
    fn zero_quantity_rows_are_kept_as_loaded() {
        let mut zero = row("Glace", "Surgelé", "Cuisine", "");
        zero.quantity = 0;
        let mut ledger = Ledger::from_rows(vec![zero]);
        let id = ledger.iter().next().unwrap().id();
        assert!(!ledger.decrement(id).unwrap());
        assert_eq!(ledger.get(id).unwrap().quantity(), 0);
    }

    #[test]
    fn edit_overwrites_only_given_fields() {
        let mut ledger = sample();
        let id = ledger.iter().nth(1).unwrap().id();
        let before = ledger.get(id).unwrap().clone();
        let patch = ItemPatch {
            name: Some("Boeuf bourguignon".to_string()),
            unit: Some(Unit::Kilograms),
            ..ItemPatch::default()
        };
        let item = ledger.edit(id, patch).unwrap();
        assert_eq!(item.name(), "Boeuf bourguignon");
        assert_eq!(item.unit(), Unit::Kilograms);
        assert_eq!(item.category(), before.category());
        assert_eq!(item.location(), before.location());
        assert_eq!(item.container(), before.container());
        assert_eq!(item.quantity(), before.quantity());
        assert_eq!(item.added_at(), before.added_at());
    }

    #[test]
    fn rename_reference_touches_only_matching_field() {
        let mut ledger = sample();
        let touched = ledger.rename_reference(RegistryKind::Location, "Cuisine", "Kitchen");
        assert_eq!(touched, 3);
        assert!(ledger.iter().all(|item| item.location() != "Cuisine"));
        assert_eq!(
            ledger
                .iter()
                .filter(|item| item.location() == "Kitchen")
                .count(),
            3
        );
        assert_eq!(ledger.rename_reference(RegistryKind::Category, "Cuisine", "x"), 0);
    }

    #[test]
    fn alpha_query_is_case_insensitive() {
        let ledger = sample();
        let view = ViewState::new();
        let result = ledger.query(&view, now());
        assert_eq!(names(&result), vec!["Ancien", "Boeuf", "Curry", "pizza"]);
    }

    #[test]
    fn last_added_item_is_pinned_first_in_every_mode() {
        let mut ledger = sample();
        let id = ledger.add(draft("Zucchini", "Cuisine"), now()).unwrap();
        let mut view = ViewState::new();
        view.mark_added(id);

        for mode in [SortMode::Alpha, SortMode::Newest, SortMode::Oldest] {
            view.sort = mode;
            let result = ledger.query(&view, now());
            let first = result.iter().next().unwrap();
            assert_eq!(first.item.id(), id);
            assert_eq!(first.status, RowStatus::New);
            assert_eq!(result.iter().filter(|r| r.is_new()).count(), 1);
        }
    }

    #[test]
    fn date_orders_put_undated_rows_last() {
        let ledger = sample();
        let mut view = ViewState::new();

        view.sort = SortMode::Newest;
        assert_eq!(
            names(&ledger.query(&view, now())),
            vec!["pizza", "Curry", "Boeuf", "Ancien"]
        );

        view.sort = SortMode::Oldest;
        assert_eq!(
            names(&ledger.query(&view, now())),
            vec!["Boeuf", "Curry", "pizza", "Ancien"]
        );
    }

    #[test]
    fn equal_dates_fall_back_to_name() {
        let ledger = Ledger::from_rows(vec![
            row("b", "", "", "2024-01-01"),
            row("A", "", "", "2024-01-01"),
            row("c", "", "", ""),
            row("B2", "", "", ""),
        ]);
        let mut view = ViewState::new();
        view.sort = SortMode::Newest;
        assert_eq!(names(&ledger.query(&view, now())), vec!["A", "b", "B2", "c"]);
    }

    #[test]
    fn search_and_filters_combine() {
        let ledger = sample();
        let mut view = ViewState::new();
        view.search = "UR".to_string();
        assert_eq!(names(&ledger.query(&view, now())), vec!["Curry"]);

        view.search.clear();
        view.location = Filter::only("Cuisine");
        view.category = Filter::only("Plat cuisiné");
        assert_eq!(names(&ledger.query(&view, now())), vec!["Curry"]);

        view.category = Filter::All;
        assert_eq!(
            names(&ledger.query(&view, now())),
            vec!["Ancien", "Curry", "pizza"]
        );
    }

    #[test]
    fn query_annotates_freshness() {
        let ledger = sample();
        let result = ledger.query(&ViewState::new(), now());
        let status = |name: &str| {
            result
                .iter()
                .find(|r| r.item.name() == name)
                .map(|r| r.status)
                .unwrap()
        };
        assert_eq!(status("Boeuf"), RowStatus::Aged(Freshness::Stale));
        assert_eq!(status("Curry"), RowStatus::Aged(Freshness::Warning));
        assert_eq!(status("pizza"), RowStatus::Aged(Freshness::Fresh));
        assert_eq!(status("Ancien"), RowStatus::Aged(Freshness::Fresh));
    }

    #[test]
    fn view_can_be_iterated_repeatedly() {
        let ledger = sample();
        let result = ledger.query(&ViewState::new(), now());
        let first: Vec<_> = (&result).into_iter().map(|r| r.item.id()).collect();
        let second: Vec<_> = result.iter().map(|r| r.item.id()).collect();
        assert_eq!(first, second);
        assert_eq!(result.len(), 4);
    }

    fn name_strategy() -> impl Strategy<Value = String> {
        "[A-Za-z][A-Za-z ]{0,11}"
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: decrement never takes a quantity below one.
        #[test]
        fn decrement_never_goes_below_one(
            start in 1u32..20,
            steps in prop::collection::vec(any::<bool>(), 0..40),
        ) {
            let mut ledger = Ledger::new();
            let mut d = draft("Soup", "Cuisine");
            d.quantity = start;
            let id = ledger.add(d, now()).unwrap();
            for up in steps {
                if up {
                    ledger.increment(id).unwrap();
                } else {
                    ledger.decrement(id).unwrap();
                }
                prop_assert!(ledger.get(id).unwrap().quantity() >= 1);
            }
        }

        /// Property: renaming a reference rewrites exactly the matching fields.
        #[test]
        fn rename_cascade_rewrites_only_matches(
            locations in prop::collection::vec(prop::sample::select(vec!["Cuisine", "Cave", "Garage"]), 0..20),
            renames in prop::collection::vec(
                (prop::sample::select(vec!["Cuisine", "Cave", "Garage", "Kitchen"]),
                 prop::sample::select(vec!["Cuisine", "Cave", "Garage", "Kitchen"])),
                1..6,
            ),
        ) {
            let rows: Vec<StockRow> = locations
                .iter()
                .map(|loc| row("Soup", "Autre", loc, "2024-01-01"))
                .collect();
            let mut ledger = Ledger::from_rows(rows);
            for (old, new) in renames {
                let before = ledger.clone();
                ledger.rename_reference(RegistryKind::Location, old, new);
                for (b, a) in before.iter().zip(ledger.iter()) {
                    if b.location() == old {
                        prop_assert_eq!(a.location(), new);
                    } else {
                        prop_assert_eq!(a.location(), b.location());
                    }
                    prop_assert_eq!(a.name(), b.name());
                    prop_assert_eq!(a.category(), b.category());
                    prop_assert_eq!(a.container(), b.container());
                    prop_assert_eq!(a.added_at(), b.added_at());
                    prop_assert_eq!(a.quantity(), b.quantity());
                }
            }
        }

        /// Property: alpha order is case-insensitive ascending with the last
        /// added item first.
        #[test]
        fn alpha_order_with_pinned_item(
            existing in prop::collection::vec(name_strategy(), 0..15),
            added in name_strategy(),
        ) {
            let rows: Vec<StockRow> = existing
                .iter()
                .map(|n| row(n, "Autre", "Cuisine", "2024-01-01"))
                .collect();
            let mut ledger = Ledger::from_rows(rows);
            let id = ledger.add(draft(&added, "Cuisine"), now()).unwrap();
            let mut view = ViewState::new();
            view.mark_added(id);

            let result = ledger.query(&view, now());
            let listed: Vec<&StockItem> = result.items().collect();
            prop_assert_eq!(listed.len(), existing.len() + 1);
            prop_assert_eq!(listed[0].id(), id);
            for pair in listed[1..].windows(2) {
                prop_assert!(pair[0].name().to_lowercase() <= pair[1].name().to_lowercase());
            }
        }
    }

    #[test]
    fn recap_delegates_to_location_summary() {
        let ledger = sample();
        let summary = ledger.recap("Cuisine", now());
        assert_eq!(summary.lines().len(), 3);
    }
}
