//! The pantry service: in-memory state plus the persistence pipeline.

use chrono::NaiveDateTime;

use pantry_core::ItemId;
use pantry_inventory::{ItemDraft, ItemPatch, Ledger, Registry, RegistryKind, ViewState};

use crate::error::PantryError;
use crate::store::{FileStore, TableWrite};
use crate::sync::{FileSync, Receipt, RemoteSync, SyncStatus};

/// Ledger and registries backed by a `FileStore` and mirrored to a remote.
///
/// Every mutation works on a copy of the affected state, commits the copy to
/// disk, and only then replaces the in-memory state. A rejected or failed
/// operation therefore leaves the service exactly as it was. Remote pushes
/// happen after the local commit and never fail the operation.
pub struct Pantry<R> {
    store: FileStore,
    remote: R,
    ledger: Ledger,
    locations: Registry,
    categories: Registry,
    containers: Registry,
}

impl<R: RemoteSync> Pantry<R> {
    /// Load every table from `store`.
    pub fn open(store: FileStore, remote: R) -> Self {
        let ledger = store.load_ledger();
        let locations = store.load_registry(RegistryKind::Location);
        let categories = store.load_registry(RegistryKind::Category);
        let containers = store.load_registry(RegistryKind::Container);
        tracing::info!(
            items = ledger.len(),
            locations = locations.len(),
            categories = categories.len(),
            containers = containers.len(),
            remote = remote.is_enabled(),
            "pantry loaded"
        );
        Self {
            store,
            remote,
            ledger,
            locations,
            categories,
            containers,
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn registry(&self, kind: RegistryKind) -> &Registry {
        match kind {
            RegistryKind::Location => &self.locations,
            RegistryKind::Category => &self.categories,
            RegistryKind::Container => &self.containers,
        }
    }

    fn registry_mut(&mut self, kind: RegistryKind) -> &mut Registry {
        match kind {
            RegistryKind::Location => &mut self.locations,
            RegistryKind::Category => &mut self.categories,
            RegistryKind::Container => &mut self.containers,
        }
    }

    /// Add an item stamped with `now` and mark it as the last added one.
    pub fn add_item(
        &mut self,
        view: &mut ViewState,
        draft: ItemDraft,
        now: NaiveDateTime,
    ) -> Result<(ItemId, Receipt), PantryError> {
        let mut next = self.ledger.clone();
        let message = format!("Add {}", draft.name);
        let id = next.add(draft, now)?;
        let receipt = self.save_ledger(next, true, &message)?;
        view.mark_added(id);
        Ok((id, receipt))
    }

    pub fn increment(&mut self, id: ItemId) -> Result<Receipt, PantryError> {
        let mut next = self.ledger.clone();
        next.increment(id)?;
        let message = item_message("Increment", &next, id);
        self.save_ledger(next, true, &message)
    }

    /// Decrement stops at one. The ledger is saved even when nothing changed.
    pub fn decrement(&mut self, id: ItemId) -> Result<Receipt, PantryError> {
        let mut next = self.ledger.clone();
        let changed = next.decrement(id)?;
        let message = item_message("Decrement", &next, id);
        self.save_ledger(next, changed, &message)
    }

    pub fn remove_item(&mut self, view: &mut ViewState, id: ItemId) -> Result<Receipt, PantryError> {
        let mut next = self.ledger.clone();
        let removed = next.remove(id)?;
        let receipt = self.save_ledger(next, true, &format!("Remove {}", removed.name()))?;
        view.forget(id);
        Ok(receipt)
    }

    pub fn edit_item(&mut self, id: ItemId, patch: ItemPatch) -> Result<Receipt, PantryError> {
        let mut next = self.ledger.clone();
        let message = format!("Edit {}", next.edit(id, patch)?.name());
        self.save_ledger(next, true, &message)
    }

    /// Add a registry entry. Blank or duplicate names change nothing and
    /// write nothing.
    pub fn add_entry(&mut self, kind: RegistryKind, name: &str) -> Result<Receipt, PantryError> {
        let mut next = self.registry(kind).clone();
        if !next.add(name) {
            return Ok(Receipt::unchanged());
        }
        let message = format!("New {kind} {name}");
        let write = TableWrite::registry(&next)?;
        self.store.commit(std::slice::from_ref(&write))?;
        *self.registry_mut(kind) = next;
        Ok(self.push(vec![write], &message))
    }

    /// Rename a registry entry and every stock item referencing it.
    ///
    /// Both tables are committed together: either both files and the
    /// in-memory state change, or none of them does.
    pub fn rename_entry(
        &mut self,
        kind: RegistryKind,
        old: &str,
        new: &str,
    ) -> Result<Receipt, PantryError> {
        let mut registry = self.registry(kind).clone();
        if !registry.rename(old, new)? {
            return Ok(Receipt::unchanged());
        }
        let mut ledger = self.ledger.clone();
        let touched = ledger.rename_reference(kind, old, new);

        let writes = vec![TableWrite::registry(&registry)?, TableWrite::stock(&ledger)?];
        self.store.commit(&writes)?;
        *self.registry_mut(kind) = registry;
        self.ledger = ledger;

        tracing::info!(%kind, old, new, touched, "registry entry renamed");
        Ok(self.push(writes, &format!("Rename {kind} {old}->{new}")))
    }

    /// Remove a registry entry. Items keep the old value.
    pub fn remove_entry(&mut self, kind: RegistryKind, name: &str) -> Result<Receipt, PantryError> {
        let mut next = self.registry(kind).clone();
        if !next.remove(name) {
            return Ok(Receipt::unchanged());
        }
        let write = TableWrite::registry(&next)?;
        self.store.commit(std::slice::from_ref(&write))?;
        *self.registry_mut(kind) = next;
        Ok(self.push(vec![write], &format!("Delete {kind} {name}")))
    }

    fn save_ledger(
        &mut self,
        next: Ledger,
        changed: bool,
        message: &str,
    ) -> Result<Receipt, PantryError> {
        let write = TableWrite::stock(&next)?;
        self.store.commit(std::slice::from_ref(&write))?;
        self.ledger = next;
        tracing::info!(items = self.ledger.len(), message, "stock saved");
        let mut receipt = self.push(vec![write], message);
        receipt.changed = changed;
        Ok(receipt)
    }

    fn push(&self, writes: Vec<TableWrite>, message: &str) -> Receipt {
        let files = writes
            .into_iter()
            .map(|write| {
                let file = self.store.file_name(write.table).to_string();
                let status = if !self.remote.is_enabled() {
                    SyncStatus::Disabled
                } else {
                    match self.remote.push(&file, &write.content, message) {
                        Ok(()) => SyncStatus::Synced,
                        Err(e) => {
                            tracing::warn!(file = %file, error = %e, "remote sync failed");
                            SyncStatus::Failed(e.to_string())
                        }
                    }
                };
                FileSync { file, status }
            })
            .collect();
        Receipt {
            changed: true,
            files,
        }
    }
}

fn item_message(verb: &str, ledger: &Ledger, id: ItemId) -> String {
    match ledger.get(id) {
        Some(item) => format!("{verb} {}", item.name()),
        None => verb.to_string(),
    }
}
