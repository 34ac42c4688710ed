//! Lookup registries: locations, categories and containers.
//!
//! A registry is a set of unique names offered when creating or editing a
//! stock item. Items reference entries by plain string; nothing here keeps
//! them in sync except the explicit rename cascade driven by the caller.

use serde::{Deserialize, Serialize};

use pantry_core::{DomainError, DomainResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryKind {
    Location,
    Category,
    Container,
}

impl RegistryKind {
    pub fn label(&self) -> &'static str {
        match self {
            RegistryKind::Location => "location",
            RegistryKind::Category => "category",
            RegistryKind::Container => "container",
        }
    }

    /// Entries written by first-run initialization.
    pub fn defaults(&self) -> &'static [&'static str] {
        match self {
            RegistryKind::Location => &["Cuisine", "Buanderie"],
            RegistryKind::Category => &["Plat cuisiné", "Surgelé", "Autre"],
            RegistryKind::Container => &["Pyrex", "Tupperware", "Verre Carré"],
        }
    }
}

impl core::fmt::Display for RegistryKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry {
    kind: RegistryKind,
    names: Vec<String>,
}

impl Registry {
    pub fn new(kind: RegistryKind) -> Self {
        Self {
            kind,
            names: Vec::new(),
        }
    }

    /// Build from stored names, dropping blanks and duplicates.
    pub fn from_names<I, S>(kind: RegistryKind, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut registry = Self::new(kind);
        for name in names {
            registry.add(name);
        }
        registry
    }

    pub fn with_defaults(kind: RegistryKind) -> Self {
        Self::from_names(kind, kind.defaults().iter().copied())
    }

    pub fn kind(&self) -> RegistryKind {
        self.kind
    }

    /// Names in storage order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Names in display order (alphabetical, case-insensitive first).
    pub fn sorted(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.names.iter().map(String::as_str).collect();
        names.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b)));
        names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Add `name` as given unless it is blank or already present. Returns
    /// whether the registry changed.
    pub fn add(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if name.trim().is_empty() || self.contains(&name) {
            return false;
        }
        self.names.push(name);
        true
    }

    /// Rename an entry in place. Renaming to the same name is a no-op.
    pub fn rename(&mut self, old: &str, new: &str) -> DomainResult<bool> {
        if new.trim().is_empty() {
            return Err(DomainError::validation(format!(
                "{} name cannot be empty",
                self.kind
            )));
        }
        let Some(pos) = self.names.iter().position(|n| n == old) else {
            return Err(DomainError::not_found(format!("{} {old:?}", self.kind)));
        };
        if old == new {
            return Ok(false);
        }
        if self.contains(new) {
            return Err(DomainError::conflict(format!(
                "{} {new:?} already exists",
                self.kind
            )));
        }
        self.names[pos] = new.to_string();
        Ok(true)
    }

    /// Remove an entry. Items referencing it keep the old value.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.names.len();
        self.names.retain(|n| n != name);
        self.names.len() != before
    }
}
