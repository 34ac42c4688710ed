//! On-disk tables: one CSV file per table in a data directory.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use pantry_inventory::{Ledger, Registry, RegistryKind};
use tempfile::NamedTempFile;

use crate::error::StoreError;
use crate::table;

/// A persisted table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Stock,
    Registry(RegistryKind),
}

impl Table {
    pub const ALL: [Table; 4] = [
        Table::Stock,
        Table::Registry(RegistryKind::Location),
        Table::Registry(RegistryKind::Category),
        Table::Registry(RegistryKind::Container),
    ];
}

/// File names of each table inside the data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
    pub stock_file: String,
    pub locations_file: String,
    pub categories_file: String,
    pub containers_file: String,
}

impl StoreConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            stock_file: "stock_congelateur.csv".to_string(),
            locations_file: "lieux.csv".to_string(),
            categories_file: "categories.csv".to_string(),
            containers_file: "contenants.csv".to_string(),
        }
    }
}

/// Encoded content destined for one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableWrite {
    pub table: Table,
    pub content: Vec<u8>,
}

impl TableWrite {
    pub fn stock(ledger: &Ledger) -> Result<Self, StoreError> {
        let content = table::encode_stock(&ledger.to_rows())
            .map_err(|e| StoreError::csv("stock", e))?;
        Ok(Self {
            table: Table::Stock,
            content,
        })
    }

    pub fn registry(registry: &Registry) -> Result<Self, StoreError> {
        let content = table::encode_names(registry.names())
            .map_err(|e| StoreError::csv(registry.kind().label(), e))?;
        Ok(Self {
            table: Table::Registry(registry.kind()),
            content,
        })
    }
}

#[derive(Debug, Clone)]
pub struct FileStore {
    config: StoreConfig,
}

impl FileStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self::with_config(StoreConfig::new(data_dir))
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self { config }
    }

    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    pub fn file_name(&self, table: Table) -> &str {
        match table {
            Table::Stock => &self.config.stock_file,
            Table::Registry(RegistryKind::Location) => &self.config.locations_file,
            Table::Registry(RegistryKind::Category) => &self.config.categories_file,
            Table::Registry(RegistryKind::Container) => &self.config.containers_file,
        }
    }

    pub fn path(&self, table: Table) -> PathBuf {
        self.config.data_dir.join(self.file_name(table))
    }

    fn read(&self, table: Table) -> Option<Vec<u8>> {
        let path = self.path(table);
        match fs::read(&path) {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "table file missing, loading empty");
                None
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "table file unreadable, loading empty");
                None
            }
        }
    }

    /// Load the stock ledger. A missing, unreadable or malformed file yields
    /// an empty ledger.
    pub fn load_ledger(&self) -> Ledger {
        let Some(bytes) = self.read(Table::Stock) else {
            return Ledger::new();
        };
        match table::decode_stock(&bytes) {
            Ok(rows) => Ledger::from_rows(rows),
            Err(e) => {
                tracing::warn!(error = %e, "malformed stock table, starting from an empty ledger");
                Ledger::new()
            }
        }
    }

    /// Load a registry. A missing or malformed file yields an empty registry;
    /// first-run defaults come from `initialize`, never from here.
    pub fn load_registry(&self, kind: RegistryKind) -> Registry {
        let Some(bytes) = self.read(Table::Registry(kind)) else {
            return Registry::new(kind);
        };
        match table::decode_names(&bytes) {
            Ok(names) => Registry::from_names(kind, names),
            Err(e) => {
                tracing::warn!(registry = %kind, error = %e, "malformed registry table, loading empty");
                Registry::new(kind)
            }
        }
    }

    /// First-run setup: create the data directory and write default tables
    /// for every file that does not exist yet. Returns the tables created.
    pub fn initialize(&self) -> Result<Vec<Table>, StoreError> {
        fs::create_dir_all(self.data_dir()).map_err(|e| StoreError::io(self.data_dir(), e))?;

        let mut writes = Vec::new();
        for table in Table::ALL {
            if self.path(table).exists() {
                continue;
            }
            let write = match table {
                Table::Stock => TableWrite::stock(&Ledger::new())?,
                Table::Registry(kind) => TableWrite::registry(&Registry::with_defaults(kind))?,
            };
            writes.push(write);
        }
        self.commit(&writes)?;

        let created: Vec<Table> = writes.iter().map(|w| w.table).collect();
        tracing::info!(
            data_dir = %self.data_dir().display(),
            created = created.len(),
            "store initialized"
        );
        Ok(created)
    }

    /// Write several tables as one unit.
    ///
    /// Every table is first staged in a temporary file next to its target,
    /// and the current content of each target is read. A target that exists
    /// but cannot be read fails the commit before anything is replaced.
    /// Targets are then replaced one by one; if a replacement fails, the
    /// tables already replaced are restored to their previous content.
    pub fn commit(&self, writes: &[TableWrite]) -> Result<(), StoreError> {
        if writes.is_empty() {
            return Ok(());
        }
        let dir = self.data_dir();
        fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;

        let mut staged = Vec::with_capacity(writes.len());
        for write in writes {
            let mut tmp = NamedTempFile::new_in(dir).map_err(|e| StoreError::io(dir, e))?;
            tmp.write_all(&write.content)
                .and_then(|()| tmp.as_file().sync_all())
                .map_err(|e| StoreError::io(tmp.path(), e))?;
            let target = self.path(write.table);
            let previous = match fs::read(&target) {
                Ok(bytes) => Some(bytes),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
                Err(e) => return Err(StoreError::io(target, e)),
            };
            staged.push((tmp, target, previous));
        }

        let mut replaced: Vec<(PathBuf, Option<Vec<u8>>)> = Vec::with_capacity(staged.len());
        for (tmp, target, previous) in staged {
            if let Err(e) = tmp.persist(&target) {
                rollback(&replaced);
                return Err(StoreError::io(target, e.error));
            }
            replaced.push((target, previous));
        }
        Ok(())
    }
}

fn rollback(replaced: &[(PathBuf, Option<Vec<u8>>)]) {
    for (path, previous) in replaced {
        let result = match previous {
            Some(bytes) => fs::write(path, bytes),
            None => fs::remove_file(path),
        };
        if let Err(e) = result {
            tracing::error!(path = %path.display(), error = %e, "failed to roll back table");
        }
    }
}
