//! Infrastructure layer: CSV tables on disk, remote sync, configuration.
//!
//! `Pantry` is the entry point: it owns the in-memory ledger and registries
//! and runs every mutation through mutate → commit to disk → push remote.

pub mod error;
pub mod service;
pub mod settings;
pub mod store;
pub mod sync;
pub mod table;

pub use error::{PantryError, StoreError, SyncError};
pub use service::Pantry;
pub use settings::Settings;
pub use store::{FileStore, StoreConfig, Table, TableWrite};
pub use sync::{FileSync, GitHubConfig, GitHubContents, NoRemote, Receipt, RemoteSync, SyncStatus};
