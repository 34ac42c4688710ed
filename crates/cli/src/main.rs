//! `pantry`: command-line front end for the freezer and pantry stock.
//!
//! Items are addressed either by the number shown in `pantry list` or by
//! their exact name. Numbers count rows from the bottom of the stock table,
//! so adding items never changes them; removing an item renumbers the items
//! added after it.

mod render;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use pantry_core::{Entity, ItemId};
use pantry_infra::{Pantry, Receipt, RemoteSync, Settings};
use pantry_inventory::{
    Filter, ItemDraft, ItemPatch, Ledger, RegistryKind, SortMode, Unit, ViewState,
};

#[derive(Parser)]
#[command(name = "pantry")]
#[command(about = "Track what is stored in the freezer and the pantry")]
#[command(version)]
struct Cli {
    /// Directory holding the CSV tables
    #[arg(long, env = "PANTRY_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// GitHub token used to push tables
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    /// Repository receiving the tables (`owner/name`)
    #[arg(long, env = "REPO_NAME", global = true)]
    repo: Option<String>,

    /// GitHub API base URL
    #[arg(long, env = "PANTRY_GITHUB_API", global = true)]
    github_api: Option<String>,

    /// Branch to push to (repository default when unset)
    #[arg(long, env = "PANTRY_GITHUB_BRANCH", global = true)]
    branch: Option<String>,

    /// Verbose logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the data directory and default tables
    Init,

    /// List stock items
    List {
        /// Case-insensitive substring of the name
        #[arg(long)]
        search: Option<String>,

        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        location: Option<String>,

        /// alpha, newest or oldest
        #[arg(long, default_value = "alpha")]
        sort: SortMode,

        /// Show this item first, marked as new
        #[arg(long)]
        highlight: Option<ItemId>,
    },

    /// Add an item stamped with the current time
    Add {
        name: String,

        #[arg(long)]
        category: String,

        #[arg(long)]
        location: String,

        #[arg(long)]
        container: String,

        #[arg(long, default_value_t = 1)]
        quantity: u32,

        /// Portions, kg or Pièces
        #[arg(long, default_value = "Portions")]
        unit: Unit,
    },

    /// Increase an item's quantity by one
    Inc {
        /// Number from `pantry list`, or the exact name
        #[arg(value_parser = parse_item_ref)]
        item: ItemRef,
    },

    /// Decrease an item's quantity by one (never below one)
    Dec {
        /// Number from `pantry list`, or the exact name
        #[arg(value_parser = parse_item_ref)]
        item: ItemRef,
    },

    /// Delete an item
    Rm {
        /// Number from `pantry list`, or the exact name
        #[arg(value_parser = parse_item_ref)]
        item: ItemRef,
    },

    /// Change an item's descriptive fields
    Edit {
        /// Number from `pantry list`, or the exact name
        #[arg(value_parser = parse_item_ref)]
        item: ItemRef,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        location: Option<String>,

        #[arg(long)]
        container: Option<String>,

        #[arg(long)]
        unit: Option<Unit>,
    },

    /// Items at a location, oldest first
    Recap { location: String },

    /// Manage storage locations
    Locations {
        #[command(subcommand)]
        action: RegistryAction,
    },

    /// Manage categories
    Categories {
        #[command(subcommand)]
        action: RegistryAction,
    },

    /// Manage container types
    Containers {
        #[command(subcommand)]
        action: RegistryAction,
    },
}

#[derive(Subcommand)]
enum RegistryAction {
    List,
    Add { name: String },
    /// Rename an entry and every item using it
    Rename { old: String, new: String },
    /// Remove an entry; items keep their value
    Rm { name: String },
}

/// How an item is named on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ItemRef {
    Number(ItemId),
    Name(String),
}

fn parse_item_ref(raw: &str) -> Result<ItemRef, String> {
    if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
        raw.parse().map(ItemRef::Number).map_err(|e| format!("{e}"))
    } else if raw.trim().is_empty() {
        Err("expected an item number or name".to_string())
    } else {
        Ok(ItemRef::Name(raw.to_string()))
    }
}

/// The session id of the referenced item. Names must match exactly one item.
fn resolve(ledger: &Ledger, item: &ItemRef) -> Result<ItemId> {
    match item {
        ItemRef::Number(id) => Ok(*id),
        ItemRef::Name(name) => {
            let ids: Vec<ItemId> = ledger.named(name).map(|row| row.id()).collect();
            match ids.as_slice() {
                [id] => Ok(*id),
                [] => bail!("no item named {name:?}"),
                many => bail!(
                    "{} items are named {name:?}; use the number from `pantry list`",
                    many.len()
                ),
            }
        }
    }
}

fn main() {
    let cli = Cli::parse();
    pantry_observability::init_with(
        if cli.verbose { "debug" } else { "warn" },
        pantry_observability::LogFormat::Compact,
    );

    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let settings = Settings::resolve(cli.data_dir, cli.token, cli.repo, cli.github_api, cli.branch);
    let store = settings.store();

    if let Command::Init = cli.command {
        let created = store
            .initialize()
            .with_context(|| format!("initializing {}", store.data_dir().display()))?;
        if created.is_empty() {
            println!("{} already initialized", store.data_dir().display());
        }
        for table in created {
            println!("created {}", store.path(table).display());
        }
        return Ok(());
    }

    let remote = settings.remote().context("building the GitHub client")?;
    let mut pantry = Pantry::open(store, remote);
    let mut view = ViewState::new();
    let now = chrono::Local::now().naive_local();

    match cli.command {
        Command::Init => {}
        Command::List {
            search,
            category,
            location,
            sort,
            highlight,
        } => {
            view.search = search.unwrap_or_default();
            view.category = Filter::from(category);
            view.location = Filter::from(location);
            view.sort = sort;
            if let Some(id) = highlight {
                view.mark_added(id);
            }
            let listed = pantry.ledger().query(&view, now);
            if listed.is_empty() {
                println!("no items");
            }
            for line in render::stock_lines(&listed) {
                println!("{line}");
            }
        }
        Command::Add {
            name,
            category,
            location,
            container,
            quantity,
            unit,
        } => {
            warn_unregistered(&pantry, RegistryKind::Category, &category);
            warn_unregistered(&pantry, RegistryKind::Location, &location);
            warn_unregistered(&pantry, RegistryKind::Container, &container);
            let draft = ItemDraft {
                name,
                category,
                location,
                container,
                quantity,
                unit,
            };
            let (id, receipt) = pantry
                .add_item(&mut view, draft, now)
                .context("adding item")?;
            println!("added #{id}");
            report(&receipt);
        }
        Command::Inc { item } => {
            let id = resolve(pantry.ledger(), &item)?;
            let receipt = pantry.increment(id).with_context(|| format!("item #{id}"))?;
            print_quantity(&pantry, id);
            report(&receipt);
        }
        Command::Dec { item } => {
            let id = resolve(pantry.ledger(), &item)?;
            let receipt = pantry.decrement(id).with_context(|| format!("item #{id}"))?;
            if !receipt.changed {
                println!("quantity is already at its minimum");
            }
            print_quantity(&pantry, id);
            report(&receipt);
        }
        Command::Rm { item } => {
            let id = resolve(pantry.ledger(), &item)?;
            let receipt = pantry
                .remove_item(&mut view, id)
                .with_context(|| format!("item #{id}"))?;
            println!("removed #{id}");
            report(&receipt);
        }
        Command::Edit {
            item,
            name,
            category,
            location,
            container,
            unit,
        } => {
            let patch = ItemPatch {
                name,
                category,
                location,
                container,
                unit,
            };
            if patch.is_empty() {
                bail!("nothing to change; pass at least one field");
            }
            let id = resolve(pantry.ledger(), &item)?;
            let receipt = pantry
                .edit_item(id, patch)
                .with_context(|| format!("item #{id}"))?;
            println!("updated #{id}");
            report(&receipt);
        }
        Command::Recap { location } => {
            for line in render::recap_lines(&pantry.ledger().recap(&location, now)) {
                println!("{line}");
            }
        }
        Command::Locations { action } => registry(&mut pantry, RegistryKind::Location, action)?,
        Command::Categories { action } => registry(&mut pantry, RegistryKind::Category, action)?,
        Command::Containers { action } => registry(&mut pantry, RegistryKind::Container, action)?,
    }
    Ok(())
}

fn registry<R: RemoteSync>(
    pantry: &mut Pantry<R>,
    kind: RegistryKind,
    action: RegistryAction,
) -> Result<()> {
    let receipt = match action {
        RegistryAction::List => {
            for line in render::registry_lines(pantry.registry(kind)) {
                println!("{line}");
            }
            return Ok(());
        }
        RegistryAction::Add { name } => {
            let receipt = pantry.add_entry(kind, &name)?;
            if !receipt.changed {
                println!("{kind} {name:?} not added (blank or already present)");
            }
            receipt
        }
        RegistryAction::Rename { old, new } => {
            let receipt = pantry
                .rename_entry(kind, &old, &new)
                .with_context(|| format!("renaming {kind} {old:?}"))?;
            if receipt.changed {
                let moved = pantry
                    .ledger()
                    .iter()
                    .filter(|item| item.reference(kind) == new)
                    .count();
                println!("renamed {old} to {new}; {moved} item(s) now use it");
            }
            receipt
        }
        RegistryAction::Rm { name } => {
            let receipt = pantry.remove_entry(kind, &name)?;
            if !receipt.changed {
                println!("no {kind} named {name:?}");
            }
            receipt
        }
    };
    report(&receipt);
    Ok(())
}

fn warn_unregistered<R: RemoteSync>(pantry: &Pantry<R>, kind: RegistryKind, name: &str) {
    if !pantry.registry(kind).contains(name) {
        tracing::warn!(%kind, name, "value is not in the registry");
    }
}

fn print_quantity<R: RemoteSync>(pantry: &Pantry<R>, id: ItemId) {
    if let Some(item) = pantry.ledger().get(id) {
        println!("{}: {} {}", item.name(), item.quantity(), item.unit());
    }
}

fn report(receipt: &Receipt) {
    for warning in render::sync_warnings(receipt) {
        eprintln!("{warning}");
    }
}
