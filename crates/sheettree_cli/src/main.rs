//! Command-line front end over `sheettree_core`.
//!
//! # Responsibility
//! - Map subcommands onto `SyncEngine` operations against a local sheet.
//! - Render the organized tree as indented text or JSON.

use clap::{Parser, Subcommand, ValueEnum};
use sheettree_core::{
    core_version, init_logging, ErrorAlert, LogOptions, Record, RecordKind, SheetConfig,
    SqliteRowStore, StaticTokenProvider, SyncEngine, ROOT_RECORD_ID,
};
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "sheettree")]
#[command(about = "Browse and edit a record tree stored in a flat sheet", long_about = None)]
struct Args {
    /// JSON config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Sheet database file (overrides the config)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the organized tree
    Tree {
        /// Emit JSON instead of indented text
        #[arg(long)]
        json: bool,
    },
    /// Create a file or folder
    Add {
        #[arg(short, long)]
        name: String,

        #[arg(short, long, value_enum, default_value_t = KindArg::File)]
        kind: KindArg,

        /// Parent folder id (top level when omitted)
        #[arg(short, long)]
        parent: Option<Uuid>,
    },
    /// Delete a record and everything below it
    Delete {
        #[arg(long)]
        id: Uuid,
    },
    /// Print the core version
    Version,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum KindArg {
    File,
    Folder,
}

impl From<KindArg> for RecordKind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::File => RecordKind::Leaf,
            KindArg::Folder => RecordKind::Container,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    if let Command::Version = args.command {
        println!("sheettree_core version={}", core_version());
        return Ok(());
    }

    let mut config = SheetConfig::load(args.config.as_deref())?;
    if let Some(db) = args.db {
        config.database_path = Some(db);
    }

    let log_options = LogOptions::new(config.effective_log_level(), config.effective_log_dir())
        .echo_warnings(true);
    if let Err(message) = init_logging(&log_options) {
        eprintln!("logging disabled: {message}");
    }

    let engine = open_engine(&config)?;
    engine.validate_sign_in_state().await;
    engine.fetch().await.map_err(alert_text)?;

    match args.command {
        Command::Tree { json } => {
            let root = engine.snapshot();
            if json {
                println!("{}", serde_json::to_string_pretty(root.as_ref())?);
            } else {
                print_tree(&root, 0);
            }
        }
        Command::Add { name, kind, parent } => {
            let parent_id = parent.unwrap_or(ROOT_RECORD_ID);
            let before = engine.snapshot();
            let root = engine
                .add_item(&name, kind.into(), parent_id)
                .await
                .map_err(alert_text)?;
            if let Some(added) = root.flatten().find(|record| before.find(record.id()).is_none()) {
                println!("{} {}", added.id(), added.position().a1_notation());
            }
        }
        Command::Delete { id } => {
            let root = engine.snapshot();
            let Some(target) = root.find(id).filter(|record| record.id() != ROOT_RECORD_ID)
            else {
                return Err(format!("no record with id {id}").into());
            };
            let removed = target.node_count();
            engine.delete_item(target).await.map_err(alert_text)?;
            println!("deleted {removed} record(s)");
        }
        Command::Version => {}
    }

    Ok(())
}

fn open_engine(config: &SheetConfig) -> Result<SyncEngine, Box<dyn Error>> {
    let store = match &config.database_path {
        Some(path) => SqliteRowStore::open(path, config.spreadsheet_id.as_str())?,
        None => SqliteRowStore::open_in_memory(config.spreadsheet_id.as_str())?,
    };
    let auth = StaticTokenProvider::new(config.access_token.clone());
    Ok(SyncEngine::new(
        Arc::new(store),
        Arc::new(auth),
        config.range.as_str(),
    ))
}

fn alert_text(error: sheettree_core::SheetError) -> Box<dyn Error> {
    let alert = ErrorAlert::from(error);
    format!("{}: {}", alert.title, alert.message).into()
}

fn print_tree(record: &Record, depth: usize) {
    let marker = if record.is_container() { "/" } else { "" };
    let range = record.position().a1_notation();
    if range.is_empty() {
        println!("{}{}{marker}", "  ".repeat(depth), record.name());
    } else {
        println!(
            "{}{}{marker}  [{range}] {}",
            "  ".repeat(depth),
            record.name(),
            record.id()
        );
    }
    for child in record.children() {
        print_tree(child, depth + 1);
    }
}
