//! admin-cli: command-line front end for the Partnerships admin tool.
//!
//! Lists, searches, shows, creates, edits, deletes, and exports partnership
//! records. Storage is a single JSON file (default) or an in-memory slot
//! seeded on every run.
//!
//! Run:
//! ```bash
//! cargo run -p admin-cli -- list
//! cargo run -p admin-cli -- create --name "Oceanic Air" --url https://portal.oceanic.example --fee 12.5
//!
//! # JSON logs, throwaway storage
//! LOG_FORMAT=json PARTNERSHIPS_STORAGE=memory cargo run -p admin-cli -- export
//! ```
//!
//! Configuration: See `config.rs` for all environment variables.

mod args;
mod commands;
mod config;

use std::process;
use std::time::SystemTime;

use domain::adapters::memory_slot::InMemorySlot;
use domain::id::ObjectIdGenerator;
use domain::session::Workbench;
use domain::store::RecordStore;
use domain::{CoreError, SlotStorage, SystemClock};
use file_slot::FileSlot;
use tracing::{debug, error};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::commands::Command;
use crate::config::{Config, LogFormat, StorageProvider};

// Slot abstraction over the configured backend.
enum AnySlot {
    Memory(InMemorySlot),
    File(FileSlot),
}

impl AnySlot {
    fn from_config(cfg: &Config) -> Result<Self, CoreError> {
        Ok(match cfg.storage_provider {
            StorageProvider::Memory => AnySlot::Memory(InMemorySlot::new()),
            StorageProvider::File => AnySlot::File(FileSlot::create(&cfg.store_path)?),
        })
    }
}

impl SlotStorage for AnySlot {
    fn read(&self) -> Result<Option<String>, CoreError> {
        match self {
            AnySlot::Memory(s) => s.read(),
            AnySlot::File(s) => s.read(),
        }
    }

    fn write(&self, contents: &str) -> Result<(), CoreError> {
        match self {
            AnySlot::Memory(s) => s.write(contents),
            AnySlot::File(s) => s.write(contents),
        }
    }
}

fn init_tracing(format: &LogFormat) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);
    match format {
        LogFormat::Json => {
            registry
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_timer(fmt::time::SystemTime)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        LogFormat::Pretty => {
            registry
                .with(
                    fmt::layer()
                        .pretty()
                        .with_target(true)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    }
}

type CliWorkbench = Workbench<AnySlot, SystemClock, ObjectIdGenerator>;

fn open_workbench(cfg: &Config) -> Result<CliWorkbench, String> {
    let slot = AnySlot::from_config(cfg).map_err(|e| format!("storage setup failed: {}", e))?;
    debug!(provider = ?cfg.storage_provider, path = %cfg.store_path.display(), "opening store");
    let store = RecordStore::open(
        slot,
        SystemClock,
        ObjectIdGenerator::for_process(SystemTime::now()),
    );
    Ok(Workbench::new(store))
}

fn run(cfg: &Config) -> Result<(), String> {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let Some(cmd) = Command::parse(&argv)? else {
        eprintln!("{}", commands::usage());
        return Ok(());
    };

    let mut wb = open_workbench(cfg)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    commands::execute(&mut wb, cmd, &mut out)
}

fn main() {
    // Load and validate config first (fail fast on misconfiguration)
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(2);
        }
    };
    init_tracing(&cfg.log_format);
    cfg.warn_if_ephemeral();

    if let Err(msg) = run(&cfg) {
        error!("command failed");
        eprintln!("error: {}", msg);
        process::exit(1);
    }
}
