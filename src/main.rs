// SPDX-License-Identifier: MPL-2.0
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use diaglog::config::{self, DiagnosticsConfig};
use diaglog::diagnostics::{Category, LogStore};
use diaglog::error::{Error, Result};
use diaglog::storage::FileStore;
use tracing_subscriber::EnvFilter;

const HELP: &str = "\
Inspect the durable diagnostics state

USAGE:
  diaglog [OPTIONS] <COMMAND>

COMMANDS:
  status     Show the capture toggle and persisted error count
  errors     Print the persisted error entries
  clear      Remove the persisted error entries
  enable     Turn capture on
  disable    Turn capture off

OPTIONS:
  --config PATH   Read configuration from PATH
  --storage DIR   Use DIR as the durable store
  -h, --help      Print this help
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Status,
    Errors,
    Clear,
    Enable,
    Disable,
}

impl Command {
    fn parse(name: &str) -> Result<Self> {
        match name {
            "status" => Ok(Command::Status),
            "errors" => Ok(Command::Errors),
            "clear" => Ok(Command::Clear),
            "enable" => Ok(Command::Enable),
            "disable" => Ok(Command::Disable),
            other => Err(Error::Usage(format!("unknown command `{other}`"))),
        }
    }
}

struct Args {
    config: Option<PathBuf>,
    storage: Option<PathBuf>,
    command: Command,
}

fn main() -> ExitCode {
    init_tracing();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_args() -> Result<Option<Args>> {
    let mut pargs = pico_args::Arguments::from_env();

    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        return Ok(None);
    }

    let config = pargs.opt_value_from_str("--config")?;
    let storage = pargs.opt_value_from_str("--storage")?;
    let command = match pargs.subcommand()? {
        Some(name) => Command::parse(&name)?,
        None => Command::Status,
    };

    let remaining = pargs.finish();
    if !remaining.is_empty() {
        return Err(Error::Usage(format!(
            "unexpected arguments: {remaining:?}"
        )));
    }

    Ok(Some(Args {
        config,
        storage,
        command,
    }))
}

fn run() -> Result<()> {
    let Some(args) = parse_args()? else {
        return Ok(());
    };

    let config = match &args.config {
        Some(path) => config::load_from_path(path)?,
        None => config::load()?,
    };
    let dir = args
        .storage
        .clone()
        .or_else(|| config.resolved_storage_dir())
        .ok_or_else(|| Error::Config("could not determine a storage directory".to_string()))?;

    let store = open_store(&config, dir.clone())?;
    tracing::debug!(storage = %dir.display(), command = ?args.command, "running command");

    match args.command {
        Command::Status => {
            let enabled = if store.is_enabled() { "enabled" } else { "disabled" };
            println!("capture:          {enabled}");
            println!("storage:          {}", dir.display());
            println!(
                "persisted errors: {}/{}",
                store.persisted_errors().len(),
                store.mirror().capacity()
            );
        }
        Command::Errors => {
            let errors = store.persisted_errors();
            if errors.is_empty() {
                println!("no persisted errors");
            }
            for entry in errors {
                println!("{} {} {}", entry.timestamp, Category::Error.tag(), entry.message);
                if let Some(data) = &entry.data {
                    println!("    {data}");
                }
                if let Some(location) = &entry.location {
                    println!("    at {location}");
                }
            }
        }
        Command::Clear => {
            store.clear(Category::Error);
            println!("persisted errors cleared");
        }
        Command::Enable => {
            store.enable();
            println!("capture enabled");
        }
        Command::Disable => {
            store.disable();
            println!("capture disabled");
        }
    }

    Ok(())
}

fn open_store(config: &DiagnosticsConfig, dir: PathBuf) -> Result<LogStore> {
    let durable = FileStore::new(dir)?;
    Ok(LogStore::new(config, Arc::new(durable)))
}
