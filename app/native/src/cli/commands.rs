//! CLI command definitions using Clap.

use std::io;
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Generator, Shell};
use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Modify, Style};
use tabled::{Table, Tabled};

use crate::config::{self, Settings};
use crate::constants::{APP_NAME, STORE_ENV_VAR};
use crate::error::MuralError;
use crate::library::PoolOrder;
use crate::runtime;
use crate::store::Store;

/// Application version from Cargo.toml.
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Mural - multi-screen wallpaper rotation with interactive rating and
/// tagging.
#[derive(Parser, Debug)]
#[command(name = "mural")]
#[command(author, version = APP_VERSION, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Image files or directories (searched recursively) to rotate over.
    #[arg(value_name = "SOURCES")]
    sources: Vec<String>,

    /// Seconds between automatic rotations.
    #[arg(long, short, default_value_t = config::default_interval())]
    interval: f64,

    /// Store file location.
    #[arg(long, env = STORE_ENV_VAR, value_name = "FILE")]
    store: Option<PathBuf>,

    /// Filter expression, e.g. `rating >= 2 and not tag:nsfw`.
    #[arg(long, short, value_name = "EXPR")]
    query: Option<String>,

    /// Rotate in natural filename order instead of shuffling.
    #[arg(long)]
    sort: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Store inspection commands.
    #[command(subcommand)]
    Db(DbCommands),

    /// Generate shell completions.
    ///
    /// Outputs shell completion script to stdout for the specified shell.
    ///
    /// Usage:
    ///   eval "$(mural completions --shell zsh)"
    ///   mural completions --shell bash > ~/.local/share/bash-completion/completions/mural
    Completions {
        /// The shell to generate completions for.
        #[arg(long, short, value_enum)]
        shell: Shell,
    },
}

/// Store subcommands.
#[derive(Subcommand, Debug)]
pub enum DbCommands {
    /// List every stored wallpaper record.
    List {
        /// Store file location.
        #[arg(long, env = STORE_ENV_VAR, value_name = "FILE")]
        store: Option<PathBuf>,
    },
    /// Report records whose source files have all gone missing.
    Check {
        /// Store file location.
        #[arg(long, env = STORE_ENV_VAR, value_name = "FILE")]
        store: Option<PathBuf>,
    },
}

impl Cli {
    /// Executes the selected command.
    ///
    /// # Errors
    ///
    /// Returns fatal startup errors from the interactive rotator and store
    /// read failures from the inspection commands.
    pub fn execute(self) -> Result<(), MuralError> {
        match self.command {
            Some(Commands::Db(db)) => {
                crate::logging::init_stderr();
                Self::execute_db(&db)
            }
            Some(Commands::Completions { shell }) => {
                Self::print_completions(shell);
                Ok(())
            }
            None => {
                let order = if self.sort { PoolOrder::Sorted } else { PoolOrder::Shuffle };
                let settings = Settings::resolve(
                    self.sources,
                    self.interval,
                    self.store,
                    self.query.as_deref(),
                    order,
                )?;
                crate::logging::init(&settings.store_path);
                runtime::run(&settings)
            }
        }
    }

    /// Print shell completions to stdout.
    fn print_completions<G: Generator>(generator: G) {
        let mut cmd = Self::command();
        generate(generator, &mut cmd, APP_NAME, &mut io::stdout());
    }

    fn execute_db(command: &DbCommands) -> Result<(), MuralError> {
        match command {
            DbCommands::List { store } => Self::execute_db_list(store.clone()),
            DbCommands::Check { store } => Self::execute_db_check(store.clone()),
        }
    }

    fn execute_db_list(store_flag: Option<PathBuf>) -> Result<(), MuralError> {
        #[derive(Tabled)]
        struct RecordRow {
            #[tabled(rename = "Hash")]
            hash: String,
            #[tabled(rename = "Size")]
            size: String,
            #[tabled(rename = "Rating")]
            rating: i32,
            #[tabled(rename = "Purity")]
            purity: i32,
            #[tabled(rename = "Tags")]
            tags: String,
            #[tabled(rename = "Path")]
            path: String,
        }

        let store = open_store(store_flag);
        let data = store.read_all()?;
        if data.wallpapers.is_empty() {
            println!("Store is empty ({}).", store.path().display());
            return Ok(());
        }

        let rows: Vec<RecordRow> = data
            .wallpapers
            .iter()
            .map(|(hash, record)| RecordRow {
                hash: short_hash(hash),
                size: format!("{}x{}", record.width, record.height),
                rating: record.rating,
                purity: record.purity,
                tags: record.tags.iter().cloned().collect::<Vec<_>>().join(", "),
                path: record
                    .paths
                    .first()
                    .map_or_else(String::new, |p| p.display().to_string()),
            })
            .collect();

        let table = Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Columns::new(2..4)).with(Alignment::right()))
            .to_string();

        println!("Wallpapers ({})", data.wallpapers.len());
        println!("{table}");
        Ok(())
    }

    fn execute_db_check(store_flag: Option<PathBuf>) -> Result<(), MuralError> {
        let store = open_store(store_flag);
        let data = store.read_all()?;

        let mut orphaned = 0usize;
        for (hash, record) in &data.wallpapers {
            let live = record.paths.iter().filter(|path| path.exists()).count();
            if live == 0 {
                orphaned += 1;
                println!(
                    "{}: all {} path(s) missing, first was {}",
                    short_hash(hash),
                    record.paths.len(),
                    record
                        .paths
                        .first()
                        .map_or_else(String::new, |p| p.display().to_string())
                );
            }
        }

        if orphaned == 0 {
            println!(
                "All {} record(s) have at least one existing source file.",
                data.wallpapers.len()
            );
        } else {
            println!("{orphaned} of {} record(s) orphaned.", data.wallpapers.len());
        }
        Ok(())
    }
}

fn open_store(flag: Option<PathBuf>) -> Store {
    Store::new(config::resolve_store_path(flag))
}

fn short_hash(hash: &str) -> String {
    hash.chars().take(12).collect()
}
