//! Command-line front end. Each subcommand builds a coordinator, points it at
//! the sources named on the command line, and reports what happened.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};

use crate::background::spawn_load;
use crate::config::{Config, ConnectionOverrides};
use crate::coordinator::Coordinator;
use crate::db::RelationalSource;
use crate::file::{FileOptions, FileSource};
use crate::models::{Dataset, Row};
use crate::source::TabularSource;

#[derive(Debug, Parser)]
#[command(name = "tabsync", version, about = "Move tabular records between delimited files and database tables")]
pub struct Cli {
    /// Configuration file (defaults to the per-user config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log debug detail to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print a file's header and numbered rows
    Show {
        file: PathBuf,
        /// Print at most this many rows
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Load a table in the background and print it or save it to a file
    ImportDb {
        #[command(flatten)]
        db: DbArgs,
        /// Save to this file instead of printing
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Insert every row of a file into a table
    ExportDb {
        file: PathBuf,
        #[command(flatten)]
        db: DbArgs,
        /// Drop and recreate the table from the file's header first
        #[arg(long)]
        create_table: bool,
        /// Type new columns from their values instead of all text
        #[arg(long, requires = "create_table")]
        infer_types: bool,
    },
    /// Save a table as a file
    ExportFile {
        #[command(flatten)]
        db: DbArgs,
        file: PathBuf,
    },
    /// Check that a table is reachable
    Check {
        #[command(flatten)]
        db: DbArgs,
    },
    /// Remove every row from a table
    ClearTable {
        #[command(flatten)]
        db: DbArgs,
    },
    /// Change one row of a file in place
    Edit {
        file: PathBuf,
        #[command(subcommand)]
        action: EditAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum EditAction {
    /// Insert a row before INDEX (0-based, past the end appends)
    Insert {
        index: usize,
        /// Field values in header order
        #[arg(required = true)]
        values: Vec<String>,
    },
    /// Delete the row at INDEX
    Delete { index: usize },
    /// Replace the row at INDEX
    Update {
        index: usize,
        #[arg(required = true)]
        values: Vec<String>,
    },
    /// Delete every row, keeping the header
    Clear,
}

#[derive(Debug, Clone, Default, Args)]
pub struct DbArgs {
    /// Directory holding the database files (`localhost` = per-user data dir)
    #[arg(long)]
    pub host: Option<String>,
    #[arg(long)]
    pub user: Option<String>,
    #[arg(long)]
    pub password: Option<String>,
    /// Database name
    #[arg(long)]
    pub schema: Option<String>,
    #[arg(long)]
    pub table: Option<String>,
}

impl From<DbArgs> for ConnectionOverrides {
    fn from(args: DbArgs) -> Self {
        Self {
            host: args.host,
            user: args.user,
            password: args.password,
            schema: args.schema,
            table: args.table,
        }
    }
}

/// Parse arguments, set up logging, and run the selected command.
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    crate::logging::init(cli.verbose);
    let mut stdout = io::stdout().lock();
    run(cli, &mut stdout)
}

/// Run a parsed command, writing user-facing output to `out`.
pub fn run(cli: Cli, out: &mut impl Write) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    let file_options = config.file_options()?;
    let relational =
        |db: DbArgs| RelationalSource::new(config.connection(&ConnectionOverrides::from(db)));
    let mut coordinator = Coordinator::new();

    match cli.command {
        Command::Show { file, limit } => {
            let source = FileSource::with_options(&file, file_options);
            coordinator
                .load_from(&source)
                .with_context(|| format!("failed to load {}", file.display()))?;
            print_dataset(out, coordinator.dataset(), limit)?;
            writeln!(out, "Imported {} rows from {}", coordinator.rows().len(), file.display())?;
        }
        Command::ImportDb { db, out: target } => {
            let source = relational(db);
            let label = source.describe();
            if !coordinator.is_connected(&source) {
                bail!("table {label} not found or unreachable");
            }

            write!(out, "Loading data")?;
            out.flush()?;
            let dataset = spawn_load(source)
                .wait_default(|| {
                    if write!(out, ".").is_ok() {
                        let _ = out.flush();
                    }
                })
                .with_context(|| format!("failed to load {label}"))?;
            writeln!(out)?;
            coordinator.apply(dataset);

            match target {
                Some(path) => {
                    save_file(&coordinator, &path, file_options)?;
                    writeln!(out, "Saved to {}", path.display())?;
                }
                None => print_dataset(out, coordinator.dataset(), None)?,
            }
            writeln!(out, "Imported {} rows from {label}", coordinator.rows().len())?;
        }
        Command::ExportDb {
            file,
            db,
            create_table,
            infer_types,
        } => {
            let source = FileSource::with_options(&file, file_options);
            coordinator
                .load_from(&source)
                .with_context(|| format!("failed to load {}", file.display()))?;

            let target = relational(db);
            let label = target.describe();
            if create_table {
                let schema = coordinator
                    .create_table(&target, infer_types)
                    .with_context(|| format!("failed to create table {label}"))?;
                writeln!(out, "Created {label} with {} columns", schema.columns.len())?;
            }
            let inserted = coordinator
                .insert_into_db(&target)
                .with_context(|| format!("failed to insert into {label}"))?;
            writeln!(out, "Inserted {inserted} rows into {label}")?;
        }
        Command::ExportFile { db, file } => {
            let source = relational(db);
            coordinator
                .load_from_db(&source)
                .with_context(|| format!("failed to load {}", source.describe()))?;
            save_file(&coordinator, &file, file_options)?;
            writeln!(out, "Saved {} rows to {}", coordinator.rows().len(), file.display())?;
        }
        Command::Check { db } => {
            let source = relational(db);
            if !coordinator.is_connected(&source) {
                bail!("cannot reach {}", source.describe());
            }
            writeln!(out, "Connected to {}", source.describe())?;
        }
        Command::ClearTable { db } => {
            let source = relational(db);
            let deleted = coordinator
                .delete_all_records(&source)
                .with_context(|| format!("failed to clear {}", source.describe()))?;
            writeln!(out, "Deleted {deleted} rows from {}", source.describe())?;
        }
        Command::Edit { file, action } => {
            let source = FileSource::with_options(&file, file_options);
            coordinator
                .load_from(&source)
                .with_context(|| format!("failed to load {}", file.display()))?;
            let message = apply_edit(&mut coordinator, action)?;
            coordinator
                .save_to(&source)
                .with_context(|| format!("failed to save {}", file.display()))?;
            writeln!(out, "{message}")?;
        }
    }

    Ok(())
}

fn apply_edit(coordinator: &mut Coordinator, action: EditAction) -> Result<String> {
    let message = match action {
        EditAction::Insert { index, values } => {
            let message = format!("Inserted {}", format_row(&values));
            coordinator.insert_row(index, values);
            message
        }
        EditAction::Delete { index } => match coordinator.delete_row(index) {
            Some(row) => format!("Deleted {}", format_row(&row)),
            None => bail!("no row at index {index}"),
        },
        EditAction::Update { index, values } => {
            let message = format!("Updated {}", format_row(&values));
            if coordinator.update_row(index, values).is_none() {
                bail!("no row at index {index}");
            }
            message
        }
        EditAction::Clear => {
            coordinator.clear();
            "New list created.".to_string()
        }
    };
    Ok(message)
}

fn save_file(coordinator: &Coordinator, path: &Path, options: FileOptions) -> Result<()> {
    coordinator
        .save_to(&FileSource::with_options(path, options))
        .with_context(|| format!("failed to save {}", path.display()))?;
    Ok(())
}

fn print_dataset(out: &mut impl Write, dataset: &Dataset, limit: Option<usize>) -> Result<()> {
    writeln!(out, "    {}", format_row(&dataset.header))?;
    let shown = limit.unwrap_or(dataset.rows.len());
    for (idx, row) in dataset.rows.iter().take(shown).enumerate() {
        writeln!(out, "{idx:>3} {}", format_row(row))?;
    }
    if shown < dataset.rows.len() {
        writeln!(out, "    ... {} more", dataset.rows.len() - shown)?;
    }
    Ok(())
}

fn format_row(row: &Row) -> String {
    format!("[{}]", row.join(" | "))
}
