// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
use coffee_dms::ui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use coffee_dms::{format_currency, logging, BeanRepository, Menu, StorageConfig};
use std::io;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "coffee-dms", version, about = "Coffee bean lot inventory")]
struct Cli {
    /// SQLite database file; the in-memory store is used when omitted
    #[arg(long, global = true, env = "COFFEE_DMS_DB")]
    db: Option<PathBuf>,

    /// Batch file to load before the command runs
    #[arg(long, global = true)]
    import: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Command {
    /// Numbered text menu (default)
    Menu,
    /// Full-screen form interface
    Tui,
    /// Import a batch file and print a per-line report
    Import { path: PathBuf },
    /// Print the total inventory value
    Value,
    /// Print every lot
    List,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.clone().unwrap_or(Command::Menu);

    logging::init(match command {
        Command::Menu => "warn",
        Command::Tui => "off",
        _ => "info",
    });

    let storage = StorageConfig::from_db_path(cli.db.as_deref());
    let mut repo = storage
        .open()
        .with_context(|| format!("Failed to open {}", storage.describe()))?;

    if let Some(path) = &cli.import {
        let imported = repo
            .import_file(path)
            .with_context(|| format!("Failed to import {}", path.display()))?;
        tracing::info!(count = imported.len(), path = %path.display(), "preloaded batch file");
    }

    match command {
        Command::Menu => run_menu(repo.as_mut()),
        Command::Tui => run_ui_mode(repo.as_mut()),
        Command::Import { path } => run_import(repo.as_mut(), &path),
        Command::Value => run_value(repo.as_mut()),
        Command::List => run_list(repo.as_mut()),
    }
}

fn run_menu(repo: &mut dyn BeanRepository) -> Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    Menu::new(repo, stdin.lock(), stdout.lock())
        .run()
        .context("Menu I/O failed")
}

fn run_import(repo: &mut dyn BeanRepository, path: &Path) -> Result<()> {
    let report = repo
        .import_file_report(path)
        .with_context(|| format!("Failed to import {}", path.display()))?;

    println!("✓ Imported {} bean(s) from {}", report.imported.len(), path.display());
    for skipped in &report.skipped {
        println!("  skipped line {}: {}", skipped.line_number, skipped.reason);
    }
    println!("Total inventory value: {}", format_currency(repo.total_inventory_value()?));

    Ok(())
}

fn run_value(repo: &mut dyn BeanRepository) -> Result<()> {
    let total = repo
        .total_inventory_value()
        .context("Failed to compute total inventory value")?;
    println!("Total inventory value: {}", format_currency(total));
    Ok(())
}

fn run_list(repo: &mut dyn BeanRepository) -> Result<()> {
    let lots = repo.find_all().context("Failed to load lots")?;
    if lots.is_empty() {
        println!("No beans in inventory.");
    }
    for lot in &lots {
        println!("{}", lot);
    }
    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(repo: &mut dyn BeanRepository) -> Result<()> {
    let mut app = ui::App::new(repo);
    ui::run_ui(&mut app, repo)?;

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_repo: &mut dyn BeanRepository) -> Result<()> {
    anyhow::bail!("TUI mode not available; rebuild with: cargo build --features tui")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults_to_menu() {
        let cli = Cli::try_parse_from(["coffee-dms"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.import.is_none());
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli =
            Cli::try_parse_from(["coffee-dms", "--db", "beans.db", "import", "batch.txt"]).unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("beans.db")));
        assert_eq!(
            cli.command,
            Some(Command::Import { path: PathBuf::from("batch.txt") })
        );

        let cli = Cli::try_parse_from(["coffee-dms", "value", "--import", "batch.txt"]).unwrap();
        assert_eq!(cli.command, Some(Command::Value));
        assert_eq!(cli.import, Some(PathBuf::from("batch.txt")));
    }
}
