mod config;
mod telemetry;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};

use dotation_core::workflow::Worklist;
use dotation_core::{DirectorySource, ItemState, Period, PeriodKind, RemainderField, Session};

use crate::config::DotationConfig;

#[derive(Parser)]
#[command(name = "dotation")]
#[command(about = "Supply dotation tracking for care-facility services")]
#[command(long_about = "Declare what each service has left, prepare the replenishment, \
                       close services into the consumption log and export weekly or monthly totals.")]
struct Cli {
    /// Configuration file (defaults to ./dotation.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the catalog JSON files
    #[arg(long, global = true)]
    catalog_dir: Option<PathBuf>,

    /// SQLite database file
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the catalog load status
    Catalog,
    /// List products by category
    Products,
    /// List services
    Services,
    /// Show the dotation targets of a service
    Dotations { service: String },
    /// Show the remainder entry sheet of a service
    Sheet { service: String },
    /// Declare the remainder of a product (empty value clears it)
    Entry {
        service: String,
        code: String,
        value: String,
        /// Field to write; defaults to the one the product accepts
        #[arg(long, value_enum)]
        field: Option<FieldArg>,
    },
    /// Show the preparation worklist of a service
    Prep { service: String },
    /// Record the prepared amount of a product (empty value clears it)
    Prepared {
        service: String,
        code: String,
        value: String,
    },
    /// Check a product as done
    Done {
        service: String,
        code: String,
        /// Uncheck instead
        #[arg(long)]
        undo: bool,
    },
    /// Check every product with something to prepare
    CheckAll { service: String },
    /// Uncheck every product
    UncheckAll { service: String },
    /// Close a service, optionally logging what was prepared
    Close {
        service: String,
        /// Log prepared amounts to the consumption log
        #[arg(long)]
        save: bool,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Discard a service's entries without logging
    ClearEntry {
        service: String,
        #[arg(long)]
        yes: bool,
    },
    /// Consumption totals for the week or month containing a date
    Consumption {
        #[arg(long, value_enum, default_value = "week")]
        mode: ModeArg,
        /// Base date (YYYY-MM-DD), today by default
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Export the consumption log as CSV
    ExportCsv {
        /// Output file, stdout when omitted
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Wipe the consumption log
    ClearLog {
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FieldArg {
    Packs,
    Units,
}

impl From<FieldArg> for RemainderField {
    fn from(field: FieldArg) -> Self {
        match field {
            FieldArg::Packs => RemainderField::Packs,
            FieldArg::Units => RemainderField::Units,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Week,
    Month,
}

impl From<ModeArg> for PeriodKind {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Week => PeriodKind::Week,
            ModeArg::Month => PeriodKind::Month,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = DotationConfig::load(cli.config.as_deref())?;
    if let Some(dir) = cli.catalog_dir {
        config.catalog_dir = dir;
    }
    if let Some(path) = cli.database {
        config.database_path = path;
    }

    telemetry::init_telemetry(&config.log_level, config.log_json)?;

    let mut session = Session::open(&config.database_path).with_context(|| {
        format!("failed to open database {}", config.database_path.display())
    })?;
    if let Err(e) = session.reload_catalog(&DirectorySource::new(&config.catalog_dir)) {
        tracing::warn!(error = %e, "continuing without catalog");
    }

    run(&session, cli.command)
}

fn run(session: &Session, command: Commands) -> Result<()> {
    let prep = session.preparation();
    let ledger = session.ledger();

    match command {
        Commands::Catalog => {
            println!("{}", session.status());
        }
        Commands::Products => {
            for product in session.catalog().products_for_display() {
                println!(
                    "{:<12} {:<40} {:<22} carton={} pack={}",
                    product.code,
                    product.name,
                    product.tier.label(),
                    product.units_per_carton,
                    product.units_per_pack
                );
            }
        }
        Commands::Services => {
            let open = session.db().workflow_service_ids()?;
            for service in session.catalog().services() {
                let mark = if open.contains(&service.id) { "*" } else { " " };
                println!("{} {:<12} {}", mark, service.id, service.name);
            }
        }
        Commands::Dotations { service } => {
            for line in prep.dotation_sheet(&service)? {
                println!(
                    "{:>3}. {:<12} {:<40} {:>6} u  {}",
                    line.index, line.code, line.name, line.target, line.equivalent
                );
            }
        }
        Commands::Sheet { service } => {
            for line in prep.entry_sheet(&service)? {
                let remainder = line
                    .remainder
                    .count()
                    .map_or_else(|| "-".to_string(), |n| n.to_string());
                let field = match line.field {
                    RemainderField::Packs => "packs",
                    RemainderField::Units => "units",
                };
                println!(
                    "{:>3}. {:<12} {:<40} target={:<6} {}={:<6} need={}",
                    line.index, line.code, line.name, line.target, field, remainder, line.need
                );
            }
        }
        Commands::Entry {
            service,
            code,
            value,
            field,
        } => {
            let update = match field {
                Some(field) => prep.declare_remainder(&service, &code, field.into(), &value)?,
                None => prep.declare(&service, &code, &value)?,
            };
            if update.ignored {
                println!("{}: field disabled for this product, input ignored", code);
            } else {
                println!("{}: need {} u", code, update.need);
            }
        }
        Commands::Prep { service } => print_worklist(&prep.worklist(&service)?),
        Commands::Prepared {
            service,
            code,
            value,
        } => match prep.set_prepared(&service, &code, &value)? {
            Some(amount) => println!("{}: prepared {} u", code, amount),
            None => println!("{}: prepared cleared", code),
        },
        Commands::Done {
            service,
            code,
            undo,
        } => {
            let state = prep.set_done(&service, &code, !undo)?;
            println!("{}: {}", code, state_label(state));
        }
        Commands::CheckAll { service } => {
            println!("{} item(s) checked", prep.check_all(&service)?);
        }
        Commands::UncheckAll { service } => {
            println!("{} item(s) unchecked", prep.uncheck_all(&service)?);
        }
        Commands::Close { service, save, yes } => {
            let name = session.catalog().service_name(&service).to_string();
            let question = if save {
                format!("Clôturer {} et enregistrer la consommation ?", name)
            } else {
                format!("Clôturer {} sans enregistrer ?", name)
            };
            if !yes && !confirm(&question)? {
                bail!("cancelled");
            }
            let outcome = session.close_service(&service, save)?;
            println!("{}: {} entrée(s) enregistrée(s)", name, outcome.logged);
        }
        Commands::ClearEntry { service, yes } => {
            let name = session.catalog().service_name(&service).to_string();
            if !yes && !confirm(&format!("Effacer la saisie de {} ?", name))? {
                bail!("cancelled");
            }
            session.close_service(&service, false)?;
            println!("{}: saisie effacée", name);
        }
        Commands::Consumption { mode, date } => {
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            let report = ledger.report(Period::containing(mode.into(), date), &Local)?;
            println!("{}", report.label);
            if report.is_empty() {
                println!("Aucune consommation sur la période.");
                return Ok(());
            }
            println!("\nPar produit:");
            for line in &report.by_product {
                println!("  {:<12} {:<40} {:>8} u", line.key, line.name, line.total);
            }
            println!("\nPar service:");
            for line in &report.by_service {
                println!("  {:<40} {:>8} u", line.name, line.total);
            }
        }
        Commands::ExportCsv { out } => {
            let csv = ledger.export_csv(&Local)?;
            match out {
                Some(path) => {
                    std::fs::write(&path, csv)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    tracing::info!(path = %path.display(), "consumption exported");
                }
                None => println!("{}", csv),
            }
        }
        Commands::ClearLog { yes } => {
            if !yes && !confirm("Effacer tout l'historique de consommation ?")? {
                bail!("cancelled");
            }
            ledger.clear_all()?;
            println!("Historique effacé");
        }
    }

    Ok(())
}

fn print_worklist(worklist: &Worklist) {
    println!("{}", worklist.summary());
    if worklist.is_empty() {
        println!("Rien à préparer.");
        return;
    }
    for line in &worklist.lines {
        let mark = if line.done { "[x]" } else { "[ ]" };
        let prepared = line
            .prepared
            .map_or_else(|| "-".to_string(), |n| n.to_string());
        let hint = if line.hint.is_empty() {
            String::new()
        } else {
            line.hint.to_string()
        };
        println!(
            "{} {:<12} {:<40} {:>6} u {:<24} prepared={}",
            mark, line.code, line.name, line.need, hint, prepared
        );
    }
}

fn state_label(state: ItemState) -> &'static str {
    match state {
        ItemState::Undeclared => "not declared",
        ItemState::Declared => "to prepare",
        ItemState::InProgress => "in progress",
        ItemState::Done => "done",
    }
}

/// Ask a yes/no question on stdin; anything but "o"/"y" declines.
fn confirm(question: &str) -> Result<bool> {
    print!("{} [o/N] ", question);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_lowercase().as_str(),
        "o" | "oui" | "y" | "yes"
    ))
}
