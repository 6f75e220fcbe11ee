//! resplan CLI - Resource Planning & Margin Engine
//!
//! Command-line interface for creating workbooks, editing the week timeline,
//! pricing roles and rendering planning reports.

mod exit_codes;
mod workbook_io;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use resplan_core::{
    resource_stats, Currency, ExchangeRate, Project, Region, Renderer, ResourceListEntry,
    SheetError, Workbook,
};
use resplan_engine::{auto_price_from_margin, PlanningSheet, WeekTimeline};
use resplan_render::{format_money, ExcelRenderer, TextRenderer};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use exit_codes::ExitCode;

#[derive(Parser)]
#[command(name = "resplan")]
#[command(author, version, about = "Resource planning and margin engine", long_about = None)]
struct Cli {
    /// Verbose output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a workbook with the default project settings
    Init {
        /// Workbook path (.json or .toml)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Project name
        #[arg(long)]
        name: Option<String>,

        /// Client currency (USD, EUR, GBP)
        #[arg(long)]
        currency: Option<String>,

        /// Units of client currency per USD
        #[arg(long)]
        exchange_rate: Option<f64>,

        /// Number of week columns
        #[arg(long, default_value_t = 1)]
        weeks: u32,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Compute and print the planning report
    Report {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = ReportFormat::Text, env = "RESPLAN_FORMAT")]
        format: ReportFormat,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export the planning table and rate card to Excel
    Export {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output .xlsx path
        #[arg(short, long)]
        output: PathBuf,

        /// Write static totals instead of SUM formulas
        #[arg(long)]
        static_values: bool,
    },

    /// Insert, remove or append week columns
    Week {
        #[command(subcommand)]
        action: WeekAction,
    },

    /// Client hourly rate that achieves a target margin
    Price {
        /// Internal hourly cost in USD
        #[arg(long)]
        rate: f64,

        /// Target margin percent (defaults to the workbook's default margin)
        #[arg(long)]
        margin: Option<f64>,

        /// Units of client currency per USD (defaults to the workbook's rate)
        #[arg(long)]
        exchange_rate: Option<f64>,

        /// Client currency (defaults to the workbook's currency)
        #[arg(long)]
        currency: Option<String>,

        /// Workbook to read project settings from
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Show the resource list, optionally seeding it from the rate card
    Resources {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Add every rate card role not yet listed, priced for this region
        #[arg(long, value_name = "REGION")]
        seed: Option<String>,

        /// Write the updated workbook here instead of in place
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum WeekAction {
    /// Insert an empty week after POSITION (0 inserts before week 1)
    Insert {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[arg(long, value_name = "POSITION")]
        at: u32,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Remove a week and shift later weeks down
    Remove {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[arg(value_name = "WEEK")]
        week: u32,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Add an empty week at the end
    Append {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let code = match run(cli.command) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::Failure
        }
    };
    code.into()
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn run(command: Option<Commands>) -> Result<ExitCode> {
    match command {
        Some(Commands::Init {
            file,
            name,
            currency,
            exchange_rate,
            weeks,
            force,
        }) => cmd_init(&file, name, currency.as_deref(), exchange_rate, weeks, force),
        Some(Commands::Report { file, format, output }) => cmd_report(&file, format, output.as_deref()),
        Some(Commands::Export {
            file,
            output,
            static_values,
        }) => cmd_export(&file, &output, static_values),
        Some(Commands::Week { action }) => cmd_week(action),
        Some(Commands::Price {
            rate,
            margin,
            exchange_rate,
            currency,
            file,
        }) => cmd_price(rate, margin, exchange_rate, currency.as_deref(), file.as_deref()),
        Some(Commands::Resources { file, seed, output }) => {
            cmd_resources(&file, seed.as_deref(), output.as_deref())
        }
        None => {
            println!("resplan - Resource Planning & Margin Engine");
            println!("Run with --help for usage information");
            Ok(ExitCode::Success)
        }
    }
}

fn cmd_init(
    file: &Path,
    name: Option<String>,
    currency: Option<&str>,
    exchange_rate: Option<f64>,
    weeks: u32,
    force: bool,
) -> Result<ExitCode> {
    if file.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", file.display());
    }

    let mut project = Project::default();
    if let Some(name) = name {
        project.name = name;
    }
    if let Some(code) = currency {
        project.client_currency = code.parse()?;
    }
    match exchange_rate {
        Some(rate) => project.exchange_rate = ExchangeRate::new(rate)?,
        None if project.client_currency == Currency::Usd => project.exchange_rate = ExchangeRate::PARITY,
        None if project.client_currency != Project::default().client_currency => warn!(
            currency = %project.client_currency,
            rate = project.exchange_rate.value(),
            "no --exchange-rate given, keeping the default rate"
        ),
        None => {}
    }

    let workbook = Workbook {
        project,
        weeks: WeekTimeline::new(weeks).week_count(),
        ..Workbook::default()
    };
    workbook_io::save(file, &workbook)?;
    info!(path = %file.display(), "created workbook");
    println!("Created: {}", file.display());
    Ok(ExitCode::Success)
}

fn cmd_report(file: &Path, format: ReportFormat, output: Option<&Path>) -> Result<ExitCode> {
    let workbook = workbook_io::load(file)?;
    let sheet = PlanningSheet::from_workbook(workbook);
    let report = sheet.report().context("Failed to compute report")?;

    let rendered = match format {
        ReportFormat::Text => TextRenderer::new().render(&sheet.to_workbook(), &report)?,
        ReportFormat::Json => {
            let mut json = serde_json::to_string_pretty(&report)?;
            json.push('\n');
            json
        }
    };

    match output {
        Some(path) => {
            fs::write(path, rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Report written to: {}", path.display());
        }
        None => print!("{rendered}"),
    }
    Ok(ExitCode::Success)
}

fn cmd_export(file: &Path, output: &Path, static_values: bool) -> Result<ExitCode> {
    let workbook = workbook_io::load(file)?;
    let sheet = PlanningSheet::from_workbook(workbook);
    let report = sheet.report().context("Failed to compute report")?;

    let mut renderer = ExcelRenderer::new();
    if static_values {
        renderer = renderer.static_values();
    }
    let bytes = renderer.render(&sheet.to_workbook(), &report)?;
    fs::write(output, bytes).with_context(|| format!("Failed to write {}", output.display()))?;
    println!("Exported: {}", output.display());
    Ok(ExitCode::Success)
}

fn cmd_week(action: WeekAction) -> Result<ExitCode> {
    let (file, output) = match &action {
        WeekAction::Insert { file, output, .. }
        | WeekAction::Remove { file, output, .. }
        | WeekAction::Append { file, output } => (file.clone(), output.clone()),
    };
    let mut sheet = PlanningSheet::from_workbook(workbook_io::load(&file)?);

    let edited = match action {
        WeekAction::Insert { at, .. } => sheet.insert_week_at(at).map(|t| t.week_count()),
        WeekAction::Remove { week, .. } => sheet.remove_week(week).map(|t| t.week_count()),
        WeekAction::Append { .. } => sheet.append_week().map(|t| t.week_count()),
    };

    let weeks = match edited {
        Ok(weeks) => weeks,
        Err(SheetError::Timeline(err)) if err.is_declined() => {
            eprintln!("declined: {err}");
            return Ok(ExitCode::Declined);
        }
        Err(err) => return Err(err.into()),
    };

    let target = output.unwrap_or(file);
    workbook_io::save(&target, &sheet.to_workbook())?;
    debug!(weeks, path = %target.display(), "week edit committed");
    println!("Weeks: {weeks}");
    Ok(ExitCode::Success)
}

fn cmd_price(
    rate: f64,
    margin: Option<f64>,
    exchange_rate: Option<f64>,
    currency: Option<&str>,
    file: Option<&Path>,
) -> Result<ExitCode> {
    let project = match file {
        Some(path) => workbook_io::load(path)?.project,
        None => Project::new("ad hoc"),
    };

    let currency: Currency = match currency {
        Some(code) => code.parse()?,
        None => project.client_currency,
    };
    let exchange_rate = match exchange_rate {
        Some(r) => ExchangeRate::new(r)?,
        None => project.exchange_rate,
    };
    let margin = margin.unwrap_or(project.default_margin);

    let client_rate = auto_price_from_margin(rate, margin, exchange_rate)?;
    println!(
        "Client rate: {}/h ({:.1}% margin on {}/h at {} {} per USD)",
        format_money(client_rate, currency.symbol()),
        margin.max(0.0),
        format_money(rate, "$"),
        exchange_rate.value(),
        currency,
    );
    Ok(ExitCode::Success)
}

fn cmd_resources(file: &Path, seed: Option<&str>, output: Option<&Path>) -> Result<ExitCode> {
    let mut workbook = workbook_io::load(file)?;

    if let Some(region) = seed {
        let region: Region = region.parse()?;
        let mut added = 0usize;
        for card in &workbook.rate_cards {
            if workbook.resources.iter().any(|r| r.role == card.role) {
                continue;
            }
            workbook
                .resources
                .push(ResourceListEntry::from_rate_card(card, region));
            added += 1;
        }
        let target = output.unwrap_or(file);
        workbook_io::save(target, &workbook)?;
        println!("Added {added} resource(s) priced for {region}");
    }

    for entry in &workbook.resources {
        println!(
            "{:<30} {:>10}/h {:>10}/d  {}",
            entry.role,
            format_money(entry.int_rate, "$"),
            format_money(entry.daily_rate(), "$"),
            entry.name.as_deref().unwrap_or("")
        );
    }
    let stats = resource_stats(&workbook.resources);
    println!(
        "{} resource(s), average rate {}/h",
        stats.count,
        format_money(stats.average_rate, "$")
    );
    Ok(ExitCode::Success)
}
