use std::future::Future;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Local, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use sqlx::mysql::MySqlPoolOptions;
use sqlx::MySqlPool;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod aggregate;
mod cache;
mod config;
mod db;
mod error;
mod export;
mod filter;
mod models;
mod report;

use crate::aggregate::Visualisation;
use crate::cache::TableCache;
use crate::config::Config;
use crate::filter::{FilterCriteria, FilterOptions, StatusFilter};
use crate::models::StudentTable;

#[derive(Parser)]
#[command(name = "placement-eligibility")]
#[command(about = "Shortlist, visualise and export student placement records", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TableFormat {
    Table,
    Json,
    Csv,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ReportFormat {
    Markdown,
    Json,
}

/// One line of an interactive session, parsed without a binary name.
#[derive(Parser)]
#[command(name = "placement-eligibility", no_binary_name = true)]
struct SessionLine {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read commands from stdin, reusing the loaded table until it expires
    Interactive,
    /// Summarise the loaded records
    Overview,
    /// List the departments, genders and cities available for filtering
    Options {
        #[arg(long)]
        json: bool,
    },
    /// Shortlist students matching every given criterion
    Filter {
        #[arg(long)]
        department: Option<String>,
        #[arg(long)]
        gender: Option<String>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long, value_enum, default_value_t = StatusFilter::Any)]
        status: StatusFilter,
        #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=10))]
        min_communication: u8,
        #[arg(long, default_value_t = 0.0, value_parser = parse_min_package)]
        min_package: f64,
        #[arg(long, value_enum, default_value_t = TableFormat::Table)]
        format: TableFormat,
        /// Write the shortlist as CSV to this path
        #[arg(long)]
        out: Option<PathBuf>,
        /// Write the shortlist as CSV into the export directory
        #[arg(long, conflicts_with = "out")]
        export: bool,
    },
    /// Summarise placement status, batches, skills and cities
    Visualize {
        #[arg(long, value_enum, default_value_t = ReportFormat::Markdown)]
        format: ReportFormat,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Export every loaded record to a timestamped CSV file
    Export {
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

fn parse_min_package(raw: &str) -> Result<f64, String> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("{raw:?} is not a number"))?;
    if (0.0..=20.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("minimum package must be between 0 and 20 LPA, got {value}"))
    }
}

async fn load_table(pool: &MySqlPool, cache: &TableCache) -> anyhow::Result<Arc<StudentTable>> {
    let table = cache
        .get_or_load(Utc::now(), || db::load_records(pool))
        .await
        .context("could not load student records")?;
    Ok(table)
}

/// Splits a session line into words; single or double quotes group words.
fn split_command_line(line: &str) -> Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;

    for ch in line.chars() {
        match quote {
            Some(open) if ch == open => quote = None,
            Some(_) => current.push(ch),
            None if ch == '"' || ch == '\'' => {
                quote = Some(ch);
                in_word = true;
            }
            None if ch.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            None => {
                current.push(ch);
                in_word = true;
            }
        }
    }

    if let Some(open) = quote {
        return Err(format!("unterminated {open} quote"));
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

/// Reads one command per line from `input` until EOF or `quit`. Every command
/// goes through `cache`, so the table is reloaded only once it has expired.
/// Bad lines and failed loads are reported on `out` and the session goes on.
async fn run_session<R, W, F, Fut>(
    input: R,
    out: &mut W,
    cache: &TableCache,
    config: &Config,
    now: impl Fn() -> DateTime<Utc>,
    load: F,
) -> anyhow::Result<usize>
where
    R: BufRead,
    W: Write,
    F: Fn() -> Fut,
    Fut: Future<Output = error::Result<StudentTable>>,
{
    let mut executed = 0usize;

    for line in input.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" || line == "exit" {
            break;
        }

        let words = match split_command_line(line) {
            Ok(words) => words,
            Err(message) => {
                writeln!(out, "error: {message}")?;
                continue;
            }
        };
        let command = match SessionLine::try_parse_from(words) {
            Ok(parsed) => parsed.command,
            Err(err) => {
                write!(out, "{err}")?;
                continue;
            }
        };

        let table = match cache.get_or_load(now(), &load).await {
            Ok(table) => table,
            Err(err) => {
                warn!("{err}");
                writeln!(out, "error: {err}")?;
                continue;
            }
        };

        if let Err(err) = execute(command, &table, config, out) {
            writeln!(out, "error: {err:#}")?;
            continue;
        }
        out.flush()?;
        executed += 1;
    }

    Ok(executed)
}

fn execute(
    command: Commands,
    table: &StudentTable,
    config: &Config,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    match command {
        Commands::Interactive => anyhow::bail!("already in an interactive session"),
        Commands::Overview => {
            write!(out, "{}", report::build_overview(table))?;
        }
        Commands::Options { json } => {
            let options = FilterOptions::from_table(table);
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&options)?)?;
            } else {
                writeln!(out, "Departments: All, {}", options.departments.join(", "))?;
                writeln!(out, "Genders: All, {}", options.genders.join(", "))?;
                writeln!(out, "Cities: All, {}", options.cities.join(", "))?;
                writeln!(out, "Placement status: All, Placed, Not Placed")?;
            }
        }
        Commands::Filter {
            department,
            gender,
            city,
            status,
            min_communication,
            min_package,
            format,
            out: target,
            export,
        } => {
            let criteria = FilterCriteria {
                department: filter::selection(department),
                gender: filter::selection(gender),
                city: filter::selection(city),
                status,
                min_communication,
                min_package,
            };
            info!(criteria = %report::describe_criteria(&criteria), "applying filters");
            let shortlist = filter::apply(table, &criteria);
            info!("{} students found.", shortlist.len());

            match format {
                TableFormat::Table => {
                    writeln!(out, "{} students found.", shortlist.len())?;
                    write!(out, "{}", report::render_table(&shortlist))?;
                }
                TableFormat::Json => {
                    writeln!(out, "{}", serde_json::to_string_pretty(&shortlist)?)?
                }
                TableFormat::Csv => {
                    let data = export::to_delimited_text(&shortlist)?;
                    out.write_all(&data)?;
                }
            }

            let target = match (target, export) {
                (Some(path), _) => Some(path),
                (None, true) => Some(config.export_dir.join(export::SHORTLIST_FILE_NAME)),
                (None, false) => None,
            };
            if let Some(path) = target {
                let written = export::write_table(&shortlist, &path)?;
                eprintln!("Shortlist written to {}.", written.display());
            }
        }
        Commands::Visualize { format, out: target } => {
            let visualisation = Visualisation::from_table(table);
            let rendered = match format {
                ReportFormat::Markdown => report::build_visualisation_report(&visualisation),
                ReportFormat::Json => serde_json::to_string_pretty(&visualisation)?,
            };
            match target {
                Some(path) => {
                    std::fs::write(&path, rendered)
                        .with_context(|| format!("failed writing {}", path.display()))?;
                    eprintln!("Visualisation written to {}.", path.display());
                }
                None => writeln!(out, "{rendered}")?,
            }
        }
        Commands::Export { dir } => {
            let dir = dir.unwrap_or_else(|| config.export_dir.clone());
            let file_name = export::timestamped_file_name(Local::now().naive_local());
            let written = export::write_table(table, &dir.join(file_name))?;
            writeln!(out, "Exported {} rows to {}.", table.len(), written.display())?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let pool = MySqlPoolOptions::new()
        .max_connections(1)
        .connect(&config.database_url)
        .await
        .map_err(|err| error::Error::data_source("failed to connect to MySQL", err))?;
    let cache = TableCache::new(config.cache_ttl);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Interactive => {
            let stdin = std::io::stdin();
            let executed = run_session(stdin.lock(), &mut out, &cache, &config, Utc::now, || {
                db::load_records(&pool)
            })
            .await?;
            info!(commands = executed, "interactive session ended");
        }
        command => {
            let table = load_table(&pool, &cache).await?;
            execute(command, &table, &config, &mut out)?;
        }
    }

    Ok(())
}
