mod collate;
mod config;
mod filter;
mod loader;
mod models;
mod options;
mod render;
mod source;
mod state;
mod tui;
mod view;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use config::Settings;
use filter::{ColumnSort, CompanyColumn, CompanyQuery, JobQuery, JobSort, Selection, SortOrder};
use models::{Company, Job, Manifest};
use options::FilterOptions;
use source::DataSource;
use state::{Board, Status};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::runtime::Runtime;
use tracing::error;
use tracing_subscriber::EnvFilter;
use view::{CompanyRow, JobCard, Links};

#[derive(Parser)]
#[command(name = "internboard")]
#[command(about = "Browse internship openings and the company directory", version)]
struct Cli {
    /// Data root: a local directory or an http(s) base URL
    #[arg(long, global = true)]
    root: Option<String>,

    /// Settings file (defaults to the per-user settings.json)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone)]
struct JobArgs {
    /// Data file from the manifest (defaults to the manifest default)
    #[arg(short, long)]
    source: Option<String>,

    /// Case-insensitive text matched against title and company name
    #[arg(short, long, default_value = "")]
    query: String,

    /// Exact tag name, or "all"
    #[arg(short, long, default_value = filter::ALL)]
    tag: Selection,

    /// Exact work condition, or "all"
    #[arg(short, long, default_value = filter::ALL)]
    working: Selection,

    /// none, salary-desc, salary-asc, quota-desc, quota-asc, name-asc, name-desc
    #[arg(long, default_value = "none")]
    sort: JobSort,
}

impl JobArgs {
    fn query(&self) -> JobQuery {
        JobQuery {
            text: self.query.clone(),
            tag: self.tag.clone(),
            working: self.working.clone(),
            sort: self.sort,
        }
    }
}

#[derive(Args, Debug, Clone)]
struct CompanyArgs {
    /// Case-insensitive text matched against names, type and province
    #[arg(short, long, default_value = "")]
    query: String,

    /// companyNameTh, companyNameEn, type or province
    #[arg(long, default_value = "companyNameTh")]
    sort_by: CompanyColumn,

    /// Sort descending
    #[arg(long)]
    desc: bool,
}

impl CompanyArgs {
    fn query(&self) -> CompanyQuery {
        CompanyQuery {
            text: self.query.clone(),
            sort: ColumnSort {
                column: self.sort_by,
                order: if self.desc { SortOrder::Desc } else { SortOrder::Asc },
            },
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List the data sources in the manifest
    Sources,

    /// List accepting job openings from one data source
    Jobs {
        #[command(flatten)]
        args: JobArgs,

        /// Number of rows to print
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show the tag and work-condition filter options of a data source
    Options {
        /// Data file from the manifest (defaults to the manifest default)
        #[arg(short, long)]
        source: Option<String>,
    },

    /// List the company directory
    Companies {
        #[command(flatten)]
        args: CompanyArgs,
    },

    /// Write a static HTML page
    Render {
        #[command(subcommand)]
        command: RenderCommands,
    },

    /// Interactive job browser
    Browse {
        /// Data file to open first (defaults to the manifest default)
        #[arg(short, long)]
        source: Option<String>,
    },

    /// Interactive company directory
    Directory,
}

#[derive(Subcommand)]
enum RenderCommands {
    /// Render the filtered job cards
    Jobs {
        #[command(flatten)]
        args: JobArgs,

        /// Output HTML file
        #[arg(short, long)]
        out: PathBuf,
    },

    /// Render the filtered company table
    Companies {
        #[command(flatten)]
        args: CompanyArgs,

        /// Output HTML file
        #[arg(short, long)]
        out: PathBuf,
    },
}

impl Commands {
    fn is_interactive(&self) -> bool {
        matches!(self, Commands::Browse { .. } | Commands::Directory)
    }
}

fn init_logging(verbose: u8, interactive: bool) -> Result<()> {
    let level = match verbose {
        0 if interactive => "info",
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if interactive {
        let path = config::log_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file: {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}

struct App {
    runtime: Runtime,
    source: Arc<dyn DataSource>,
    settings: Settings,
}

impl App {
    fn manifest(&self) -> Result<Manifest> {
        self.runtime
            .block_on(loader::load_manifest(self.source.as_ref(), &self.settings.manifest))
            .map_err(|e| {
                error!("Initialization failed: {}", e);
                anyhow!("{}\n{}", view::INIT_FAILED, e)
            })
    }

    /// Manifest index of `source`, or the manifest default.
    fn source_index(manifest: &Manifest, source: Option<&str>) -> Result<usize> {
        match source {
            None => Ok(manifest.default_index()),
            Some(name) => manifest.find(name).ok_or_else(|| {
                let known: Vec<&str> = manifest.entries.iter().map(|e| e.filename.as_str()).collect();
                anyhow!("Unknown data source '{}'. Available: {}", name, known.join(", "))
            }),
        }
    }

    /// Loads one data source. Returns the entry label and the loaded board.
    fn load_jobs(&self, source: Option<&str>) -> Result<(String, Board<Job>)> {
        let manifest = self.manifest()?;
        let entry = &manifest.entries[Self::source_index(&manifest, source)?];

        let mut board = Board::new();
        let ticket = board.begin_load(entry.filename.clone());
        let path = self.settings.feed_path(&entry.filename);
        let outcome = self.runtime.block_on(loader::load_jobs(self.source.as_ref(), &path));
        board.finish_load(ticket, outcome);
        Ok((entry.label().to_string(), board))
    }

    fn load_companies(&self) -> Board<Company> {
        let mut board = Board::new();
        let ticket = board.begin_load(self.settings.company_file.clone());
        let outcome = self.runtime.block_on(loader::load_companies(
            self.source.as_ref(),
            &self.settings.company_file,
            &self.settings.missing_type,
            &self.settings.default_province,
        ));
        board.finish_load(ticket, outcome);
        board
    }
}

fn fail_on_error(status: &Status, text: String) -> Result<()> {
    if let Status::Failed { reason, .. } = status {
        bail!("{}: {}", text, reason);
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.command.is_interactive())?;

    let mut settings = Settings::load(cli.settings.as_deref())?;
    if let Some(root) = cli.root {
        settings.data_root = root;
    }

    let runtime = Runtime::new().context("Failed to start async runtime")?;
    let source: Arc<dyn DataSource> = Arc::from(source::open(&settings.data_root, settings.timeout())?);
    let app = App { runtime, source, settings };

    match cli.command {
        Commands::Sources => {
            let manifest = app.manifest()?;
            let default = manifest.default_index();
            println!("{:<3} {:<30} {:<30}", "", "FILE", "LABEL");
            println!("{}", "-".repeat(64));
            for (i, entry) in manifest.entries.iter().enumerate() {
                println!(
                    "{:<3} {:<30} {:<30}",
                    if i == default { "*" } else { "" },
                    truncate(&entry.filename, 28),
                    truncate(entry.label(), 28)
                );
            }
            if let Some(entry) = manifest.default_entry() {
                println!("\nDefault: {}", entry.label());
            }
        }

        Commands::Jobs { args, limit } => {
            let (label, board) = app.load_jobs(args.source.as_deref())?;
            let query = args.query();
            let jobs = filter::filter_jobs(board.records(), &query);
            let status = board.status(jobs.len());
            fail_on_error(&status, view::job_status_text(&status))?;

            println!("{}", label);
            if !jobs.is_empty() {
                let links = Links::new(&app.settings);
                println!("{:<32} {:<26} {:>18} {:<30}", "TITLE", "COMPANY", "PAY", "DETAILS");
                println!("{}", "-".repeat(109));
                for job in jobs.iter().take(limit.unwrap_or(usize::MAX)) {
                    let card = JobCard::from_job(job, &links, 0);
                    println!(
                        "{:<32} {:<26} {:>18} {:<30}",
                        truncate(&card.title, 30),
                        truncate(&card.company_name, 24),
                        truncate(&card.pay_text(), 18),
                        truncate(&card.meta_text(), 30)
                    );
                }
            }
            println!("\n{}", view::job_status_text(&status));
        }

        Commands::Options { source } => {
            let (label, board) = app.load_jobs(source.as_deref())?;
            let status = board.status(board.records().len());
            fail_on_error(&status, view::job_status_text(&status))?;

            let options = FilterOptions::from_jobs(board.records(), app.settings.tag_label_max);
            println!("{}", label);
            println!("\nTags ({}):", options.tags.len() - 1);
            for option in &options.tags {
                println!("  {}", option.label);
            }
            println!("\nWork conditions ({}):", options.working.len() - 1);
            for option in &options.working {
                println!("  {}", option.label);
            }
        }

        Commands::Companies { args } => {
            let board = app.load_companies();
            let query = args.query();
            let companies = filter::filter_companies(board.records(), &query);
            let status = board.status(companies.len());
            let searching = !query.text.trim().is_empty();
            fail_on_error(&status, view::company_status_text(&status, searching))?;

            if !companies.is_empty() {
                println!("{:<30} {:<30} {:<14} {:<16}", "NAME (TH)", "NAME (EN)", "TYPE", "PROVINCE");
                println!("{}", "-".repeat(93));
                for row in companies.into_iter().map(CompanyRow::from_company) {
                    println!(
                        "{:<30} {:<30} {:<14} {:<16}",
                        truncate(&row.name_th, 28),
                        truncate(&row.name_en, 28),
                        truncate(&row.kind, 12),
                        truncate(&row.province, 14)
                    );
                }
            }
            println!("\n{}", view::company_status_text(&status, searching));
        }

        Commands::Render { command } => match command {
            RenderCommands::Jobs { args, out } => {
                let (label, board) = app.load_jobs(args.source.as_deref())?;
                let query = args.query();
                let options = FilterOptions::from_jobs(board.records(), app.settings.tag_label_max);
                let links = Links::new(&app.settings);
                let cards: Vec<JobCard> = filter::filter_jobs(board.records(), &query)
                    .into_iter()
                    .map(|j| JobCard::from_job(j, &links, app.settings.card_tag_limit))
                    .collect();
                let status = board.status(cards.len());

                let html = render::render_jobs(&label, &status, &query, &options, &cards)?;
                render::write_page(&out, &html)?;
                println!("Rendered {} job card(s) to {}", cards.len(), out.display());
            }
            RenderCommands::Companies { args, out } => {
                let board = app.load_companies();
                let query = args.query();
                let rows: Vec<CompanyRow> = filter::filter_companies(board.records(), &query)
                    .into_iter()
                    .map(CompanyRow::from_company)
                    .collect();
                let status = board.status(rows.len());

                let html = render::render_companies("Company Directory", &status, &query, &rows)?;
                render::write_page(&out, &html)?;
                println!("Rendered {} company row(s) to {}", rows.len(), out.display());
            }
        },

        Commands::Browse { source } => {
            let manifest = app.manifest()?;
            let index = App::source_index(&manifest, source.as_deref())?;
            tui::run_browse(
                app.runtime.handle().clone(),
                app.source.clone(),
                &app.settings,
                manifest,
                index,
            )?;
        }

        Commands::Directory => {
            tui::run_directory(app.runtime.handle().clone(), app.source.clone(), &app.settings)?;
        }
    }

    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
