mod collector;
mod config;
mod discover;
mod fetch;
mod parser;
mod store;

use std::fmt::Write as _;
use std::fs;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use chrono::{DateTime, Local};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use discover::UrlFilter;
use fetch::{HttpFetcher, PageFetcher};

/// Typed answer `clean` expects before deleting anything.
const CLEAN_CONFIRMATION: &str = "CONFIRMAR";

#[derive(Parser)]
#[command(name = "sadia_scraper", about = "Sadia product catalog nutrition scraper")]
struct Cli {
    /// Directory holding the URL list and the CSV output
    #[arg(long, global = true, env = "SADIA_DATA_DIR", default_value = config::DATA_DIR)]
    data_dir: PathBuf,

    /// Per-request timeout in seconds
    #[arg(long, global = true, default_value_t = config::REQUEST_TIMEOUT.as_secs())]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Pacing {
    /// Pause between requests in milliseconds (default: 3000 per category, 2000 per product)
    #[arg(long)]
    delay_ms: Option<u64>,
}

impl Pacing {
    fn delay_or(&self, default: Duration) -> Duration {
        self.delay_ms.map(Duration::from_millis).unwrap_or(default)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Collect product URLs from every category listing
    Discover {
        /// URL list to write (default: <data-dir>/urls_produtos.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        pacing: Pacing,
    },
    /// Extract nutrition facts for every URL in the list
    Extract {
        /// URL list to read (default: <data-dir>/urls_produtos.json)
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// CSV to write (default: <data-dir>/produtos_sadia.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Max products to extract
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        #[command(flatten)]
        pacing: Pacing,
    },
    /// Discover + extract in one go
    Run {
        /// Max products to extract
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        #[command(flatten)]
        pacing: Pacing,
    },
    /// Extract a single product page and print the record
    Page { url: String },
    /// Save the raw HTML of a page
    FetchHtml {
        #[arg(env = "URL_ALVO")]
        url: String,
        /// File to write (default: <data-dir>/pagina_<timestamp>.html)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Summarize collected URLs and extracted data
    Stats,
    /// List the JSON and CSV files in the data directory
    Files,
    /// Delete the JSON and CSV files in the data directory
    Clean {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let urls_path = cli.data_dir.join(config::URLS_FILE);
    let csv_path = cli.data_dir.join(config::PRODUCTS_FILE);
    let timeout = Duration::from_secs(cli.timeout_secs);
    let http = || HttpFetcher::new(timeout).context("Failed to build HTTP client");

    let result = match cli.command {
        Commands::Discover { output, pacing } => {
            let output = output.unwrap_or(urls_path);
            discover_to_file(&http()?, &output, pacing.delay_or(config::CATEGORY_DELAY))
                .await
                .map(|_| ())
        }
        Commands::Extract {
            input,
            output,
            limit,
            pacing,
        } => {
            let urls = load_or_fallback(&input.unwrap_or(urls_path));
            let output = output.unwrap_or(csv_path);
            extract_to_file(&http()?, urls, limit, &output, pacing.delay_or(config::PRODUCT_DELAY)).await
        }
        Commands::Run { limit, pacing } => {
            let fetcher = http()?;
            let t_discover = Instant::now();
            let urls =
                discover_to_file(&fetcher, &urls_path, pacing.delay_or(config::CATEGORY_DELAY)).await?;
            println!("Discovery took {}", format_duration(t_discover.elapsed()));
            extract_to_file(&fetcher, urls, limit, &csv_path, pacing.delay_or(config::PRODUCT_DELAY)).await
        }
        Commands::Page { url } => {
            let html = http()?.fetch(&url).await?;
            let record = parser::process_page(&url, &html);
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
        Commands::FetchHtml { url, output } => {
            let html = http()?.fetch(&url).await?;
            let output = output.unwrap_or_else(|| {
                cli.data_dir
                    .join(format!("pagina_{}.html", chrono::Utc::now().timestamp()))
            });
            if let Some(dir) = output.parent().filter(|d| !d.as_os_str().is_empty()) {
                fs::create_dir_all(dir)?;
            }
            fs::write(&output, &html)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("Saved {} characters to {}", html.chars().count(), output.display());
            Ok(())
        }
        Commands::Stats => stats_report(&cli.data_dir, &urls_path, &csv_path).map(|r| print!("{r}")),
        Commands::Files => print_files(&cli.data_dir),
        Commands::Clean { yes } => {
            clean_data_dir(&cli.data_dir, yes, io::stdin().lock()).map(|n| println!("Removed {n} files"))
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

async fn discover_to_file<F: PageFetcher>(
    fetcher: &F,
    output: &Path,
    delay: Duration,
) -> anyhow::Result<Vec<String>> {
    println!("Collecting product URLs from {} categories...", config::CATEGORIES.len());
    let urls =
        discover::collect_catalog(fetcher, config::CATEGORIES, &UrlFilter::default(), delay).await;

    print!("{}", category_lines(urls.iter().map(String::as_str)));
    store::save_urls(output, &urls)?;
    println!("Saved {} URLs to {}", urls.len(), output.display());
    Ok(urls.into_iter().collect())
}

async fn extract_to_file<F: PageFetcher>(
    fetcher: &F,
    mut urls: Vec<String>,
    limit: Option<usize>,
    output: &Path,
    delay: Duration,
) -> anyhow::Result<()> {
    if let Some(n) = limit {
        urls.truncate(n);
    }
    println!("Extracting {} products...", urls.len());
    let records = collector::collect_products(fetcher, &urls, delay).await;
    if records.is_empty() {
        bail!("No product could be extracted from {} URLs", urls.len());
    }
    store::save_products(output, &records)?;
    println!(
        "Saved {} products ({} skipped) to {}",
        records.len(),
        urls.len() - records.len(),
        output.display()
    );
    Ok(())
}

/// URL list from disk, or the built-in sample when it is missing or unreadable.
fn load_or_fallback(path: &Path) -> Vec<String> {
    if path.exists() {
        match store::load_urls(path) {
            Ok(urls) => {
                info!("Loaded {} URLs from {}", urls.len(), path.display());
                return urls;
            }
            Err(e) => warn!("{:#}; using built-in URL list", e),
        }
    } else {
        warn!("{} not found; using built-in URL list", path.display());
    }
    config::FALLBACK_PRODUCT_URLS.iter().map(|u| u.to_string()).collect()
}

fn category_lines<'a>(urls: impl IntoIterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for (category, count) in discover::count_by_category(urls) {
        let _ = writeln!(out, "  {:<20} {:>5}", category, count);
    }
    out
}

fn stats_report(data_dir: &Path, urls_path: &Path, csv_path: &Path) -> anyhow::Result<String> {
    let mut out = String::new();

    match store::load_urls(urls_path) {
        Ok(urls) => {
            writeln!(out, "URLs collected: {}", urls.len())?;
            out.push_str(&category_lines(urls.iter().map(String::as_str)));
        }
        Err(_) if !urls_path.exists() => {
            writeln!(out, "URLs collected: - (no {})", urls_path.display())?
        }
        Err(e) => writeln!(out, "URLs collected: error: {:#}", e)?,
    }

    match store::summarize_products(csv_path) {
        Ok(summary) => {
            writeln!(out, "\nProducts extracted: {}", summary.rows)?;
            for (category, count) in summary.by_category.iter().take(5) {
                writeln!(out, "  {:<20} {:>5}", category, count)?;
            }
        }
        Err(_) if !csv_path.exists() => {
            writeln!(out, "\nProducts extracted: - (no {})", csv_path.display())?
        }
        Err(e) => writeln!(out, "\nProducts extracted: error: {:#}", e)?,
    }

    if data_dir.is_dir() {
        let mut total = 0u64;
        for entry in fs::read_dir(data_dir)? {
            let meta = entry?.metadata()?;
            if meta.is_file() {
                total += meta.len();
            }
        }
        writeln!(out, "\nData dir {}: {}", data_dir.display(), format_size(total))?;
    }
    Ok(out)
}

/// A JSON or CSV output file found in the data directory.
struct DataFile {
    path: PathBuf,
    kind: &'static str,
    size: u64,
    modified: DateTime<Local>,
}

/// JSON and CSV files in `dir`, newest name first. A missing dir is empty.
fn data_files(dir: &Path) -> anyhow::Result<Vec<DataFile>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))? {
        let entry = entry?;
        let path = entry.path();
        let kind = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => "URLs",
            Some("csv") => "data",
            _ => continue,
        };
        let meta = entry.metadata()?;
        if !meta.is_file() {
            continue;
        }
        files.push(DataFile {
            path,
            kind,
            size: meta.len(),
            modified: meta.modified()?.into(),
        });
    }
    files.sort_by(|a, b| b.path.cmp(&a.path));
    Ok(files)
}

fn print_files(dir: &Path) -> anyhow::Result<()> {
    let files = data_files(dir)?;
    if files.is_empty() {
        println!("No JSON/CSV files in {}", dir.display());
        return Ok(());
    }
    println!("{} files in {}", files.len(), dir.display());
    for (i, f) in files.iter().enumerate() {
        let name = f.path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        println!(
            "{:>2}. {:<32} {:<5} {}  {:>9}",
            i + 1,
            name,
            f.kind,
            f.modified.format("%d/%m/%Y %H:%M:%S"),
            format_size(f.size)
        );
    }
    Ok(())
}

/// Delete the data files. Without `yes`, reads one line from `answer` and
/// only proceeds when it is exactly the confirmation word. Returns the count removed.
fn clean_data_dir(dir: &Path, yes: bool, mut answer: impl BufRead) -> anyhow::Result<usize> {
    let files = data_files(dir)?;
    if files.is_empty() {
        println!("Nothing to clean in {}", dir.display());
        return Ok(0);
    }

    if !yes {
        println!("About to delete {} files (cannot be undone):", files.len());
        for f in &files {
            println!("  {}", f.path.display());
        }
        println!("Type {CLEAN_CONFIRMATION} to proceed:");
        let mut line = String::new();
        answer.read_line(&mut line)?;
        if line.trim() != CLEAN_CONFIRMATION {
            println!("Cancelled");
            return Ok(0);
        }
    }

    for f in &files {
        fs::remove_file(&f.path).with_context(|| format!("Failed to remove {}", f.path.display()))?;
    }
    info!("Removed {} files from {}", files.len(), dir.display());
    Ok(files.len())
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    match bytes {
        b if b < KB => format!("{} B", b),
        b if b < KB * KB => format!("{:.1} KB", b as f64 / KB as f64),
        b => format!("{:.1} MB", b as f64 / (KB * KB) as f64),
    }
}

fn format_duration(d: Duration) -> String {
    match d.as_secs() {
        s if s < 60 => format!("{:.1}s", d.as_secs_f64()),
        s => format!("{}m {:02}s", s / 60, s % 60),
    }
}
