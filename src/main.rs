//! Season window CLI
//!
//! Resolves NCAA Division I baseball season windows from Wikipedia and the
//! NCAA future-dates page and stores them in SQLite.

use clap::{Parser, Subcommand};
use season_dates::{Config, Result};

#[derive(Parser)]
#[command(name = "seasons")]
#[command(about = "NCAA Division I baseball season windows", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Data management commands
    Data {
        #[command(subcommand)]
        action: DataCommands,
    },
    /// List stored season windows
    Windows {
        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
    /// Show the Wikipedia infobox duration for one season
    Duration {
        /// Season year
        year: i32,
        /// Print the duration as JSON
        #[arg(long)]
        json: bool,
    },
    /// Compare finals end dates reported by Wikipedia and NCAA
    Compare {
        /// First year (default: configured first year)
        #[arg(long)]
        from: Option<i32>,
        /// Last year (default: current year)
        #[arg(long)]
        to: Option<i32>,
        /// Print the comparison rows as JSON
        #[arg(long)]
        json: bool,
    },
    /// Initialize a new project with default config
    Init,
}

#[derive(Subcommand)]
enum DataCommands {
    /// Fetch end dates, chain windows and store them
    Sync {
        /// Source: ncaa or wikipedia
        #[arg(long, default_value = "ncaa")]
        source: String,
        /// First year to consider
        #[arg(long)]
        from: Option<i32>,
        /// Last year to consider
        #[arg(long)]
        to: Option<i32>,
        /// Cache directory for HTML files
        #[arg(long)]
        cache: Option<String>,
        /// Use only cached files (no network requests)
        #[arg(long)]
        offline: bool,
        /// Keep windows already stored instead of replacing them
        #[arg(long)]
        insert_only: bool,
        /// Print the full sync report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Parse a saved HTML page without storing anything
    ParseFile {
        /// Path to the HTML file
        path: String,
        /// Source the page came from: ncaa or wikipedia
        #[arg(long)]
        source: String,
        /// Season year (required for wikipedia pages)
        #[arg(long)]
        year: Option<i32>,
    },
    /// Show database status
    Status,
}

#[derive(Clone, Debug)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use table, json, or csv.", s)),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load or create config
    let config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    let result = match cli.command {
        Commands::Data { action } => match action {
            DataCommands::Sync {
                source,
                from,
                to,
                cache,
                offline,
                insert_only,
                json,
            } => {
                let options = commands::SyncOptions {
                    from,
                    to,
                    cache,
                    offline,
                    insert_only,
                    json,
                };
                commands::data_sync(&config, &source, options)
            }
            DataCommands::ParseFile { path, source, year } => {
                commands::parse_file(&path, &source, year)
            }
            DataCommands::Status => commands::data_status(&config),
        },
        Commands::Windows { format } => commands::windows(&config, format),
        Commands::Duration { year, json } => commands::duration(&config, year, json),
        Commands::Compare { from, to, json } => commands::compare(&config, from, to, json),
        Commands::Init => commands::init(&cli.config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use season_dates::data::scrapers::ncaa::{self, NcaaFutureDatesScraper};
    use season_dates::data::scrapers::wikipedia::{self, WikipediaSeasonScraper};
    use season_dates::data::scrapers::{compare_sources, EndDateSource};
    use season_dates::data::{Database, HttpFetcher};
    use season_dates::pipeline::{self, WriteMode};
    use season_dates::season::chain_windows;
    use season_dates::{DataSource, SeasonError, SeasonWindow};
    use serde::Serialize;
    use std::ops::RangeInclusive;

    /// Flags of `data sync`
    pub struct SyncOptions {
        pub from: Option<i32>,
        pub to: Option<i32>,
        pub cache: Option<String>,
        pub offline: bool,
        pub insert_only: bool,
        pub json: bool,
    }

    fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
        let json =
            serde_json::to_string_pretty(value).map_err(|e| SeasonError::Parse(e.to_string()))?;
        println!("{}", json);
        Ok(())
    }

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        std::fs::create_dir_all("data")?;
        println!("Created data/ directory");

        println!("\nNext steps:");
        println!("  1. Edit {} to customize settings", config_path);
        println!("  2. Run 'seasons data sync' to resolve season windows");
        println!("  3. Run 'seasons windows' to list them");

        Ok(())
    }

    fn parse_source(name: &str) -> Result<DataSource> {
        DataSource::from_name(name).ok_or_else(|| {
            SeasonError::Config(format!("Unknown source: {}. Available: ncaa, wikipedia", name))
        })
    }

    fn year_range(from: Option<i32>, to: Option<i32>, default_first: i32) -> RangeInclusive<i32> {
        use chrono::Datelike;
        let first = from.unwrap_or(default_first);
        let last = to.unwrap_or_else(|| chrono::Utc::now().year());
        first..=last
    }

    pub fn data_sync(config: &Config, source: &str, options: SyncOptions) -> Result<()> {
        let SyncOptions {
            from,
            to,
            cache,
            offline,
            insert_only,
            json,
        } = options;
        let source = parse_source(source)?;
        let db = Database::open(&config.data.database_path)?;

        let mut fetcher = HttpFetcher::new(&config.scraper)?;
        if let Some(cache_dir) = cache {
            log::info!("Using cache directory: {}", cache_dir);
            fetcher = fetcher.with_cache(&cache_dir);
        }
        if offline {
            log::info!("Offline mode: using cached files only");
            fetcher = fetcher.offline_only(true);
        }

        let mode = if insert_only {
            WriteMode::InsertIfAbsent
        } else {
            WriteMode::Upsert
        };

        log::info!("Syncing from {}...", source);
        let report = match source {
            DataSource::Wikipedia => {
                let scraper = WikipediaSeasonScraper::new(fetcher, &config.sources);
                let years = year_range(from, to, config.sources.first_year);
                pipeline::run_sync(&scraper, &db, Some(years), mode)?
            }
            DataSource::Ncaa => {
                let scraper = NcaaFutureDatesScraper::new(fetcher, &config.sources);
                let years = match (from, to) {
                    (None, None) => None,
                    (from, to) => Some(from.unwrap_or(i32::MIN)..=to.unwrap_or(i32::MAX)),
                };
                pipeline::run_sync(&scraper, &db, years, mode)?
            }
        };

        if json {
            return print_json(&report);
        }

        println!("Resolved end dates for {} years", report.resolved_years());
        println!("Built {} season windows", report.windows.len());
        println!("Stored {} windows", report.store.written.len());
        if !report.store.skipped_existing.is_empty() {
            println!(
                "Skipped {} years already stored",
                report.store.skipped_existing.len()
            );
        }
        if !report.missing_years.is_empty() {
            println!("No end date found for: {:?}", report.missing_years);
        }
        for failure in report.failed_years.iter().chain(&report.store.failed) {
            println!("  {} failed: {}", failure.year, failure.message);
        }

        Ok(())
    }

    pub fn parse_file(path: &str, source: &str, year: Option<i32>) -> Result<()> {
        let html = std::fs::read_to_string(path)?;

        match parse_source(source)? {
            DataSource::Wikipedia => {
                let year = year.ok_or_else(|| {
                    SeasonError::Config("--year is required for wikipedia pages".to_string())
                })?;
                match wikipedia::parse_page(&html, year) {
                    Some(d) => println!("{}: {} to {}", d.year, d.start, d.end),
                    None => println!("No duration found for {}", year),
                }
            }
            DataSource::Ncaa => {
                let harvest = ncaa::parse_page(&html, path)?;
                println!("Finals end dates");
                println!("───────────────────────────────");
                for (year, end) in harvest.facts.iter() {
                    println!("  {}  {}", year, end);
                }
                println!("\nSeason windows");
                println!("───────────────────────────────");
                print_table(&chain_windows(&harvest.facts));
            }
        }

        Ok(())
    }

    pub fn data_status(config: &Config) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let stats = db.get_stats()?;

        println!("Database Status");
        println!("───────────────────────────────");
        println!("  Path:     {}", config.data.database_path);
        println!("  Windows:  {}", stats.window_count);
        if let (Some(first), Some(last)) = (stats.first_year, stats.last_year) {
            println!("  Years:    {} to {}", first, last);
        }

        let today = chrono::Utc::now().date_naive();
        if let Some(current) = db.window_for_date(today)? {
            println!("  Current:  {}", current);
        }

        Ok(())
    }

    pub fn windows(config: &Config, format: OutputFormat) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let windows = db.get_all_windows()?;

        match format {
            OutputFormat::Table => print_table(&windows),
            OutputFormat::Json => print_json(&windows)?,
            OutputFormat::Csv => {
                println!("year,season_start,season_end");
                for w in &windows {
                    println!("{},{},{}", w.year, w.season_start, w.season_end);
                }
            }
        }

        Ok(())
    }

    fn print_table(windows: &[SeasonWindow]) {
        if windows.is_empty() {
            println!("No season windows.");
            return;
        }
        println!("{:<6} {:<12} {:<12} {:>5}", "Year", "Start", "End", "Days");
        for w in windows {
            println!(
                "{:<6} {:<12} {:<12} {:>5}",
                w.year,
                w.season_start.to_string(),
                w.season_end.to_string(),
                w.len_days()
            );
        }
    }

    pub fn duration(config: &Config, year: i32, json: bool) -> Result<()> {
        let fetcher = HttpFetcher::new(&config.scraper)?;
        let scraper = WikipediaSeasonScraper::new(fetcher, &config.sources);

        match scraper.fetch_duration(year)? {
            Some(d) if json => print_json(&d)?,
            Some(d) => println!("{}: {} to {}", d.year, d.start, d.end),
            None => println!("No duration found at {}", scraper.season_url(year)),
        }

        Ok(())
    }

    pub fn compare(config: &Config, from: Option<i32>, to: Option<i32>, json: bool) -> Result<()> {
        let fetcher = HttpFetcher::new(&config.scraper)?;
        let years = year_range(from, to, config.sources.first_year);

        let wikipedia = WikipediaSeasonScraper::new(&fetcher, &config.sources)
            .collect_end_dates(Some(years.clone()))?;
        let ncaa = NcaaFutureDatesScraper::new(&fetcher, &config.sources)
            .collect_end_dates(Some(years))?;

        let rows = compare_sources(&wikipedia.facts, &ncaa.facts);
        if json {
            return print_json(&rows);
        }
        if rows.is_empty() {
            println!("No year is covered by both sources.");
            return Ok(());
        }

        println!("{:<6} {:<12} {:<12} {}", "Year", "Wikipedia", "NCAA", "Status");
        for row in &rows {
            let status = if row.agrees() {
                "ok".to_string()
            } else {
                format!("differs by {} days", row.difference_days())
            };
            println!(
                "{:<6} {:<12} {:<12} {}",
                row.year,
                row.first.to_string(),
                row.second.to_string(),
                status
            );
        }

        let disagreements = rows.iter().filter(|r| !r.agrees()).count();
        println!("\n{} of {} years disagree", disagreements, rows.len());

        Ok(())
    }
}
