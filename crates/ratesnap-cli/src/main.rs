use std::path::{Path, PathBuf};
use std::process;
use std::str::FromStr;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use ratesnap::config::{
    Config, ConfigError, DEFAULT_SOFR_HEADING, DEFAULT_TREASURY_HEADING, ENDPOINT_URL_VAR,
    Headings, PAGE_URL_VAR, TOKEN_VAR, VERBOSE_VAR,
};
use ratesnap::payload::Payload;
use ratesnap::pipeline::{RunError, collect, extract_html, run, run_html};
use ratesnap::scraper::WebScraper;
use ratesnap::types::SchemaVersion;

#[derive(Parser)]
#[command(name = "ratesnap")]
#[command(about = "Treasury yield and SOFR rate card extractor", long_about = None)]
struct Cli {
    #[arg(
        short = 'l',
        long = "log-level",
        value_enum,
        default_value = "info",
        global = true,
        help = "Set the logging level"
    )]
    log_level: LogLevel,

    #[arg(
        short = 'v',
        long,
        env = VERBOSE_VAR,
        global = true,
        help = "Log at least at debug level and print the extracted payload"
    )]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Args)]
struct ExtractArgs {
    #[arg(
        long,
        default_value = "full",
        value_parser = parse_schema,
        help = "Payload shape: 'full' (three columns per key) or 'latest' (one number per key)"
    )]
    schema: SchemaVersion,

    #[arg(
        long,
        default_value = DEFAULT_TREASURY_HEADING,
        help = "Visible heading of the Treasury card"
    )]
    treasury_heading: String,

    #[arg(
        long,
        default_value = DEFAULT_SOFR_HEADING,
        help = "Visible heading of the SOFR card"
    )]
    sofr_heading: String,

    #[arg(
        long,
        value_name = "SECONDS",
        default_value_t = 60,
        help = "Timeout for loading the rates page"
    )]
    page_timeout: u64,
}

impl ExtractArgs {
    fn headings(&self) -> Headings {
        Headings {
            treasury: self.treasury_heading.clone(),
            sofr: self.sofr_heading.clone(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the rates page, validate both datasets and deliver the payload
    Run {
        #[arg(long, env = PAGE_URL_VAR, help = "Address of the rendered rates page")]
        page_url: Option<String>,

        #[arg(
            long,
            value_name = "PATH",
            help = "Deliver from a saved, fully rendered HTML snapshot instead of fetching"
        )]
        html_file: Option<PathBuf>,

        #[arg(long, env = ENDPOINT_URL_VAR, help = "Ingestion endpoint to POST the payload to")]
        endpoint_url: Option<String>,

        #[arg(
            long,
            env = TOKEN_VAR,
            hide_env_values = true,
            help = "Bearer token for the ingestion endpoint"
        )]
        token: Option<String>,

        #[arg(
            long,
            value_name = "SECONDS",
            default_value_t = 30,
            help = "Timeout for the delivery request"
        )]
        delivery_timeout: u64,

        #[arg(long, help = "Print the payload as JSON instead of delivering it")]
        dry_run: bool,

        #[command(flatten)]
        extract: ExtractArgs,
    },
    /// Extract the payload from a live page or a saved snapshot and print it
    Extract {
        #[arg(long, env = PAGE_URL_VAR, help = "Address of the rendered rates page")]
        page_url: Option<String>,

        #[arg(
            long,
            value_name = "PATH",
            help = "Read a saved, fully rendered HTML snapshot instead of fetching"
        )]
        html_file: Option<PathBuf>,

        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,

        #[command(flatten)]
        extract: ExtractArgs,
    },
    /// Print the JSON Schema of the delivered payload
    Schema,
}

fn parse_schema(s: &str) -> Result<SchemaVersion, String> {
    SchemaVersion::from_str(s).map_err(|e| e.to_string())
}

fn serialize_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            log::error!("Error serializing to JSON: {}", e);
            process::exit(1);
        }
    }
}

fn read_snapshot(path: &Path) -> String {
    log::info!("Reading page snapshot {}...", path.display());
    std::fs::read_to_string(path).unwrap_or_else(|e| {
        log::error!("Error reading {}: {}", path.display(), e);
        process::exit(1);
    })
}

fn new_scraper() -> WebScraper {
    WebScraper::new().unwrap_or_else(|e| {
        log::error!("Error creating scraper: {}", e);
        process::exit(1);
    })
}

fn print_payload(payload: &Payload, format: &OutputFormat) {
    match format {
        OutputFormat::Json => serialize_json(payload),
        OutputFormat::Text => print!("{}", payload),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut level: LevelFilter = cli.log_level.clone().into();
    if cli.verbose {
        level = level.max(LevelFilter::Debug);
    }
    env_logger::Builder::new().filter_level(level).init();

    match cli.command {
        Commands::Run {
            page_url,
            html_file,
            endpoint_url,
            token,
            delivery_timeout,
            dry_run,
            extract,
        } => {
            // A snapshot stands in for the page address.
            let page_url = match &html_file {
                Some(path) => Some(format!("file://{}", path.display())),
                None => page_url,
            };
            let config = Config::new(page_url, endpoint_url, token).unwrap_or_else(|e| {
                log::error!("Invalid configuration: {}", e);
                process::exit(1);
            });
            let config = config
                .with_verbose(cli.verbose)
                .with_schema(extract.schema)
                .with_headings(extract.headings())
                .with_timeouts(
                    Duration::from_secs(extract.page_timeout),
                    Duration::from_secs(delivery_timeout),
                );

            let snapshot = html_file.as_deref().map(read_snapshot);

            if dry_run {
                let payload = match &snapshot {
                    Some(html) => extract_html(html, &config.headings, config.schema)
                        .map_err(RunError::from),
                    None => collect(&new_scraper(), &config).await,
                }
                .unwrap_or_else(|e| {
                    log::error!("Run aborted: {}", e);
                    process::exit(1);
                });
                log::warn!("Dry run: payload not delivered");
                serialize_json(&payload);
                return;
            }

            let result = match &snapshot {
                Some(html) => run_html(&config, html).await,
                None => run(&config).await,
            };
            let payload = result.unwrap_or_else(|e| {
                log::error!("Run aborted: {}", e);
                process::exit(1);
            });
            log::info!(
                "Delivered {} Treasury and {} SOFR rates (updated {} / {})",
                payload.treasury.len(),
                payload.sofr.len(),
                payload.dates.treasury,
                payload.dates.sofr
            );
        }

        Commands::Extract {
            page_url,
            html_file,
            format,
            extract,
        } => {
            let html = match (html_file, page_url) {
                (Some(path), _) => read_snapshot(&path),
                (None, Some(url)) => {
                    new_scraper()
                        .fetch_page(&url, Duration::from_secs(extract.page_timeout))
                        .await
                        .unwrap_or_else(|e| {
                            log::error!("Error fetching rates page: {}", e);
                            process::exit(1);
                        })
                }
                (None, None) => {
                    log::error!(
                        "Invalid configuration: {} (or pass --html-file)",
                        ConfigError::MissingConfiguration(PAGE_URL_VAR)
                    );
                    process::exit(1);
                }
            };

            let payload =
                extract_html(&html, &extract.headings(), extract.schema).unwrap_or_else(|e| {
                    log::error!("Extraction failed: {}", e);
                    process::exit(1);
                });

            print_payload(&payload, &format);
        }

        Commands::Schema => serialize_json(&Payload::json_schema()),
    }
}
