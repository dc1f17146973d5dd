// scancount - GS1 implant inventory counting from the command line

mod exit_codes;
mod import;
mod logging;
mod replay;
mod session;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use serde::Serialize;

use scancount_recon::expiry;
use scancount_recon::{
    ArticleFilter, ArticleStatus, DecodeError, Inventory, ScanConfig, ScanResult, Statistics,
};

use exit_codes::{
    EXIT_CONFIG, EXIT_DECODE_NO_IDENTITY, EXIT_ERROR, EXIT_IMPORT, EXIT_RUN_INCOMPLETE,
    EXIT_SESSION_PARSE, EXIT_SUCCESS, EXIT_USAGE,
};

#[derive(Parser)]
#[command(name = "scancount")]
#[command(about = "Count implant inventory by scanning GS1 DataMatrix labels")]
#[command(version)]
#[command(long_version = long_version())]
struct Cli {
    /// More log output (-v info, -vv debug). SCANCOUNT_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode one scanner payload and print its fields
    #[command(after_help = "\
Examples:
  scancount decode 0104012345678901172612311012345
  scancount decode '(01)04012345678901(17)261231(10)12345' --json
  scancount decode '240NK123<GS>10LOT7'")]
    Decode {
        /// Raw payload; `<GS>` or `\\x1d` stand for the group separator
        payload: String,

        /// Print the decoded scan as JSON on stdout
        #[arg(long)]
        json: bool,

        /// Scan settings (TOML)
        #[arg(long, env = "SCANCOUNT_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Replay a session of scans against an article list
    #[command(after_help = "\
Examples:
  scancount run articles.csv session.txt
  scancount run articles.csv session.txt --json > report.json
  scancount run articles.csv session.txt --strict --output report.json")]
    Run {
        /// Inventory sheet as CSV (columns A-N, header row)
        articles: PathBuf,

        /// Session file: one payload per line, `!undo`, `!manual <LOT> <n>`
        session: PathBuf,

        /// Scan settings (TOML)
        #[arg(long, env = "SCANCOUNT_CONFIG")]
        config: Option<PathBuf>,

        /// Print the full report as JSON on stdout
        #[arg(long)]
        json: bool,

        /// Write the JSON report to a file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Fail unless every article is complete after the session
        #[arg(long)]
        strict: bool,

        /// CSV field delimiter
        #[arg(long, default_value = ",")]
        delimiter: char,
    },

    /// Statistics of an article list
    Stats {
        /// Inventory sheet as CSV
        articles: PathBuf,

        #[arg(long)]
        json: bool,

        /// CSV field delimiter
        #[arg(long, default_value = ",")]
        delimiter: char,
    },

    /// List articles, optionally filtered
    #[command(after_help = "\
Examples:
  scancount list articles.csv --status missing
  scancount list articles.csv --sparte Knie --query femur
  scancount list articles.csv --deviations --json")]
    List {
        /// Inventory sheet as CSV
        articles: PathBuf,

        /// Case-insensitive search over REF, description, LOT and category
        #[arg(long, short = 'q', default_value = "")]
        query: String,

        /// complete, partial, missing or open
        #[arg(long)]
        status: Option<ArticleStatus>,

        /// Exact category
        #[arg(long)]
        sparte: Option<String>,

        /// Only articles whose count differs from the target
        #[arg(long)]
        deviations: bool,

        #[arg(long)]
        json: bool,

        /// CSV field delimiter
        #[arg(long, default_value = ",")]
        delimiter: char,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("SCANCOUNT_COMMIT"), ")",
        "\nengine:  scancount-recon ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("SCANCOUNT_TARGET"),
    )
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = match cli.command {
        Commands::Decode { payload, json, config } => cmd_decode(payload, json, config),
        Commands::Run { articles, session, config, json, output, strict, delimiter } => {
            cmd_run(articles, session, config, json, output, strict, delimiter)
        }
        Commands::Stats { articles, json, delimiter } => cmd_stats(articles, json, delimiter),
        Commands::List { articles, query, status, sparte, deviations, json, delimiter } => {
            let filter = ArticleFilter { query, status, sparte };
            cmd_list(articles, filter, deviations, json, delimiter)
        }
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, msg)
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<import::ImportError> for CliError {
    fn from(err: import::ImportError) -> Self {
        match err {
            import::ImportError::Io(msg) => CliError::args(msg),
            other => CliError::new(EXIT_IMPORT, other.to_string())
                .with_hint("columns A-N: Sparte, REF, Bezeichnung, Soll, LOT, ..., Manuelle Zählung in G"),
        }
    }
}

// ============================================================================
// shared loading
// ============================================================================

fn load_config(path: Option<&Path>) -> Result<ScanConfig, CliError> {
    let Some(path) = path else {
        return Ok(ScanConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::args(format!("cannot read config {}: {e}", path.display())))?;
    ScanConfig::from_toml(&text)
        .map_err(|e| CliError::new(EXIT_CONFIG, format!("{}: {e}", path.display())))
}

fn delimiter_byte(delimiter: char) -> Result<u8, CliError> {
    u8::try_from(delimiter)
        .ok()
        .filter(|b| b.is_ascii())
        .ok_or_else(|| CliError::args(format!("delimiter must be a single ASCII character, got '{delimiter}'")))
}

fn load_inventory(path: &Path, delimiter: char) -> Result<Inventory, CliError> {
    let report = import::read_articles(path, delimiter_byte(delimiter)?)?;
    if report.articles.is_empty() {
        return Err(CliError::new(EXIT_IMPORT, format!("{}: no articles found", path.display()))
            .with_hint("rows need a REF in column B; the first row is treated as header"));
    }
    tracing::info!(articles = report.articles.len(), skipped = report.skipped, "article list loaded");

    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "inventory".to_string());
    Inventory::new(1, name, report.articles).map_err(|e| CliError::new(EXIT_IMPORT, e.to_string()))
}

fn to_json<T: Serialize>(value: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(value).map_err(|e| CliError::io(format!("JSON serialization error: {e}")))
}

// ============================================================================
// decode
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DecodeOutput<'a> {
    #[serde(flatten)]
    scan: &'a ScanResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    expiry_state: Option<scancount_recon::ExpiryState>,
}

fn cmd_decode(payload: String, json: bool, config: Option<PathBuf>) -> Result<(), CliError> {
    let config = load_config(config.as_deref())?;
    let raw = session::unescape_payload(&payload);

    let scan = scancount_recon::decode_with(&raw, &config.decode_options()).map_err(|e| match e {
        DecodeError::NoIdentifyingField => CliError::new(EXIT_DECODE_NO_IDENTITY, e.to_string())
            .with_hint("write the group separator as <GS> or \\x1d"),
    })?;

    let today = expiry::today();
    let expiry_state = scan
        .expiry_date
        .map(|d| expiry::classify_expiry(d, today, config.expiry.soon_months));

    if json {
        println!("{}", to_json(&DecodeOutput { scan: &scan, expiry_state })?);
        return Ok(());
    }

    let field = |label: &str, value: &str| {
        if !value.is_empty() {
            println!("{label:<6} {value}");
        }
    };
    field("REF", &scan.reference);
    field("LOT", &scan.lot);
    field("GTIN", &scan.gtin);
    if let Some(date) = scan.expiry_date {
        let shown = expiry::format_with(Some(date), &config.expiry.display_format);
        match expiry_state {
            Some(state) => println!("{:<6} {shown} ({state})", "EXP"),
            None => println!("{:<6} {shown}", "EXP"),
        }
    }
    field("SN", scan.serial_number.as_deref().unwrap_or(""));
    Ok(())
}

// ============================================================================
// run
// ============================================================================

fn cmd_run(
    articles: PathBuf,
    session_path: PathBuf,
    config: Option<PathBuf>,
    json: bool,
    output: Option<PathBuf>,
    strict: bool,
    delimiter: char,
) -> Result<(), CliError> {
    let config = load_config(config.as_deref())?;
    let mut inv = load_inventory(&articles, delimiter)?.with_config(config);

    let text = std::fs::read_to_string(&session_path).map_err(|e| {
        CliError::args(format!("cannot read session {}: {e}", session_path.display()))
    })?;
    let lines = session::parse_session(&text).map_err(|e| {
        CliError::new(EXIT_SESSION_PARSE, format!("{}: {e}", session_path.display()))
            .with_hint("directives are `!undo` and `!manual <LOT> <count>`")
    })?;

    let steps = replay::replay(&mut inv, &lines);
    let report = replay::RunReport::new(&inv, steps);

    if json || output.is_some() {
        let json_str = to_json(&report)?;
        if let Some(ref path) = output {
            std::fs::write(path, &json_str)
                .map_err(|e| CliError::io(format!("cannot write output: {e}")))?;
            eprintln!("wrote {}", path.display());
        }
        if json {
            println!("{json_str}");
        }
    }

    replay::print_human(&report);

    let s = &report.statistics;
    if strict && s.complete != s.total {
        return Err(CliError::new(
            EXIT_RUN_INCOMPLETE,
            format!("{} of {} articles not complete", s.total - s.complete, s.total),
        ));
    }

    Ok(())
}

// ============================================================================
// stats
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatsOutput {
    statistics: Statistics,
    progress_percent: u32,
    remaining: usize,
    sparten: Vec<String>,
}

fn cmd_stats(articles: PathBuf, json: bool, delimiter: char) -> Result<(), CliError> {
    let inv = load_inventory(&articles, delimiter)?;
    let statistics = inv.statistics();
    let out = StatsOutput {
        statistics,
        progress_percent: statistics.progress_percent(),
        remaining: statistics.remaining(),
        sparten: scancount_recon::sparten(inv.articles()),
    };

    if json {
        println!("{}", to_json(&out)?);
        return Ok(());
    }

    println!("total     {}", statistics.total);
    for status in ArticleStatus::ALL {
        let n = match status {
            ArticleStatus::Complete => statistics.complete,
            ArticleStatus::Partial => statistics.partial,
            ArticleStatus::Missing => statistics.missing,
            ArticleStatus::Open => statistics.open,
        };
        println!("{:<9} {n}", status.to_string());
    }
    println!("progress  {}%", out.progress_percent);
    if !out.sparten.is_empty() {
        println!("sparten   {}", out.sparten.join(", "));
    }
    Ok(())
}

// ============================================================================
// list
// ============================================================================

fn cmd_list(
    articles: PathBuf,
    filter: ArticleFilter,
    deviations_only: bool,
    json: bool,
    delimiter: char,
) -> Result<(), CliError> {
    let inv = load_inventory(&articles, delimiter)?;

    let hits: Vec<_> = filter
        .apply(inv.articles())
        .into_iter()
        .filter(|a| !deviations_only || a.abweichung() != 0)
        .collect();

    if json {
        println!("{}", to_json(&hits)?);
        return Ok(());
    }

    for a in &hits {
        println!(
            "{:<12} {:<12} {:>3}/{:<3} {:<11} {}",
            a.materialnummer,
            a.charge,
            a.gueltige_zaehlung(),
            a.soll(),
            scancount_recon::classify(a).label(),
            a.materialbezeichnung,
        );
    }
    eprintln!("{} of {} articles", hits.len(), inv.articles().len());
    Ok(())
}
