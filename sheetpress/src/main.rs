use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use log::{debug, info};
use sheetpress_core::client::{Action, BackendClient, BackendResponse, Upload};
use sheetpress_core::config::DEFAULT_CONFIG_FILE;
use sheetpress_core::extract::extract_workbook_contexts;
use sheetpress_core::history::{FileStore, History, HistoryItem};
use sheetpress_core::session::default_title;
use sheetpress_core::{PressConfig, PreviewSession, SessionError, reader};
use std::fs;
use std::path::{Path, PathBuf};

mod formatter;

#[derive(Parser)]
#[command(name = "sheetpress")]
#[command(about = "Preview, validate and publish product price-list spreadsheets", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to configuration file (TOML)
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the sheets of a workbook
    Sheets {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Show the rows of one sheet with flagged cells highlighted
    Preview {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Sheet to show (defaults to the first)
        #[arg(short, long)]
        sheet: Option<String>,
        /// Maximum number of data rows to print
        #[arg(short, long, default_value_t = 20)]
        rows: usize,
    },
    /// Validate one sheet; exits with 1 when conversion would be blocked
    Validate {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(short, long)]
        sheet: Option<String>,
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },
    /// Print the product contexts derived from a sheet
    Extract {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(short, long, conflicts_with = "all")]
        sheet: Option<String>,
        /// Extract every sheet of the workbook
        #[arg(short, long)]
        all: bool,
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },
    /// Send the file to the backend for conversion to HTML
    Convert {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(short, long)]
        sheet: Option<String>,
        /// Write the returned HTML here instead of stdout
        #[arg(short, long, value_name = "HTML")]
        out: Option<PathBuf>,
    },
    /// Convert the file, publish it as a page and record it in the history
    Publish {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(short, long)]
        sheet: Option<String>,
        /// Page title (defaults to the backend's suggestion, else the file name)
        #[arg(short, long)]
        title: Option<String>,
    },
    /// Inspect or edit the publish history
    #[command(subcommand)]
    History(HistoryCommand),
}

#[derive(Subcommand)]
enum HistoryCommand {
    /// List published pages, newest first
    List {
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },
    /// Remove one entry by id
    Delete { id: String },
    /// Remove every entry
    Clear,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON output for scripting
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(cli.config.as_deref())?;

    // Validate configuration
    let valid_tokens = sheetpress_core::rules::registry::get_all_valid_tokens();
    config
        .validate_rules(&valid_tokens)
        .context("Invalid configuration")?;

    let exit_code = match cli.command {
        Command::Sheets { file } => {
            let workbook = reader::read_workbook(&file)
                .with_context(|| format!("Failed to read workbook: {}", file.display()))?;
            formatter::print_sheets(&file, &workbook.sheet_names());
            0
        }
        Command::Preview { file, sheet, rows } => {
            let session = open_session(config, &file, sheet.as_deref())?;
            formatter::print_preview(&session, rows);
            0
        }
        Command::Validate {
            file,
            sheet,
            format,
        } => {
            let session = open_session(config, &file, sheet.as_deref())?;
            let decision = session.gate();
            match format {
                OutputFormat::Human => formatter::print_findings(&file, &session, &decision),
                OutputFormat::Json => formatter::print_findings_json(&file, &session, &decision)?,
            }
            if decision.is_blocked() { 1 } else { 0 }
        }
        Command::Extract {
            file,
            sheet,
            all,
            format,
        } => run_extract(config, &file, sheet.as_deref(), all, format)?,
        Command::Convert { file, sheet, out } => {
            run_convert(config, &file, sheet.as_deref(), out.as_deref())?
        }
        Command::Publish { file, sheet, title } => {
            run_publish(config, &file, sheet.as_deref(), title)?
        }
        Command::History(command) => run_history(&config, command)?,
    };

    std::process::exit(exit_code);
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<PressConfig> {
    if let Some(config_path) = path {
        return PressConfig::from_file(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()));
    }

    // Fall back to the config in the current directory if it exists
    let default_config_path = PathBuf::from(DEFAULT_CONFIG_FILE);
    if default_config_path.exists() {
        debug!("using {}", default_config_path.display());
        PressConfig::from_file(&default_config_path).with_context(|| {
            format!(
                "Failed to load config from {}",
                default_config_path.display()
            )
        })
    } else {
        Ok(PressConfig::default())
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn open_session(config: PressConfig, file: &Path, sheet: Option<&str>) -> Result<PreviewSession> {
    let bytes = fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let mut session = PreviewSession::new(config);
    session.open_file(&file_name(file), bytes, sheet)?;
    Ok(session)
}

/// Load a session for a backend action; only `.xlsx` uploads are accepted
fn open_upload(config: PressConfig, file: &Path, sheet: Option<&str>) -> Result<PreviewSession> {
    let name = file_name(file);
    if !reader::is_accepted_upload(&name) {
        bail!("Please upload a valid Excel file (.xlsx): {}", name);
    }
    open_session(config, file, sheet)
}

fn run_extract(
    config: PressConfig,
    file: &Path,
    sheet: Option<&str>,
    all: bool,
    format: OutputFormat,
) -> Result<i32> {
    if all {
        let workbook = reader::read_workbook(file)
            .with_context(|| format!("Failed to read workbook: {}", file.display()))?;
        let by_sheet = extract_workbook_contexts(&workbook, &config.columns);
        match format {
            OutputFormat::Human => formatter::print_workbook_contexts(&by_sheet),
            OutputFormat::Json => formatter::print_workbook_contexts_json(&by_sheet)?,
        }
        return Ok(0);
    }

    let mut session = open_session(config, file, sheet)?;
    if session.preview().is_none() {
        formatter::print_findings(file, &session, &session.gate());
        return Ok(1);
    }
    // Local extraction does not need the backend
    session.mark_converted()?;
    let contexts = session.contexts().unwrap_or_default();
    match format {
        OutputFormat::Human => {
            formatter::print_contexts(&contexts);
            if let Some(summary) = session.summary() {
                formatter::print_summary(&summary);
            }
        }
        OutputFormat::Json => formatter::print_contexts_json(&contexts, session.summary())?,
    }
    Ok(0)
}

/// Convert through the backend, reporting refusals and failures to the user.
///
/// Returns `None` when the conversion did not happen.
fn convert(session: &mut PreviewSession, client: &BackendClient) -> Result<Option<BackendResponse>> {
    if let Err(e) = session.ensure_convertible() {
        match e {
            SessionError::Blocked(_) => formatter::print_blocked(session),
            other => formatter::print_error(&other.to_string()),
        }
        return Ok(None);
    }

    let (name, bytes) = session
        .file_name()
        .zip(session.file_bytes())
        .ok_or(SessionError::NoFile)?;
    let response = match client.convert(Upload {
        file_name: name,
        bytes,
    }) {
        Ok(response) => response,
        Err(e) => {
            debug!("convert failed: {:?}", e);
            formatter::print_error(&e.user_message(Action::Convert));
            return Ok(None);
        }
    };
    info!("converted '{}'", name);
    session.mark_converted()?;
    Ok(Some(response))
}

fn run_convert(config: PressConfig, file: &Path, sheet: Option<&str>, out: Option<&Path>) -> Result<i32> {
    let client = BackendClient::new(&config.backend)?;
    let mut session = open_upload(config, file, sheet)?;

    let Some(response) = convert(&mut session, &client)? else {
        return Ok(1);
    };

    let html = response.html.unwrap_or_default();
    match out {
        Some(path) => {
            fs::write(path, &html).with_context(|| format!("Failed to write {}", path.display()))?;
            formatter::print_success(&format!("HTML written to {}", path.display()));
        }
        None => println!("{}", html),
    }
    if let Some(summary) = session.summary() {
        formatter::print_summary(&summary);
    }
    Ok(0)
}

fn run_publish(config: PressConfig, file: &Path, sheet: Option<&str>, title: Option<String>) -> Result<i32> {
    let client = BackendClient::new(&config.backend)?;
    let store = FileStore::new(config.history.dir.clone());
    let capacity = config.history.capacity;
    let mut session = open_upload(config, file, sheet)?;

    let Some(converted) = convert(&mut session, &client)? else {
        return Ok(1);
    };
    let title = title
        .or(converted.default_title)
        .unwrap_or_else(|| default_title(&file_name(file)));

    if let Err(e) = session.ensure_publishable(&title) {
        formatter::print_error(&e.to_string());
        return Ok(1);
    }

    let (name, bytes) = session
        .file_name()
        .zip(session.file_bytes())
        .ok_or(SessionError::NoFile)?;
    let response = match client.publish(
        Upload {
            file_name: name,
            bytes,
        },
        &title,
    ) {
        Ok(response) => response,
        Err(e) => {
            debug!("publish failed: {:?}", e);
            formatter::print_error(&e.user_message(Action::Publish));
            return Ok(1);
        }
    };

    let mut history = History::load(store, capacity)?;
    let item = HistoryItem::new(title, response.url);
    formatter::print_published(&item);
    history.record(item)?;
    Ok(0)
}

fn run_history(config: &PressConfig, command: HistoryCommand) -> Result<i32> {
    let store = FileStore::new(config.history.dir.clone());
    let mut history = History::load(store, config.history.capacity)?;

    match command {
        HistoryCommand::List { format } => match format {
            OutputFormat::Human => formatter::print_history(history.items()),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(history.items())?),
        },
        HistoryCommand::Delete { id } => {
            if !history.remove(&id)? {
                formatter::print_error(&format!("No history entry with id {}", id));
                return Ok(1);
            }
            formatter::print_success(&format!("Removed {}", id));
        }
        HistoryCommand::Clear => {
            history.clear()?;
            formatter::print_success("History cleared");
        }
    }
    Ok(0)
}
