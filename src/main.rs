use std::io::{self, Write};
use std::panic;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use tracing::{error, info, warn, Level};

use screentable::alerts::{AlertClient, AlertRef, StderrNotifier};
use screentable::config::Config;
use screentable::error::TableError;
use screentable::fileio::{build_table, write_html, FileIO};
use screentable::html::render_document;
use screentable::table::filter::filter_rows_by_category;
use screentable::table::visibility::toggle_column_pair_visibility;
use screentable::table::{ColumnRole, Document, SortEngine, TableId};
use screentable::Error;

/// One user interaction, replayed in command-line order
#[derive(Debug, Clone, PartialEq)]
enum Action {
    /// Click the header with this label
    Sort(String),
    Filter(ColumnRole, String),
    Toggle(ColumnRole, ColumnRole),
    Ack(AlertRef),
}

#[derive(Debug)]
struct Args {
    file_path: PathBuf,
    delimiter: Option<u8>,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    log_level: Level,
    actions: Vec<Action>,
}

/// Parse command line arguments
/// Returns None when help was requested
fn parse_args(args: &[String]) -> Result<Option<Args>, String> {
    let mut file_path: Option<PathBuf> = None;
    let mut delimiter: Option<u8> = None;
    let mut config: Option<PathBuf> = None;
    let mut output: Option<PathBuf> = None;
    let mut log_level = Level::INFO;
    let mut actions = Vec::new();

    let mut i = 0;
    while i < args.len() {
        let value = |name: &str| {
            args.get(i + 1)
                .cloned()
                .ok_or_else(|| format!("{} requires an argument", name))
        };

        match args[i].as_str() {
            "-h" | "--help" => return Ok(None),
            "-d" | "--delimiter" => {
                delimiter = Some(parse_delimiter(&value("--delimiter")?)?);
                i += 2;
            }
            "-c" | "--config" => {
                config = Some(PathBuf::from(value("--config")?));
                i += 2;
            }
            "-o" | "--output" => {
                output = Some(PathBuf::from(value("--output")?));
                i += 2;
            }
            "--log-level" => {
                let level = value("--log-level")?;
                log_level = Level::from_str(&level).map_err(|_| format!("Invalid log level: '{}'", level))?;
                i += 2;
            }
            "-s" | "--sort" => {
                actions.push(Action::Sort(value("--sort")?));
                i += 2;
            }
            "--filter" => {
                let raw = value("--filter")?;
                let (role, selected) = raw
                    .split_once('=')
                    .ok_or_else(|| format!("--filter expects ROLE=VALUE, got '{}'", raw))?;
                actions.push(Action::Filter(ColumnRole::from_name(role), selected.to_string()));
                i += 2;
            }
            "--toggle" => {
                let raw = value("--toggle")?;
                let (a, b) = raw
                    .split_once(',')
                    .ok_or_else(|| format!("--toggle expects ROLE,ROLE, got '{}'", raw))?;
                actions.push(Action::Toggle(ColumnRole::from_name(a), ColumnRole::from_name(b)));
                i += 2;
            }
            "--ack" => {
                let raw = value("--ack")?;
                let alert = AlertRef::parse(&raw)
                    .ok_or_else(|| format!("--ack expects ALERT_ID:ROW_ID, got '{}'", raw))?;
                actions.push(Action::Ack(alert));
                i += 2;
            }
            arg if arg.starts_with('-') => {
                return Err(format!("Unknown option: {}", arg));
            }
            _ => {
                file_path = Some(PathBuf::from(&args[i]));
                i += 1;
            }
        }
    }

    let file_path = file_path.ok_or_else(|| "No input file given".to_string())?;

    Ok(Some(Args {
        file_path,
        delimiter,
        config,
        output,
        log_level,
        actions,
    }))
}

/// Parse a delimiter string into a byte
fn parse_delimiter(s: &str) -> Result<u8, String> {
    match s.to_lowercase().as_str() {
        "comma" | "," => Ok(b','),
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        "semicolon" | ";" => Ok(b';'),
        "pipe" | "|" => Ok(b'|'),
        _ if s.len() == 1 => Ok(s.as_bytes()[0]),
        _ => Err(format!(
            "Invalid delimiter: '{}'. Use comma, tab, semicolon, pipe, or a single character.",
            s
        )),
    }
}

/// Log panics before the default hook prints them
fn install_panic_hook() {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        if let Some(location) = info.location() {
            error!(
                file = location.file(),
                line = location.line(),
                "panic occured"
            );
        } else {
            error!("panic occured");
        }

        default_hook(info);
    }));
}

fn print_help() {
    eprintln!("screentable - render a stock screener table and sort, filter or hide its rows");
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("    screentable [OPTIONS] FILE");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("    -d, --delimiter <DELIM>   Field delimiter (comma, tab, semicolon, pipe, or char)");
    eprintln!("    -c, --config <PATH>       TOML config with column roles, links and alert endpoint");
    eprintln!("    -o, --output <PATH>       Write the HTML page here instead of stdout");
    eprintln!("    -s, --sort <LABEL>        Click the header with this label (repeat to reverse)");
    eprintln!("        --filter <ROLE=VALUE> Show only rows whose category equals VALUE (empty shows all)");
    eprintln!("        --toggle <ROLE,ROLE>  Toggle visibility of a pair of columns");
    eprintln!("        --ack <ALERT:ROW>     Acknowledge an alert and remove its row");
    eprintln!("        --log-level <LEVEL>   trace, debug, info, warn or error (default: info)");
    eprintln!("    -h, --help                Print this help message");
    eprintln!();
    eprintln!("Actions run in the order given.");
}

fn sort_by_label(engine: &mut SortEngine, doc: &mut Document, label: &str) -> Result<(), Error> {
    let Some(idx) = doc.tables.iter().position(|t| t.header_by_label(label).is_some()) else {
        let table = doc
            .tables
            .first()
            .map(|t| t.id().clone())
            .unwrap_or_else(|| TableId(String::new()));
        return Err(TableError::UnknownHeader { table, label: label.to_string() }.into());
    };

    let outcome = engine.sort_by_label(&mut doc.tables[idx], label)?;
    info!(column = label, index = outcome.column, action = ?outcome.action, "header clicked");
    Ok(())
}

fn run(args: Args) -> Result<(), Error> {
    let config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    let file_io = FileIO::new(args.file_path.clone(), args.delimiter);
    let load_result = file_io.load_rows().map_err(|e| {
        error!(file = %file_io.file_name(), error = %e, "failed to load input");
        e
    })?;

    for warning in &load_result.warnings {
        warn!(file = %file_io.file_name(), "{}", warning);
    }

    let table = build_table(load_result.rows, &config, &config.table_id);
    let mut doc = Document::new(vec![table]);
    let mut engine = SortEngine::new(config.sort_scope);

    let client = AlertClient::new(config.alerts.base_url.clone()).with_timeout(config.alerts.timeout());
    let notifier = StderrNotifier;
    let mut runtime: Option<tokio::runtime::Runtime> = None;

    let mut actions = args.actions.into_iter().peekable();
    while let Some(action) = actions.next() {
        match action {
            Action::Sort(label) => sort_by_label(&mut engine, &mut doc, &label)?,
            Action::Filter(role, selected) => {
                let summary = filter_rows_by_category(&mut doc, &role, &selected);
                info!(%role, selected = %selected, shown = summary.shown, hidden = summary.hidden, "category filter");
            }
            Action::Toggle(a, b) => {
                let tables = toggle_column_pair_visibility(&mut doc, &a, &b);
                info!(first = %a, second = %b, tables, "columns toggled");
            }
            Action::Ack(first) => {
                // consecutive acknowledgments run as one sequential batch
                let mut batch = vec![first];
                while let Some(Action::Ack(_)) = actions.peek() {
                    if let Some(Action::Ack(next)) = actions.next() {
                        batch.push(next);
                    }
                }

                let rt = match runtime.take() {
                    Some(rt) => rt,
                    None => tokio::runtime::Builder::new_current_thread().enable_all().build()?,
                };
                let summary = rt.block_on(client.acknowledge_all(&mut doc, &batch, &notifier));
                runtime = Some(rt);

                info!(acknowledged = summary.acknowledged, failed = summary.failed, "alerts processed");
            }
        }
    }

    let html = render_document(&doc, &config.title);
    match &args.output {
        Some(path) => write_html(path, &html)?,
        None => io::stdout().write_all(html.as_bytes())?,
    }

    Ok(())
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let args = match parse_args(&args) {
        Ok(Some(args)) => args,
        Ok(None) => {
            print_help();
            return ExitCode::SUCCESS;
        }
        Err(msg) => {
            eprintln!("Error: {}", msg);
            print_help();
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(args.log_level)
        .init();
    info!("screentable started");

    install_panic_hook();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "screentable failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
