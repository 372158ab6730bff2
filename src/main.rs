mod config;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use config::Config;
use microservices_jsonapi::{
    describe_error, CreateParams, DataProvider, DeleteManyParams, DeleteParams, Filter,
    GetListParams, GetManyParams, GetManyReferenceParams, GetOneParams, Id, MicroServicesProvider,
    Pagination, Sort, SortOrder, UpdateManyBody, UpdateManyParams, UpdateParams,
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

/// CRUD against JSON:API microservices
#[derive(Parser, Debug)]
#[command(name = "msjsonapi", version, about, long_about = None)]
struct Args {
    /// Config file (defaults to <config dir>/msjsonapi/config.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Resource mapping override, e.g. posts=http://localhost:3000/posts
    #[arg(short, long = "resource", value_parser = parse_key_value)]
    resources: Vec<(String, String)>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Send the bare record for each update-many request
    #[arg(long)]
    raw_update_many: bool,

    /// Log level for debugging; RUST_LOG directives refine it
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,

    /// Log file (defaults to <config dir>/msjsonapi/msjsonapi.log)
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

#[derive(ClapArgs, Debug)]
struct ListArgs {
    #[arg(long, default_value_t = 1)]
    page: u32,

    #[arg(long, default_value_t = 10)]
    per_page: u32,

    /// Filter, e.g. status=published (values parse as JSON when possible)
    #[arg(long = "filter", value_parser = parse_key_value)]
    filters: Vec<(String, String)>,

    #[arg(long)]
    sort: Option<String>,

    /// Sort order; anything but ASC sorts descending
    #[arg(long, default_value = "ASC")]
    order: String,
}

impl ListArgs {
    fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.per_page)
    }

    fn filter(&self) -> Filter {
        self.filters
            .iter()
            .map(|(key, value)| (key.clone(), parse_value(value)))
            .collect()
    }

    fn sort(&self) -> Option<Sort> {
        self.sort
            .as_ref()
            .map(|field| Sort::new(field.clone(), SortOrder::from(self.order.as_str())))
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List one page of records
    List {
        resource: String,
        #[command(flatten)]
        list: ListArgs,
    },
    /// Fetch one record
    Get { resource: String, id: String },
    /// Fetch several records by id
    GetMany {
        resource: String,
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// List records referencing another record through a field
    GetReference {
        resource: String,
        target: String,
        id: String,
        #[command(flatten)]
        list: ListArgs,
    },
    /// Create a record from a JSON object
    Create {
        resource: String,
        #[arg(value_parser = parse_object)]
        data: Map<String, Value>,
    },
    /// Partially update a record from a JSON object
    Update {
        resource: String,
        id: String,
        #[arg(value_parser = parse_object)]
        data: Map<String, Value>,
    },
    /// Apply the same partial update to several records
    UpdateMany {
        resource: String,
        #[arg(value_parser = parse_object)]
        data: Map<String, Value>,
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Delete one record
    Delete { resource: String, id: String },
    /// Delete several records
    DeleteMany {
        resource: String,
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Show the configured resources
    Resources,
}

fn parse_key_value(input: &str) -> Result<(String, String), String> {
    match input.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{}'", input)),
    }
}

fn parse_object(input: &str) -> Result<Map<String, Value>, String> {
    match serde_json::from_str::<Value>(input) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err("expected a JSON object".to_string()),
        Err(e) => Err(format!("invalid JSON: {}", e)),
    }
}

/// JSON literal when it parses, plain string otherwise
fn parse_value(input: &str) -> Value {
    serde_json::from_str(input).unwrap_or_else(|_| Value::String(input.to_string()))
}

fn parse_ids(ids: &[String]) -> Vec<Id> {
    ids.iter().map(|id| Id::parse(id)).collect()
}

/// Install a file subscriber when a level is set. The guard flushes on drop.
fn setup_logging(level: LogLevel, log_path: &Path) -> Result<Option<WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let (writer, guard) = tracing_appender::non_blocking(open_log_file(log_path)?);
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(tracing_level).into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!(?level, path = %log_path.display(), "msjsonapi logging started");
    Ok(Some(guard))
}

fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create log directory {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Cannot open log file {}", path.display()))
}

fn to_output<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to format result")
}

/// Config file with the command-line overrides applied
fn load_config(args: &Args) -> Result<Config> {
    let mut config = Config::load(args.config.as_deref())?;
    config.merge_resources(&args.resources);
    if args.timeout.is_some() {
        config.timeout_secs = args.timeout;
    }
    if args.raw_update_many {
        config.update_many_body = Some(UpdateManyBody::Raw);
    }
    if args.log_file.is_some() {
        config.log_file = args.log_file.clone();
    }
    Ok(config)
}

async fn run(command: Command, config: Config) -> Result<String> {
    if let Command::Resources = command {
        return to_output(&config.resources);
    }

    let provider = MicroServicesProvider::new(config.provider_config()?, config.http_client()?)
        .with_update_many_body(config.update_many_body.unwrap_or_default());

    match command {
        Command::List { resource, list } => {
            let params = GetListParams {
                pagination: list.pagination(),
                filter: list.filter(),
                sort: list.sort(),
            };
            to_output(&provider.get_list(&resource, params).await?)
        }
        Command::Get { resource, id } => {
            let params = GetOneParams::new(Id::parse(&id));
            to_output(&provider.get_one(&resource, params).await?)
        }
        Command::GetMany { resource, ids } => {
            let params = GetManyParams { ids: parse_ids(&ids) };
            to_output(&provider.get_many(&resource, params).await?)
        }
        Command::GetReference {
            resource,
            target,
            id,
            list,
        } => {
            let params = GetManyReferenceParams {
                target,
                id: Id::parse(&id),
                pagination: list.pagination(),
                filter: list.filter(),
                sort: list.sort(),
            };
            to_output(&provider.get_many_reference(&resource, params).await?)
        }
        Command::Create { resource, data } => {
            to_output(&provider.create(&resource, CreateParams::new(data)).await?)
        }
        Command::Update { resource, id, data } => {
            let params = UpdateParams::new(Id::parse(&id), data);
            to_output(&provider.update(&resource, params).await?)
        }
        Command::UpdateMany {
            resource,
            data,
            ids,
        } => {
            let params = UpdateManyParams {
                ids: parse_ids(&ids),
                data,
            };
            to_output(&provider.update_many(&resource, params).await?)
        }
        Command::Delete { resource, id } => {
            let params = DeleteParams::new(Id::parse(&id));
            to_output(&provider.delete(&resource, params).await?)
        }
        Command::DeleteMany { resource, ids } => {
            let params = DeleteManyParams { ids: parse_ids(&ids) };
            to_output(&provider.delete_many(&resource, params).await?)
        }
        Command::Resources => to_output(&config.resources),
    }
}

/// Provider errors get the short description, everything else the full chain
fn error_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<microservices_jsonapi::Error>() {
        Some(provider_err) => describe_error(provider_err),
        None => format!("{:#}", err),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {}", error_message(&err));
            return ExitCode::FAILURE;
        }
    };

    let _log_guard = match setup_logging(args.log_level, &config.log_path()) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("Warning: logging disabled: {:#}", err);
            None
        }
    };

    match run(args.command, config).await {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!("{:#}", err);
            eprintln!("Error: {}", error_message(&err));
            ExitCode::FAILURE
        }
    }
}
