//! dataquery CLI - serve the query API or compile queries offline
//!
//! Usage:
//!   dataquery serve [--bind <addr>]
//!   dataquery compile <data-set-id> --request <file.json> [--version <v>]
//!   dataquery versions <data-set-id> [--changes <version>]
//!
//! Examples:
//!   dataquery serve --bind 0.0.0.0:5050
//!   dataquery compile 0b3e... --request query.json --version 2.*
//!   dataquery versions 0b3e... --changes 1.1

use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use dataquery::config::Settings;
use dataquery::model::{DataSetQueryRequest, VersionSelector};
use dataquery::query::{DataQuery, QueryService};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "dataquery")]
#[command(about = "Query engine for versioned statistical data sets")]
#[command(version)]
struct Cli {
    /// Config file (defaults to DATAQUERY_CONFIG, ./dataquery.toml, then the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API
    Serve {
        /// Address to listen on, overriding server.bind
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Compile a query request to SQL without running it
    Compile {
        data_set_id: Uuid,

        /// JSON request body; `-` reads stdin
        #[arg(short, long)]
        request: PathBuf,

        /// Version selector: 1.2, 2.* or *
        #[arg(short, long)]
        version: Option<String>,

        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long)]
        page_size: Option<u32>,

        /// Output format
        #[arg(short, long, default_value = "sql")]
        output: OutputFormat,
    },

    /// List the versions of a data set
    Versions {
        data_set_id: Uuid,

        /// Show what changed in this version instead
        #[arg(long)]
        changes: Option<String>,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Output SQL only
    Sql,
    /// Output SQL with parameters and warnings
    Verbose,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("dataquery=info,tower_http=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = match load_settings(cli.config.as_ref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Serve { bind } => cmd_serve(settings, bind).await,
        Commands::Compile {
            data_set_id,
            request,
            version,
            page,
            page_size,
            output,
        } => {
            cmd_compile(
                &settings,
                data_set_id,
                request,
                version,
                page,
                page_size,
                output,
            )
            .await
        }
        Commands::Versions {
            data_set_id,
            changes,
        } => cmd_versions(&settings, data_set_id, changes).await,
    }
}

fn load_settings(path: Option<&PathBuf>) -> Result<Settings, dataquery::config::SettingsError> {
    match path {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    }
}

async fn cmd_serve(mut settings: Settings, bind: Option<String>) -> ExitCode {
    if let Some(bind) = bind {
        settings.server.bind = bind;
    }
    match dataquery::web::serve(&settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn service(settings: &Settings) -> Option<QueryService> {
    match QueryService::from_settings(settings) {
        Ok(service) => Some(service),
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            None
        }
    }
}

async fn cmd_compile(
    settings: &Settings,
    data_set_id: Uuid,
    request: PathBuf,
    version: Option<String>,
    page: u32,
    page_size: Option<u32>,
    output: OutputFormat,
) -> ExitCode {
    let body = if request.as_os_str() == "-" {
        let mut body = String::new();
        std::io::stdin()
            .read_to_string(&mut body)
            .map(|_| body)
    } else {
        fs::read_to_string(&request)
    };
    let body = match body {
        Ok(body) => body,
        Err(e) => {
            eprintln!("Error reading request '{}': {}", request.display(), e);
            return ExitCode::FAILURE;
        }
    };
    let request: DataSetQueryRequest = match serde_json::from_str(&body) {
        Ok(request) => request,
        Err(e) => {
            eprintln!("Invalid request: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let selector = match VersionSelector::parse_optional(version.as_deref()) {
        Ok(selector) => selector,
        Err(e) => {
            eprintln!("Invalid version: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let Some(service) = service(settings) else {
        return ExitCode::FAILURE;
    };
    let query = DataQuery::new(data_set_id, request)
        .version(selector)
        .page(page, page_size);

    match service.plan(&query).await {
        Ok(plan) => {
            match output {
                OutputFormat::Sql => println!("{}", plan.page.sql),
                OutputFormat::Verbose => {
                    println!("-- Data set: {}", data_set_id);
                    println!("-- Version: {}", plan.version.version);
                    println!("-- Count");
                    println!("{}", plan.count.sql);
                    println!("-- Page {} (size {})", plan.page_number, plan.page_size);
                    println!("{}", plan.page.sql);
                    println!("-- Params");
                    for (i, param) in plan.page.params.iter().enumerate() {
                        println!("--   {}: {:?}", i + 1, param);
                    }
                    for warning in &plan.warnings {
                        println!("-- Warning [{:?}] {}: {}", warning.code, warning.path, warning.message);
                    }
                }
            }
            ExitCode::SUCCESS
        }
        Err(dataquery::QueryError::Validation(errors)) => {
            eprintln!("Validation errors:");
            for error in errors {
                eprintln!("  {:?} at '{}': {}", error.code, error.path, error.message);
            }
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Compilation error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn cmd_versions(settings: &Settings, data_set_id: Uuid, changes: Option<String>) -> ExitCode {
    let Some(service) = service(settings) else {
        return ExitCode::FAILURE;
    };

    let printed = match changes {
        Some(version) => service
            .changes(data_set_id, &version)
            .await
            .and_then(|set| serde_json::to_string_pretty(&set).map_err(render_error)),
        None => service
            .list_versions(data_set_id, 1, Some(settings.query.max_page_size))
            .await
            .map(|page| {
                page.results
                    .iter()
                    .map(|v| {
                        let published = v
                            .published
                            .map(|p| p.format("%Y-%m-%d").to_string())
                            .unwrap_or_default();
                        format!("{:<8} {:<10} {}", v.version, format!("{:?}", v.status).to_lowercase(), published)
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            }),
    };

    match printed {
        Ok(text) => {
            println!("{}", text);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn render_error(e: serde_json::Error) -> dataquery::QueryError {
    dataquery::QueryError::Render(e.to_string())
}
