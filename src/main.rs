//! CLI entry point for managing Elasticsearch API keys.
//!
//! The desired key is described in a JSON resource file; identifiers returned
//! by the cluster are kept in a JSON state file between runs.

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use es_apikey::body::create_body;
use es_apikey::config::ClusterConfig;
use es_apikey::model::{ApiKeyResource, ApiKeyState};
use es_apikey::resource::{Action, ApiKeyManager};
use es_apikey::state::StateFile;
use std::ffi::OsStr;
use std::path::Path;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "es_apikey")]
#[command(about = "Manage Elasticsearch API keys from a declarative description", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct StateArgs {
    /// State file holding the managed key's identifiers
    #[arg(short, long, default_value = "apikey.state.json")]
    state: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the create request body for a resource file without contacting the cluster
    Body {
        /// JSON file describing the API key
        #[arg(short, long)]
        resource: String,
    },
    /// Create the API key and write the state file
    Create {
        #[arg(short, long)]
        resource: String,
        #[command(flatten)]
        state: StateArgs,
        #[command(flatten)]
        cluster: ClusterConfig,
    },
    /// Show the stored state
    Read {
        #[command(flatten)]
        state: StateArgs,
        /// Include api_key and encoded in the output
        #[arg(long, default_value_t = false)]
        show_secrets: bool,
    },
    /// Check the stored key against the cluster and drop the state if it is gone
    Refresh {
        #[command(flatten)]
        state: StateArgs,
        #[command(flatten)]
        cluster: ClusterConfig,
    },
    /// Replace the role descriptors of the stored key
    Update {
        #[arg(short, long)]
        resource: String,
        #[command(flatten)]
        state: StateArgs,
        #[command(flatten)]
        cluster: ClusterConfig,
    },
    /// Invalidate the stored key and remove the state file
    Delete {
        #[command(flatten)]
        state: StateArgs,
        #[command(flatten)]
        cluster: ClusterConfig,
    },
    /// Create, update or replace the key as needed to match the resource file
    Apply {
        #[arg(short, long)]
        resource: String,
        #[command(flatten)]
        state: StateArgs,
        #[command(flatten)]
        cluster: ClusterConfig,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let _guard = match init_logging() {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("failed to set up logging: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let cli = Cli::parse();

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<es_apikey::Error>() {
                Some(api_err) => error!(kind = api_err.summary(), "{e:#}"),
                None => error!("{e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

/// Coloured stderr output plus a JSON rolling log file.
fn init_logging() -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/es_apikey.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("es_apikey.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .try_init()?;

    Ok(guard)
}

async fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Body { resource } => {
            let resource = ApiKeyResource::load(&resource)?;
            println!("{}", serde_json::to_string_pretty(&create_body(&resource))?);
        }
        Commands::Create {
            resource,
            state,
            cluster,
        } => {
            let desired = ApiKeyResource::load(&resource)?;
            let state_file = StateFile::new(state.state);
            if let Some(existing) = state_file.load()? {
                bail!(
                    "state file {} already tracks API key {}; use update or apply",
                    state_file.path().display(),
                    existing.id
                );
            }

            let manager = ApiKeyManager::new(cluster.connect()?);
            let created = manager.create(&desired).await?;
            state_file
                .save(&created)
                .context("API key was created but its state could not be saved")?;
            info!(id = %created.id, state = %state_file.path().display(), "Created");
        }
        Commands::Read {
            state,
            show_secrets,
        } => {
            let state_file = StateFile::new(state.state);
            let stored = require_state(&state_file)?;
            print_state(&stored, show_secrets)?;
        }
        Commands::Refresh { state, cluster } => {
            let state_file = StateFile::new(state.state);
            let stored = require_state(&state_file)?;

            let manager = ApiKeyManager::new(cluster.connect()?);
            match manager.refresh(&stored).await? {
                Some(current) => info!(id = %current.id, "API key is live"),
                None => {
                    state_file.remove()?;
                    warn!(id = %stored.id, "API key is gone, state removed");
                }
            }
        }
        Commands::Update {
            resource,
            state,
            cluster,
        } => {
            let desired = ApiKeyResource::load(&resource)?;
            let state_file = StateFile::new(state.state);
            let stored = require_state(&state_file)?;

            let manager = ApiKeyManager::new(cluster.connect()?);
            let updated = manager.update(&stored, &desired).await?;
            state_file.save(&updated)?;
        }
        Commands::Delete { state, cluster } => {
            let state_file = StateFile::new(state.state);
            let stored = require_state(&state_file)?;

            let manager = ApiKeyManager::new(cluster.connect()?);
            manager.delete(&stored).await?;
            state_file.remove()?;
        }
        Commands::Apply {
            resource,
            state,
            cluster,
        } => {
            let desired = ApiKeyResource::load(&resource)?;
            let state_file = StateFile::new(state.state);
            let prior = state_file.load()?;

            let manager = ApiKeyManager::new(cluster.connect()?);
            let applied = manager.apply(prior.as_ref(), &desired).await?;
            if applied.action != Action::Noop {
                state_file
                    .save(&applied.state)
                    .context("API key was changed but its state could not be saved")?;
            }
            if let Some(old_id) = &applied.orphaned {
                warn!(old_id = %old_id, "Previous API key could not be invalidated and is still valid");
            }
            info!(action = ?applied.action, id = %applied.state.id, "Applied");
        }
    }

    Ok(())
}

fn require_state(state_file: &StateFile) -> Result<ApiKeyState> {
    state_file.load()?.with_context(|| {
        format!(
            "no state at {}; nothing is managed yet",
            state_file.path().display()
        )
    })
}

fn print_state(state: &ApiKeyState, show_secrets: bool) -> Result<()> {
    let mut value = serde_json::to_value(state)?;
    if !show_secrets {
        for field in ["api_key", "encoded"] {
            value[field] = serde_json::Value::String("<redacted>".into());
        }
    }
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
