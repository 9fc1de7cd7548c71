use anyhow::Context;
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use serde::Serialize;
use std::env;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use dodo_core::config::{Config, LogConfig, resolve_config};
use dodo_core::db::{migrations, open_database};
use dodo_server::{AppState, Store, build_schema, router, schema_sdl};

#[derive(Parser)]
#[command(
    name = "dodo",
    author,
    version,
    about = "dodo: GraphQL task tracker for teams",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file. Defaults to ./dodo.toml, then the user config dir.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the GraphQL HTTP server.
    Serve(ServeArgs),
    /// Create or upgrade the database schema.
    Migrate(MigrateArgs),
    /// Print the GraphQL schema (SDL).
    Schema,
    /// Generate shell completions.
    Completions {
        /// Target shell for completion script generation.
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
struct ServeArgs {
    /// Listen address, e.g. 127.0.0.1:8080.
    #[arg(long, value_name = "ADDR")]
    bind: Option<String>,

    /// SQLite database file.
    #[arg(long, value_name = "PATH")]
    db: Option<PathBuf>,
}

#[derive(Args)]
struct MigrateArgs {
    /// SQLite database file.
    #[arg(long, value_name = "PATH")]
    db: Option<PathBuf>,

    /// Emit JSON output instead of human-readable text.
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct MigrateReport {
    path: String,
    schema_version: u32,
}

fn init_tracing(log: &LogConfig, verbose: bool) {
    let filter = EnvFilter::try_from_env("DODO_LOG").unwrap_or_else(|_| {
        let directive = if verbose || env::var("DEBUG").is_ok() {
            "dodo=debug,info"
        } else {
            log.filter.as_deref().unwrap_or("dodo=info,warn")
        };
        EnvFilter::new(directive)
    });

    let format = env::var("DODO_LOG_FORMAT")
        .ok()
        .or_else(|| log.format.clone())
        .unwrap_or_else(|| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

async fn serve(config: &Config, args: ServeArgs) -> anyhow::Result<()> {
    let path = args.db.unwrap_or_else(|| config.database_path());
    let bind = args.bind.unwrap_or_else(|| config.server.bind.clone());

    let store = Store::open(&path)?;
    let state = AppState::new(
        build_schema(store),
        config.server.graphiql,
        config.server.default_actor.clone(),
    );

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("bind {bind}"))?;
    info!(
        addr = %listener.local_addr().context("read listen address")?,
        db = %path.display(),
        graphiql = config.server.graphiql,
        "dodo listening"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serve http")?;
    info!("dodo stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for shutdown signal: {e}");
    }
}

fn migrate(config: &Config, args: &MigrateArgs) -> anyhow::Result<()> {
    let path = args.db.clone().unwrap_or_else(|| config.database_path());
    let conn = open_database(&path)?;
    let report = MigrateReport {
        path: path.display().to_string(),
        schema_version: migrations::current_schema_version(&conn)?,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "{} is at schema version {}",
            report.path, report.schema_version
        );
    }
    Ok(())
}

fn print_completions(shell: Shell) {
    let mut command = Cli::command();
    generate(shell, &mut command, "dodo", &mut std::io::stdout());
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(cli.config.as_deref())?;
    init_tracing(&config.log, cli.verbose);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    match cli.command {
        Commands::Serve(args) => serve(&config, args).await,
        Commands::Migrate(args) => migrate(&config, &args),
        Commands::Schema => {
            print!("{}", schema_sdl());
            Ok(())
        }
        Commands::Completions { shell } => {
            print_completions(shell);
            Ok(())
        }
    }
}
