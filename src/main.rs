use anyhow::{Context, Result};
use std::path::PathBuf;

use cattrack::config::Config;
use cattrack::db::Database;
use cattrack::http::{self, AppState};
use cattrack::logging;

#[derive(Default)]
struct Args {
    config_path: Option<PathBuf>,
    port: Option<u16>,
    print_config: bool,
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut parsed = Args::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("cattrack {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--print-config" => {
                parsed.print_config = true;
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    parsed.config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                } else {
                    eprintln!("Error: --config requires a path argument");
                    std::process::exit(1);
                }
            }
            "--port" | "-p" => match args.get(i + 1).and_then(|p| p.parse().ok()) {
                Some(port) => {
                    parsed.port = Some(port);
                    i += 1;
                }
                None => {
                    eprintln!("Error: --port requires a port number");
                    std::process::exit(1);
                }
            },
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_help();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    parsed
}

fn print_help() {
    println!(
        r#"cattrack - community cat sighting tracker

USAGE:
    cattrack [OPTIONS]

OPTIONS:
    --config, -c PATH   Path to config file
    --port, -p PORT     Port to listen on (overrides config and PORT)
    --print-config      Print the effective configuration and exit
    --version, -V       Show version
    --help, -h          Show this help message

ENVIRONMENT:
    CATTRACK_CONFIG     Path to config file (overrides default location)
    CATTRACK_LOG        Log filter (trace, debug, info, warn, error)
    DATABASE_URL        PostgreSQL connection URL; selects the postgresql backend
    PORT                Port to listen on

Config file location: $XDG_CONFIG_HOME/cattrack/config.toml"#
    );
}

fn main() -> Result<()> {
    let args = parse_args();

    let mut config = match &args.config_path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    config.apply_env_overrides();
    if let Some(port) = args.port {
        config.server.port = port;
    }

    if args.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    logging::init(&config.logging)?;

    // The database is opened before the runtime starts; the postgres client
    // is blocking and must not be driven from async context.
    let db = Database::open(&config.database).context("Failed to open database")?;
    db.initialize().context("Failed to create database schema")?;
    tracing::info!(backend = db.backend_name(), "Database ready");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(async move {
        let bind_addr = config.server.bind_addr();
        let listener = tokio::net::TcpListener::bind(&bind_addr)
            .await
            .with_context(|| format!("Failed to bind {bind_addr}"))?;
        let router = http::build_router(AppState::new(db), config.server.max_upload_bytes);
        http::serve(listener, router).await.context("Server error")?;
        tracing::info!("Server stopped");
        Ok::<(), anyhow::Error>(())
    })
}
