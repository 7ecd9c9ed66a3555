//! ChatOn application binary - composition root.
//!
//! Ties the ChatOn crates into a single executable:
//! 1. Parse CLI flags and load configuration from TOML
//! 2. Open the SQLite database (migrations run on open)
//! 3. Build the shared state: repositories, action registry, sessions, chat relay
//! 4. Start the axum server (action webhook, chat relay, shop API)

mod cli;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use chaton_api::routes;
use chaton_api::state::AppState;
use chaton_core::config::ChatonConfig;
use chaton_core::types::Role;
use chaton_storage::{Database, UserRepository};

use cli::{CliArgs, Command};

/// Expand ~ to home directory in a path string.
fn resolve_data_dir(data_dir: &str) -> PathBuf {
    if data_dir.starts_with("~/") || data_dir.starts_with("~\\") {
        #[cfg(target_os = "windows")]
        let home = std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string());
        #[cfg(not(target_os = "windows"))]
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(&data_dir[2..])
    } else {
        PathBuf::from(data_dir)
    }
}

/// Load the config file and fold CLI/env overrides into it.
fn load_config(args: &CliArgs) -> (ChatonConfig, PathBuf) {
    let config_file = args.resolve_config_path();
    let mut config = ChatonConfig::load_or_default(&config_file);

    config.general.port = args.resolve_port(config.general.port);
    if let Some(dir) = args.resolve_data_dir() {
        config.general.data_dir = dir;
    }
    if let Some(level) = args.resolve_log_level() {
        config.general.log_level = level;
    }
    (config, config_file)
}

fn promote(db: Arc<Database>, username: &str) -> Result<(), Box<dyn std::error::Error>> {
    let users = UserRepository::new(db);
    if users.set_role(username, Role::Admin)? {
        tracing::info!(username, "Account promoted to admin");
        Ok(())
    } else {
        Err(format!("No account named '{}'", username).into())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();
    let (config, config_file) = load_config(&args);

    // Tracing: RUST_LOG wins, then --log-level / config.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!("Starting ChatOn v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    // Storage.
    let data_dir = resolve_data_dir(&config.general.data_dir);
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        tracing::error!(path = %data_dir.display(), error = %e, "Failed to create data directory");
        return Err(e.into());
    }

    let db_path = data_dir.join("chaton.db");
    let db = Database::new(&db_path)?;
    tracing::info!(path = %db_path.display(), "SQLite database opened");

    if let Some(Command::Promote { username }) = &args.command {
        return promote(Arc::new(db), username);
    }

    let state = AppState::new(config.clone(), db)?;
    tracing::info!(
        actions = state.actions.len(),
        nlu_url = %state.relay.url(),
        "Action server ready"
    );

    if let Err(e) = routes::start_server(&config, state).await {
        tracing::error!(port = config.general.port, error = %e, "Server stopped");
        tracing::error!("Try: CHATON_PORT={} chaton", config.general.port.saturating_add(1));
        return Err(e.into());
    }

    Ok(())
}
