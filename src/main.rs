//! simple-auth binary.
//!
//! ```text
//! simple-auth [serve]                              run the HTTP server
//! simple-auth create-user <USER> <PASS> [--migrate] add a user to the store
//! ```

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use std::sync::Arc;

use simple_auth::config::{AppConfig, DbEngine};
use simple_auth::credentials::{self, Argon2Hasher};
use simple_auth::gateway::run_server;
use simple_auth::logging::init_logging;
use simple_auth::service::AuthService;
use simple_auth::session::{SessionManager, SessionRegistry, TokenCodec};

#[derive(Parser)]
#[command(
    name = "simple-auth",
    version,
    about = "Bearer token authentication service"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Hash a password and save a new user directly to the credential store
    CreateUser {
        username: String,
        password: String,
        /// Create the users table first
        #[arg(long)]
        migrate: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load().context("failed to load configuration")?;
    let _log_guard = init_logging(&config);

    tracing::info!(
        release = ?config.release,
        git = env!("GIT_HASH"),
        "Starting simple-auth"
    );

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::CreateUser {
            username,
            password,
            migrate,
        } => create_user(config, &username, &password, migrate).await,
    }
}

fn build_service(
    config: &AppConfig,
    store: Arc<dyn credentials::CredentialStore>,
) -> anyhow::Result<AuthService> {
    let registry = Arc::new(SessionRegistry::new());
    let codec = TokenCodec::new(config.session.jwt_secret.as_bytes(), config.token_ttl());
    let sessions = SessionManager::new(codec, registry);
    AuthService::new(store, Argon2Hasher::default(), sessions)
        .context("failed to initialize password hasher")
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    if config.uses_default_secret() {
        tracing::warn!("JWT_SECRET is not set; tokens are signed with the built-in default secret");
    }

    let store = credentials::connect(&config.database, config.database.migrate)
        .await
        .context("failed to initialize credential store")?;
    let auth = Arc::new(build_service(&config, store)?);

    tracing::info!(
        ttl_secs = config.session.token_ttl_secs,
        base_path = %config.base_path(),
        "Session service ready"
    );

    run_server(&config, auth).await
}

async fn create_user(
    config: AppConfig,
    username: &str,
    password: &str,
    migrate: bool,
) -> anyhow::Result<()> {
    if config.database.engine == DbEngine::Memory {
        bail!("create-user requires a persistent credential store (DB_ENGINE=postgres)");
    }

    let store = credentials::connect(&config.database, migrate || config.database.migrate)
        .await
        .context("failed to initialize credential store")?;
    let service = build_service(&config, store)?;

    let created = service.create_user(username, password).await;
    service.close().await;
    created.with_context(|| format!("failed to create user {username}"))?;

    tracing::info!(username, "User created successfully");
    Ok(())
}
