use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::sync::Arc;
use tracing::{info, warn};

use crate::app::{app, AppState};
use crate::auth::{CredentialService, Role, Signup, TokenSettings};
use crate::config::{config, AppConfig};
use crate::database::{DatabaseManager, PgStore};

#[derive(Parser)]
#[command(name = "hospital-api")]
#[command(about = "Hospital management API - sessions, role gates and shaped record lists")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub serve: ServeArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Create an Admin account in the configured database")]
    CreateAdmin(AdminArgs),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    #[arg(long, help = "Port to listen on (default: $PORT, then 3000)")]
    pub port: Option<u16>,

    #[arg(long, help = "Keep all data in process memory instead of Postgres")]
    pub memory: bool,
}

#[derive(Args, Debug)]
pub struct AdminArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub email: String,

    #[arg(long, help = "Password (default: $ADMIN_PASSWORD)")]
    pub password: Option<String>,
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = config();
    config.validate().context("invalid configuration")?;

    match cli.command {
        None => serve(cli.serve, config).await,
        Some(Commands::CreateAdmin(args)) => create_admin(args, config).await,
    }
}

async fn connect_store(config: &AppConfig) -> anyhow::Result<Arc<PgStore>> {
    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("failed to open database pool")?;
    let store = Arc::new(PgStore::new(pool));
    store.ensure_schema().await.context("failed to prepare document tables")?;
    Ok(store)
}

async fn serve(args: ServeArgs, config: &'static AppConfig) -> anyhow::Result<()> {
    info!("Starting hospital API in {:?} mode", config.environment);
    if crate::is_production!() && !config.security.cookie_secure {
        warn!("session cookies are not marked Secure in production");
    }

    let state = if args.memory {
        warn!("using the in-memory store; data is lost on exit");
        AppState::in_memory(config).0
    } else {
        let store = connect_store(config).await?;
        AppState::new(store.clone(), store, config)
    };

    tokio::task::spawn_blocking(crate::auth::password::prime_dummy_hash)
        .await
        .context("failed to prepare credential checks")?;

    let port = args
        .port
        .or_else(|| std::env::var("PORT").ok().and_then(|s| s.parse().ok()))
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!("hospital API listening on http://{}", bind_addr);
    axum::serve(listener, app(state)).await.context("server error")?;
    Ok(())
}

async fn create_admin(args: AdminArgs, config: &AppConfig) -> anyhow::Result<()> {
    let password = match args.password {
        Some(p) => p,
        None => std::env::var("ADMIN_PASSWORD").context("--password or ADMIN_PASSWORD is required")?,
    };

    let store = connect_store(config).await?;
    let credentials = CredentialService::new(store, TokenSettings::from_config(&config.security));

    let admin = credentials
        .provision(Signup {
            name: args.name,
            email: args.email,
            password: password.clone(),
            password_confirm: password,
            role: Role::Admin,
        })
        .await?;

    info!(id = %admin.id, email = %admin.email, "admin account created");
    println!("{}", admin.id);
    Ok(())
}
