//! stockboard - command-line client for the stockboard backend.
//!
//! Logs in against the backend, keeps the session token between runs and
//! issues authenticated JSON requests (stock lists, market data,
//! backtests) from the terminal.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use stockboard_core::api::ApiError;
use stockboard_core::auth::{self, AuthService, Credentials};
use stockboard_core::navigation::RecordingNavigator;
use stockboard_core::{ApiClient, Config, TokenStore};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "stockboard", version, about = "Command-line client for the stockboard backend")]
struct Cli {
    /// Backend base URL (overrides config and STOCKBOARD_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and store the session token
    Login {
        #[arg(short, long)]
        username: Option<String>,
    },
    /// Forget the stored session token
    Logout,
    /// Show whether a session token is stored
    Status,
    /// GET a path and print the JSON response
    Get { path: String },
    /// POST JSON to a path
    Post {
        path: String,
        #[arg(short, long)]
        data: Option<String>,
    },
    /// PUT JSON to a path
    Put {
        path: String,
        #[arg(short, long)]
        data: Option<String>,
    },
    /// DELETE a path
    Delete { path: String },
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();
    let cli = Cli::parse();

    let mut config = Config::load().context("Failed to load config")?;
    if let Some(url) = cli.base_url {
        config.base_url = url;
    }
    debug!(base_url = %config.base_url, backend = ?config.token_backend, "Config loaded");

    let store = auth::open_store(&config).context("Failed to open token store")?;
    let navigator = Arc::new(RecordingNavigator::new());
    let api = ApiClient::builder(config.clone())
        .token_store(store)
        .navigator(navigator.clone())
        .build()
        .context("Failed to create API client")?;
    let auth = AuthService::new(api);

    let is_login = matches!(cli.command, Command::Login { .. });
    let result = run(cli.command, &mut config, &auth).await;

    if let Some(hint) = session_expired_hint(is_login, navigator.last()) {
        eprintln!("{}", hint);
    }

    result
}

/// Hint printed after the backend rejected our token (already cleared).
/// A rejected login reports its own error instead.
fn session_expired_hint(is_login: bool, redirect: Option<String>) -> Option<String> {
    if is_login {
        return None;
    }
    redirect.map(|route| {
        format!("Session expired ({}). Run `stockboard login` to sign in again.", route)
    })
}

async fn run(command: Command, config: &mut Config, auth: &AuthService) -> Result<()> {
    let api = auth.api();
    match command {
        Command::Login { username } => login(config, auth, username).await,
        Command::Logout => {
            auth.logout().context("Failed to remove stored token")?;
            println!("Logged out.");
            Ok(())
        }
        Command::Status => status(config, auth),
        Command::Get { path } => print_json(api.get(&path).await),
        Command::Delete { path } => print_json(api.delete(&path).await),
        Command::Post { path, data } => {
            let body = parse_body(data.as_deref())?;
            print_json(api.post(&path, &body).await)
        }
        Command::Put { path, data } => {
            let body = parse_body(data.as_deref())?;
            print_json(api.put(&path, &body).await)
        }
    }
}

async fn login(config: &mut Config, auth: &AuthService, username: Option<String>) -> Result<()> {
    let username = match username.or_else(|| config.last_username.clone()) {
        Some(name) => name,
        None => prompt("Username: ")?,
    };
    if username.is_empty() {
        anyhow::bail!("Username required");
    }
    let password = rpassword::prompt_password("Password: ")?;

    auth.login(&Credentials::new(username.clone(), password)).await?;
    info!(username = %username, "Logged in");

    config.last_username = Some(username.clone());
    if let Err(e) = config.save() {
        tracing::warn!(error = %e, "Failed to save config");
    }

    println!("Logged in as {}.", username);
    Ok(())
}

fn status(config: &Config, auth: &AuthService) -> Result<()> {
    println!("Backend: {}", auth.api().base_url());
    if !auth.is_authenticated() {
        println!("Not logged in.");
        return Ok(());
    }

    let stored_at = auth
        .api()
        .token_store()
        .stored_at()
        .context("Failed to read token store")?;
    match (&config.last_username, stored_at) {
        (Some(user), Some(at)) => println!("Logged in as {} (token stored {}).", user, at.to_rfc3339()),
        (Some(user), None) => println!("Logged in as {}.", user),
        (None, Some(at)) => println!("Logged in (token stored {}).", at.to_rfc3339()),
        (None, None) => println!("Logged in."),
    }
    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    eprint!("{}", label);
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn parse_body(data: Option<&str>) -> Result<Value> {
    match data {
        Some(raw) => serde_json::from_str(raw).context("--data is not valid JSON"),
        None => Ok(Value::Object(Default::default())),
    }
}

fn print_json(result: Result<Value, ApiError>) -> Result<()> {
    let value = match result {
        Ok(value) => value,
        Err(e) => {
            if let Some(detail) = e.detail() {
                anyhow::bail!("{} ({})", e, detail);
            }
            return Err(e.into());
        }
    };
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
