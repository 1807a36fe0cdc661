//! Authgate CLI — a thin presentation layer over the auth machine.
//!
//! Restores any persisted session, runs the requested operation through the
//! machine's public contract, and reports the resulting state plus the route
//! guard's verdict for the dashboard view.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use authgate::{
    guard, AuthConfig, AuthMachine, AuthState, HttpDirectory, SqliteSessionStore,
};

#[derive(Parser)]
#[command(name = "authgate", about = "Email/password authentication client", version)]
struct Cli {
    /// Base URL of the user directory.
    #[arg(long, global = true)]
    directory_url: Option<String>,

    /// Path of the persisted session database.
    #[arg(long, global = true)]
    session_db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an account and log into it.
    Signup {
        email: String,
        /// Password; prompted when omitted.
        #[arg(long)]
        password: Option<String>,
    },
    /// Verify credentials and start a session.
    Login {
        email: String,
        /// Password; prompted when omitted.
        #[arg(long)]
        password: Option<String>,
    },
    /// End the current session.
    Logout,
    /// Show the current session and guard verdict.
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let cli = Cli::parse();

    let mut config = AuthConfig::from_env();
    if let Some(url) = cli.directory_url {
        config.directory_url = url;
    }
    if let Some(path) = cli.session_db {
        config.session_db = path;
    }

    let directory = Arc::new(HttpDirectory::new(&config.directory_url, config.timeout())?);
    let store = Arc::new(SqliteSessionStore::new(&config.session_db)?);
    let auth = AuthMachine::new(directory, store);
    auth.restore();

    match cli.command {
        Command::Signup { email, password } => {
            let password = password_or_prompt(password, true)?;
            if let Err(e) = auth.signup(&email, &password.0, &password.1).await {
                eprintln!("signup failed: {e}");
                std::process::exit(1);
            }
            report(&auth.state());
        }
        Command::Login { email, password } => {
            let password = password_or_prompt(password, false)?;
            if let Err(e) = auth.login(&email, &password.0).await {
                eprintln!("login failed: {e}");
                std::process::exit(1);
            }
            report(&auth.state());
        }
        Command::Logout => {
            auth.logout();
            println!("logged out");
        }
        Command::Status => report(&auth.state()),
    }

    Ok(())
}

/// Resolve the password pair, prompting when none was given on the command
/// line. For signup the confirmation is prompted separately, mirroring the
/// two-field form; a flag-provided password confirms itself.
fn password_or_prompt(flag: Option<String>, confirm: bool) -> Result<(String, String)> {
    match flag {
        Some(p) => Ok((p.clone(), p)),
        None => {
            let password = dialoguer::Password::new()
                .with_prompt("Password")
                .interact()?;
            let confirmation = if confirm {
                dialoguer::Password::new()
                    .with_prompt("Confirm password")
                    .interact()?
            } else {
                password.clone()
            };
            Ok((password, confirmation))
        }
    }
}

/// Print the machine's state and where the guard would send the user.
fn report(state: &AuthState) {
    match state {
        AuthState::Authenticated { session } => {
            println!("authenticated as {}", session.email);
        }
        AuthState::Failed { reason } => println!("not authenticated: {reason}"),
        AuthState::Pending => println!("operation in flight"),
        AuthState::Idle => println!("not authenticated"),
    }
    println!(
        "dashboard view: {}",
        match guard::decide(state, guard::DASHBOARD_PATH) {
            guard::GuardDecision::Allow => "allowed".to_string(),
            guard::GuardDecision::RedirectTo(path) => format!("redirects to {path}"),
        }
    );
}
