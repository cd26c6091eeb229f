//! CLI module — Clap argument parser, prompts, output helpers, and command implementations.

pub mod commands;
pub mod output;
pub mod qr;

use std::path::PathBuf;

use clap::Parser;
use zeroize::Zeroizing;

use crate::config::Settings;
use crate::errors::{CredVaultError, Result};
use crate::vault::{Session, Vault};

/// Environment variable that replaces the password prompt.
pub const PASSWORD_ENV_VAR: &str = "CREDVAULT_PASSWORD";

/// Environment variable that replaces the OTP prompt.
pub const OTP_ENV_VAR: &str = "CREDVAULT_OTP";

/// CredVault CLI: password manager with TOTP login.
#[derive(Parser)]
#[command(
    name = "credvault",
    about = "Credential vault with password + TOTP login and encrypted service passwords",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: ./credvault.toml if present)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// SQLite database path or :memory: (overrides config)
    #[arg(long, global = true)]
    pub database: Option<String>,

    /// Encryption key file (overrides config)
    #[arg(long, global = true)]
    pub key_file: Option<String>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Register a new user and enroll an authenticator app
    Register {
        /// Username to register
        username: String,
        /// Do not draw the enrollment QR code
        #[arg(long)]
        no_qr: bool,
    },

    /// Store a service password (add or update)
    Add {
        /// Service name (e.g. github)
        service: String,
        /// Login at that service
        service_username: String,
        /// Vault user to log in as
        #[arg(short, long, env = "CREDVAULT_USER")]
        user: String,
        /// Service password (omit for interactive prompt)
        #[arg(long)]
        value: Option<String>,
    },

    /// Show the stored passwords for one service
    Get {
        /// Service name
        service: String,
        /// Vault user to log in as
        #[arg(short, long, env = "CREDVAULT_USER")]
        user: String,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show every stored password
    List {
        /// Vault user to log in as
        #[arg(short, long, env = "CREDVAULT_USER")]
        user: String,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// View your audit log
    Audit {
        /// Vault user to log in as
        #[arg(short, long, env = "CREDVAULT_USER")]
        user: String,
        /// Number of entries to show (default: 50)
        #[arg(long, default_value = "50")]
        last: usize,
        /// Show entries since a duration ago (e.g. 7d, 24h, 30m)
        #[arg(long)]
        since: Option<String>,
    },

    /// Interactive menu: register, log in, then manage passwords
    Shell,
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Resolve settings: config file, then environment, then CLI flags.
pub fn load_settings(cli: &Cli) -> Result<(Settings, PathBuf)> {
    let cwd = std::env::current_dir()?;

    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(&cwd.join(path))?,
        None => Settings::load(&cwd)?,
    };
    settings.apply_env_overrides(|name| std::env::var(name).ok());

    if let Some(db) = &cli.database {
        settings.database = db.clone();
    }
    if let Some(kf) = &cli.key_file {
        settings.key_file = kf.clone();
    }

    Ok((settings, cwd))
}

/// Open the vault the CLI arguments point at.
pub fn open_vault(cli: &Cli) -> Result<(Vault, Settings)> {
    let (settings, cwd) = load_settings(cli)?;
    let vault = Vault::open(&settings, &cwd)?;
    Ok((vault, settings))
}

/// Get the login password: `CREDVAULT_PASSWORD` or an interactive prompt.
///
/// Returns `Zeroizing<String>` so the password is wiped from memory on drop.
pub fn prompt_password() -> Result<Zeroizing<String>> {
    if let Some(pw) = env_secret(PASSWORD_ENV_VAR) {
        return Ok(pw);
    }

    let pw = dialoguer::Password::new()
        .with_prompt("Password")
        .interact()
        .map_err(|e| CredVaultError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Prompt for a new password with confirmation (used during `register`).
///
/// Also respects `CREDVAULT_PASSWORD` for scripted usage.
pub fn prompt_new_password() -> Result<Zeroizing<String>> {
    if let Some(pw) = env_secret(PASSWORD_ENV_VAR) {
        return Ok(pw);
    }

    let pw = dialoguer::Password::new()
        .with_prompt("Choose a password")
        .with_confirmation("Confirm password", "Passwords do not match, try again")
        .interact()
        .map_err(|e| CredVaultError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Get the current OTP code: `CREDVAULT_OTP` or an interactive prompt.
pub fn prompt_otp() -> Result<Zeroizing<String>> {
    if let Some(code) = env_secret(OTP_ENV_VAR) {
        return Ok(code);
    }

    let code: String = dialoguer::Input::new()
        .with_prompt("OTP code")
        .interact_text()
        .map_err(|e| CredVaultError::CommandFailed(format!("OTP prompt: {e}")))?;
    Ok(Zeroizing::new(code))
}

/// Prompt for password and OTP code and authenticate `username`.
pub fn login(vault: &Vault, username: &str) -> Result<Session> {
    let password = prompt_password()?;
    let code = prompt_otp()?;
    vault.authenticate(username, &password, &code)
}

fn env_secret(name: &str) -> Option<Zeroizing<String>> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .map(Zeroizing::new)
}
