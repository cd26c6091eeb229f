use clap::Parser;
use credvault::cli::commands::{add, audit_cmd, get, list, register, shell};
use credvault::cli::{output, Cli, Commands};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding the log filter (e.g. `credvault=debug`).
const LOG_ENV_VAR: &str = "CREDVAULT_LOG";

fn main() {
    init_tracing();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Register {
            ref username,
            no_qr,
        } => register::execute(&cli, username, no_qr),
        Commands::Add {
            ref service,
            ref service_username,
            ref user,
            ref value,
        } => add::execute(&cli, service, service_username, user, value.as_deref()),
        Commands::Get {
            ref service,
            ref user,
            json,
        } => get::execute(&cli, service, user, json),
        Commands::List { ref user, json } => list::execute(&cli, user, json),
        Commands::Audit {
            ref user,
            last,
            ref since,
        } => audit_cmd::execute(&cli, user, last, since.as_deref()),
        Commands::Shell => shell::execute(&cli),
    };

    if let Err(e) = result {
        tracing::debug!(kind = ?e.kind(), "command failed");
        output::error(&e.to_string());
        std::process::exit(1);
    }
}

fn init_tracing() {
    // Logs go to stderr so table and JSON output on stdout stay clean.
    let env_filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
