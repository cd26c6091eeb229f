//! `credvault add` — add or update a service password.

use std::io::{self, IsTerminal, Read};

use zeroize::Zeroizing;

use crate::cli::output;
use crate::cli::{login, open_vault, Cli};
use crate::errors::{CredVaultError, Result};
use crate::vault::{Session, Vault, WriteOutcome};

/// Execute the `add` command.
pub fn execute(
    cli: &Cli,
    service: &str,
    service_username: &str,
    user: &str,
    value: Option<&str>,
) -> Result<()> {
    let (vault, _) = open_vault(cli)?;
    let session = login(&vault, user)?;

    // Determine the password from one of three sources.
    let service_password = if let Some(v) = value {
        // Source 1: Inline value on the command line.
        output::warning("Value provided on command line — it may appear in shell history.");
        Zeroizing::new(v.to_string())
    } else if !io::stdin().is_terminal() {
        // Source 2: Piped input (stdin is not a terminal).
        let mut buf = Zeroizing::new(String::new());
        io::stdin().read_to_string(&mut buf)?;
        Zeroizing::new(buf.trim_end().to_string())
    } else {
        // Source 3: Interactive secure prompt (default).
        prompt_service_password(service)?
    };

    let result = store(&vault, &session, service, service_username, &service_password);
    vault.close();
    result
}

/// Hidden prompt for a service password.
pub fn prompt_service_password(service: &str) -> Result<Zeroizing<String>> {
    dialoguer::Password::new()
        .with_prompt(format!("Password for {service}"))
        .interact()
        .map(Zeroizing::new)
        .map_err(|e| CredVaultError::CommandFailed(format!("input prompt: {e}")))
}

/// Write the credential and report whether it was added or updated.
///
/// Shared with the interactive shell.
pub fn store(
    vault: &Vault,
    session: &Session,
    service: &str,
    service_username: &str,
    service_password: &str,
) -> Result<()> {
    match vault.put(session, service, service_username, service_password)? {
        WriteOutcome::Inserted => output::success(&format!(
            "Password for {service} ({service_username}) was added."
        )),
        WriteOutcome::Updated => output::success(&format!(
            "Password for {service} ({service_username}) was updated."
        )),
    }
    Ok(())
}
