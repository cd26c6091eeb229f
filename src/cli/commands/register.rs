//! `credvault register` — create a user and enroll their authenticator app.

use crate::cli::output;
use crate::cli::{open_vault, prompt_new_password, qr, Cli};
use crate::config::Settings;
use crate::crypto::totp;
use crate::errors::Result;
use crate::vault::Vault;

/// Execute the `register` command.
pub fn execute(cli: &Cli, username: &str, no_qr: bool) -> Result<()> {
    let (vault, settings) = open_vault(cli)?;
    let password = prompt_new_password()?;

    let result = enroll(&vault, &settings, username, &password, !no_qr);
    vault.close();
    result
}

/// Register `username` and print the one-time enrollment details.
///
/// Shared with the interactive shell.
pub fn enroll(
    vault: &Vault,
    settings: &Settings,
    username: &str,
    password: &str,
    show_qr: bool,
) -> Result<()> {
    let secret = vault.register(username, password)?;
    let uri = totp::provisioning_uri(&secret, username, &settings.otp_issuer);

    output::success(&format!("User '{username}' registered."));
    output::warning("The OTP secret below is shown only once. Add it to your authenticator app now.");
    println!("  Secret: {}", secret.as_str());
    println!("  URI:    {uri}");

    if show_qr {
        match qr::render(&uri) {
            Ok(art) => {
                output::info("Scan this QR code with your authenticator app:");
                println!("{art}");
            }
            Err(e) => output::warning(&e.to_string()),
        }
    }

    output::tip(&format!(
        "Store a password with: credvault add <service> <login> --user {username}"
    ));
    Ok(())
}
