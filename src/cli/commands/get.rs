//! `credvault get` — show the stored passwords for one service.

use crate::cli::output;
use crate::cli::{login, open_vault, Cli};
use crate::errors::Result;

/// Execute the `get` command.
pub fn execute(cli: &Cli, service: &str, user: &str, json: bool) -> Result<()> {
    let (vault, _) = open_vault(cli)?;
    let session = login(&vault, user)?;

    let credentials = vault.get_by_service(&session, service);
    vault.close();
    let credentials = credentials?;

    if json {
        println!("{}", output::credentials_json(&credentials));
    } else {
        output::info(&format!(
            "{} credential(s) for {service}",
            credentials.len()
        ));
        output::print_credentials_table(&credentials, false);
    }

    Ok(())
}
