//! `credvault list` — display every stored credential in a table.

use crate::cli::output;
use crate::cli::{login, open_vault, Cli};
use crate::errors::Result;

/// Execute the `list` command.
pub fn execute(cli: &Cli, user: &str, json: bool) -> Result<()> {
    let (vault, _) = open_vault(cli)?;
    let session = login(&vault, user)?;

    let credentials = vault.get_all(&session);
    vault.close();
    let credentials = credentials?;

    if json {
        println!("{}", output::credentials_json(&credentials));
    } else {
        output::info(&format!(
            "{} credential(s) saved by {user}",
            credentials.len()
        ));
        output::print_credentials_table(&credentials, true);
    }

    Ok(())
}
