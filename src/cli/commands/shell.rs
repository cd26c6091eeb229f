//! `credvault shell` — interactive menu over a single open vault.
//!
//! The vault stays open for the whole session; failures are printed and
//! the menu is shown again.

use dialoguer::{Input, Select};

use crate::cli::commands::{add, register};
use crate::cli::output;
use crate::cli::{login, open_vault, prompt_new_password, Cli};
use crate::config::Settings;
use crate::errors::{CredVaultError, Result};
use crate::vault::{Session, Vault};

const GUEST_MENU: &[&str] = &["Register", "Log in", "Exit"];
const USER_MENU: &[&str] = &[
    "Add or update a password",
    "Show passwords for a service",
    "Show all passwords",
    "Log out",
    "Exit",
];

/// Execute the `shell` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let (vault, settings) = open_vault(cli)?;
    let result = run(&vault, &settings);
    vault.close();
    result
}

fn run(vault: &Vault, settings: &Settings) -> Result<()> {
    let mut session: Option<Session> = None;

    loop {
        let turn = match &session {
            Some(active) => user_turn(vault, active)?,
            None => guest_turn(vault, settings)?,
        };

        match turn {
            Turn::Continue => {}
            Turn::LoggedIn(started) => session = Some(started),
            Turn::LoggedOut => {
                if let Some(ended) = session.take() {
                    output::info(&format!("Logged out {}.", ended.username()));
                }
            }
            Turn::Exit => return Ok(()),
        }
    }
}

enum Turn {
    Continue,
    LoggedIn(Session),
    LoggedOut,
    Exit,
}

/// One pass of the logged-out menu.
fn guest_turn(vault: &Vault, settings: &Settings) -> Result<Turn> {
    match choose("What would you like to do?", GUEST_MENU)? {
        0 => {
            let username = ask("Username")?;
            let outcome = prompt_new_password()
                .and_then(|pw| register::enroll(vault, settings, &username, &pw, true));
            report(outcome);
        }
        1 => {
            let username = ask("Username")?;
            match login(vault, &username) {
                Ok(started) => {
                    output::success(&format!("Welcome, {username}."));
                    return Ok(Turn::LoggedIn(started));
                }
                Err(e) => output::error(&e.to_string()),
            }
        }
        _ => return Ok(Turn::Exit),
    }
    Ok(Turn::Continue)
}

/// One pass of the logged-in menu.
fn user_turn(vault: &Vault, session: &Session) -> Result<Turn> {
    match choose(&format!("[{}] Choose an action", session.username()), USER_MENU)? {
        0 => {
            let service = ask("Service")?;
            let service_username = ask("Login at that service")?;
            let outcome = add::prompt_service_password(&service).and_then(|pw| {
                add::store(vault, session, &service, &service_username, &pw)
            });
            report(outcome);
        }
        1 => {
            let service = ask("Service")?;
            match vault.get_by_service(session, &service) {
                Ok(creds) => output::print_credentials_table(&creds, false),
                Err(e) => output::error(&e.to_string()),
            }
        }
        2 => match vault.get_all(session) {
            Ok(creds) => output::print_credentials_table(&creds, true),
            Err(e) => output::error(&e.to_string()),
        },
        3 => return Ok(Turn::LoggedOut),
        _ => return Ok(Turn::Exit),
    }
    Ok(Turn::Continue)
}

fn report(outcome: Result<()>) {
    if let Err(e) = outcome {
        output::error(&e.to_string());
    }
}

fn choose(prompt: &str, items: &[&str]) -> Result<usize> {
    Select::new()
        .with_prompt(prompt)
        .items(items)
        .default(0)
        .interact_opt()
        .map_err(|e| CredVaultError::CommandFailed(format!("menu: {e}")))
        .map(|picked| picked.unwrap_or(items.len() - 1))
}

fn ask(prompt: &str) -> Result<String> {
    Input::<String>::new()
        .with_prompt(prompt)
        .interact_text()
        .map(|s| s.trim().to_string())
        .map_err(|e| CredVaultError::CommandFailed(format!("input prompt: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menus_end_with_exit() {
        assert_eq!(GUEST_MENU.last(), Some(&"Exit"));
        assert_eq!(USER_MENU.last(), Some(&"Exit"));
    }
}
