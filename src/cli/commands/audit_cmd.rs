//! `credvault audit` — display your own audit log.
//!
//! Usage:
//!   credvault audit -u alice               # show last 50 entries
//!   credvault audit -u alice --last 20     # show last 20
//!   credvault audit -u alice --since 7d    # entries from last 7 days

use chrono::Utc;

use crate::audit::{self, AuditEntry};
use crate::cli::output;
use crate::cli::{login, open_vault, Cli};
use crate::errors::{CredVaultError, Result};

/// Execute the `audit` command.
pub fn execute(cli: &Cli, user: &str, last: usize, since: Option<&str>) -> Result<()> {
    let since_dt = match since {
        Some(s) => Some(parse_duration(s)?),
        None => None,
    };

    let (vault, _) = open_vault(cli)?;
    let session = login(&vault, user)?;

    let entries = vault.audit_entries(&session, last, since_dt);
    vault.close();
    let entries = entries?;

    if entries.is_empty() {
        output::info("No audit entries found.");
        return Ok(());
    }

    print_audit_table(&entries);

    Ok(())
}

/// Parse a human-friendly duration string like "7d", "24h", "30m".
fn parse_duration(input: &str) -> Result<chrono::DateTime<Utc>> {
    let input = input.trim();

    let (num_str, unit) = if let Some(s) = input.strip_suffix('d') {
        (s, 'd')
    } else if let Some(s) = input.strip_suffix('h') {
        (s, 'h')
    } else if let Some(s) = input.strip_suffix('m') {
        (s, 'm')
    } else {
        return Err(CredVaultError::InvalidInput(format!(
            "invalid duration '{input}' — use format like 7d, 24h, or 30m"
        )));
    };

    let num: i64 = num_str.parse().map_err(|_| {
        CredVaultError::InvalidInput(format!(
            "invalid duration '{input}' — number part is not valid"
        ))
    })?;

    let duration = match unit {
        'd' => chrono::TimeDelta::try_days(num),
        'h' => chrono::TimeDelta::try_hours(num),
        _ => chrono::TimeDelta::try_minutes(num),
    };

    duration
        .and_then(|d| Utc::now().checked_sub_signed(d))
        .ok_or_else(|| {
            CredVaultError::InvalidInput(format!("invalid duration '{input}' — value is out of range"))
        })
}

/// Print audit entries in a formatted table.
pub fn print_audit_table(entries: &[AuditEntry]) {
    use comfy_table::{ContentArrangement, Table};
    use console::style;

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Time", "Operation", "Service", "Details"]);

    for entry in entries {
        let time = entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string();
        let op = colorize_operation(&entry.operation);
        let service = entry.service.as_deref().unwrap_or("-");
        let details = entry.details.as_deref().unwrap_or("-");

        table.add_row(vec![time, op, service.to_string(), details.to_string()]);
    }

    println!(
        "{}",
        style(format!("{} audit entries:", entries.len())).bold()
    );
    println!("{table}");
}

/// Colorize operation names for display.
fn colorize_operation(op: &str) -> String {
    use console::style;

    match op {
        audit::OP_REGISTER => style(op).green().to_string(),
        audit::OP_LOGIN => style(op).cyan().to_string(),
        audit::OP_LOGIN_FAILED => style(op).red().to_string(),
        audit::OP_PUT => style(op).blue().to_string(),
        audit::OP_READ => style(op).magenta().to_string(),
        _ => op.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_days() {
        let dt = parse_duration("7d").unwrap();
        let diff = Utc::now() - dt;
        assert!((diff.num_days() - 7).abs() <= 1);
    }

    #[test]
    fn parse_duration_hours_and_minutes() {
        let diff = Utc::now() - parse_duration("24h").unwrap();
        assert!((diff.num_hours() - 24).abs() <= 1);

        let diff = Utc::now() - parse_duration(" 30m ").unwrap();
        assert!((diff.num_minutes() - 30).abs() <= 1);
    }

    #[test]
    fn parse_duration_out_of_range_is_an_error() {
        for input in ["999999999999999d", "9223372036854775807h", "-999999999999999m"] {
            let err = parse_duration(input).unwrap_err();
            assert!(err.to_string().contains("out of range"), "{input}");
        }
    }

    #[test]
    fn parse_duration_invalid() {
        assert!(parse_duration("abc").is_err());
        assert!(parse_duration("7x").is_err());
        assert!(parse_duration("d").is_err());
    }

    #[test]
    fn colorize_keeps_operation_name() {
        assert!(colorize_operation(audit::OP_LOGIN_FAILED).contains("login-failed"));
        assert_eq!(colorize_operation("unknown"), "unknown");
    }
}
