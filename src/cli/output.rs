//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::vault::ServiceCredential;

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Print credentials as a table.  The service column is shown only when
/// the rows can span several services.
pub fn print_credentials_table(credentials: &[ServiceCredential], with_service: bool) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    if with_service {
        table.set_header(vec!["Service", "Username", "Password"]);
    } else {
        table.set_header(vec!["Username", "Password"]);
    }

    for c in credentials {
        if with_service {
            table.add_row(vec![
                c.service.clone(),
                c.service_username.clone(),
                c.password().to_string(),
            ]);
        } else {
            table.add_row(vec![c.service_username.clone(), c.password().to_string()]);
        }
    }

    println!("{table}");
}

/// Render credentials as a pretty JSON array.
pub fn credentials_json(credentials: &[ServiceCredential]) -> String {
    let rows: Vec<serde_json::Value> = credentials
        .iter()
        .map(|c| {
            serde_json::json!({
                "service": c.service,
                "service_username": c.service_username,
                "password": c.password(),
            })
        })
        .collect();

    serde_json::to_string_pretty(&rows).unwrap_or_else(|_| "[]".to_string())
}
