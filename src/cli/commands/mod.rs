//! Command implementations, one module per subcommand.

pub mod add;
pub mod audit_cmd;
pub mod get;
pub mod list;
pub mod register;
pub mod shell;
