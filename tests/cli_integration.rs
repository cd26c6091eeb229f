//! Integration tests for the CredVault CLI.
//!
//! These tests exercise the binary end-to-end using `assert_cmd`.
//! Prompts are bypassed with `CREDVAULT_PASSWORD` / `CREDVAULT_OTP`, and
//! every test gets its own database and key file in a temp directory.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use credvault::crypto::totp;
use predicates::prelude::*;

/// Helper: get a Command pointing at the credvault binary, isolated in `dir`.
fn credvault(dir: &TempDir) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("credvault").expect("binary should exist");
    cmd.current_dir(dir.path())
        .env_remove("CREDVAULT_ENCRYPTION_KEY")
        .env_remove("CREDVAULT_DATABASE")
        .env_remove("CREDVAULT_KEY_FILE")
        .env_remove("CREDVAULT_USER")
        .env_remove("CREDVAULT_OTP")
        .env_remove("CREDVAULT_PASSWORD")
        .arg("--database")
        .arg(dir.child("vault.db").path())
        .arg("--key-file")
        .arg(dir.child("vault.key").path());
    cmd
}

/// Register `user` and return the OTP secret printed during enrollment.
fn register(dir: &TempDir, user: &str, password: &str) -> String {
    let out = credvault(dir)
        .env("CREDVAULT_PASSWORD", password)
        .args(["register", user, "--no-qr"])
        .output()
        .expect("run register");
    assert!(out.status.success(), "register failed: {out:?}");

    let stdout = String::from_utf8(out.stdout).unwrap();
    stdout
        .lines()
        .find_map(|l| l.trim().strip_prefix("Secret:"))
        .map(|s| s.trim().to_string())
        .expect("secret line in output")
}

/// A command logged in as `user` with a currently valid code.
fn logged_in(dir: &TempDir, password: &str, secret: &str) -> Command {
    let code = totp::code_at(secret, totp::now()).unwrap();
    let mut cmd = credvault(dir);
    cmd.env("CREDVAULT_PASSWORD", password)
        .env("CREDVAULT_OTP", code);
    cmd
}

#[test]
fn help_flag_shows_usage() {
    let dir = TempDir::new().unwrap();
    credvault(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("register"))
        .stdout(predicate::str::contains("add"))
        .stdout(predicate::str::contains("get"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("shell"));
}

#[test]
fn no_args_shows_help() {
    #[allow(deprecated)]
    Command::cargo_bin("credvault")
        .unwrap()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn register_creates_database_and_key_file() {
    let dir = TempDir::new().unwrap();
    let secret = register(&dir, "alice", "pw1");

    assert_eq!(secret.len(), 32);
    dir.child("vault.db").assert(predicate::path::exists());
    dir.child("vault.key").assert(predicate::path::exists());
}

#[test]
fn register_prints_provisioning_uri() {
    let dir = TempDir::new().unwrap();
    credvault(&dir)
        .env("CREDVAULT_PASSWORD", "pw1")
        .args(["register", "alice", "--no-qr"])
        .assert()
        .success()
        .stdout(predicate::str::contains("otpauth://totp/CredVault:alice"));
}

#[test]
fn duplicate_register_fails() {
    let dir = TempDir::new().unwrap();
    register(&dir, "alice", "pw1");

    credvault(&dir)
        .env("CREDVAULT_PASSWORD", "pw2")
        .args(["register", "alice", "--no-qr"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn add_then_get_roundtrip() {
    let dir = TempDir::new().unwrap();
    let secret = register(&dir, "alice", "pw1");

    logged_in(&dir, "pw1", &secret)
        .args(["add", "github", "alice@x.com", "-u", "alice", "--value", "ghp_123"])
        .assert()
        .success()
        .stdout(predicate::str::contains("was added"));

    logged_in(&dir, "pw1", &secret)
        .args(["add", "github", "alice@x.com", "-u", "alice", "--value", "ghp_456"])
        .assert()
        .success()
        .stdout(predicate::str::contains("was updated"));

    logged_in(&dir, "pw1", &secret)
        .args(["get", "github", "-u", "alice"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ghp_456"))
        .stdout(predicate::str::contains("ghp_123").not());
}

#[test]
fn add_reads_piped_password() {
    let dir = TempDir::new().unwrap();
    let secret = register(&dir, "alice", "pw1");

    logged_in(&dir, "pw1", &secret)
        .args(["add", "aws", "root", "-u", "alice"])
        .write_stdin("AKIA-piped\n")
        .assert()
        .success();

    logged_in(&dir, "pw1", &secret)
        .args(["list", "-u", "alice", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"service\": \"aws\""))
        .stdout(predicate::str::contains("AKIA-piped"));
}

#[test]
fn wrong_otp_is_rejected() {
    let dir = TempDir::new().unwrap();
    register(&dir, "alice", "pw1");

    credvault(&dir)
        .env("CREDVAULT_PASSWORD", "pw1")
        .env("CREDVAULT_OTP", "abcdef")
        .args(["list", "-u", "alice"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid username, password, or OTP code"));
}

#[test]
fn get_missing_service_fails() {
    let dir = TempDir::new().unwrap();
    let secret = register(&dir, "alice", "pw1");

    logged_in(&dir, "pw1", &secret)
        .args(["get", "gitlab", "-u", "alice"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No credentials found"));
}

#[test]
fn audit_lists_own_operations() {
    let dir = TempDir::new().unwrap();
    let secret = register(&dir, "alice", "pw1");

    logged_in(&dir, "pw1", &secret)
        .args(["audit", "-u", "alice", "--last", "10"])
        .assert()
        .success()
        .stdout(predicate::str::contains("register"))
        .stdout(predicate::str::contains("login"));
}

#[test]
fn invalid_since_is_rejected() {
    let dir = TempDir::new().unwrap();
    credvault(&dir)
        .args(["audit", "-u", "alice", "--since", "7x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid duration"));
}

#[test]
fn huge_since_is_rejected_without_crashing() {
    let dir = TempDir::new().unwrap();
    credvault(&dir)
        .args(["audit", "-u", "alice", "--since", "999999999999999d"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("out of range"));
}

#[test]
fn oversized_otp_skew_in_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    dir.child("credvault.toml").write_str("otp_skew = 2000000\n").unwrap();

    credvault(&dir)
        .env("CREDVAULT_PASSWORD", "pw1")
        .args(["register", "alice", "--no-qr"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("otp_skew"));
}
