// SPDX-License-Identifier: MIT OR Apache-2.0
//! Integration tests for the `swb` console client binary.

use assert_cmd::Command;
use predicates::str::contains;

fn swb() -> Command {
    Command::cargo_bin("swb").expect("binary `swb` should be built")
}

#[test]
fn help_flag_prints_usage() {
    swb()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("Console client for the package broker"))
        .stdout(contains("resolve"))
        .stdout(contains("install"));
}

#[test]
fn version_flag_prints_version() {
    swb().arg("--version").assert().success().stdout(contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn missing_subcommand_is_syntax_error() {
    swb().assert().failure().code(3);
}

#[test]
fn unreachable_daemon_reports_daemon_died_exit_code() {
    swb()
        .args(["--daemon-url", "http://127.0.0.1:1", "resolve", "htop"])
        .assert()
        .failure()
        .code(2)
        .stderr(contains("error:"));
}
