use crate::Cli;

use std::path::PathBuf;

use clap::Parser;
use googletest::assert_that;
use googletest::prelude::{eq, none, some};
use serial_test::serial;

#[test]
fn given_no_flags_when_parsed_then_defaults() {
    // Given
    let args = ["pc-server"];

    // When
    let cli = Cli::try_parse_from(args).unwrap();

    // Then
    assert_that!(cli.config_dir, none());
    assert!(!cli.once);
}

#[test]
fn given_config_dir_and_once_when_parsed_then_both_set() {
    // Given
    let args = ["pc-server", "--config-dir", "/etc/pc", "--once"];

    // When
    let cli = Cli::try_parse_from(args).unwrap();

    // Then
    assert_that!(cli.config_dir, some(eq(&PathBuf::from("/etc/pc"))));
    assert!(cli.once);
}

#[test]
fn given_unknown_flag_when_parsed_then_rejected() {
    // Given
    let args = ["pc-server", "--restart-everything"];

    // When
    let result = Cli::try_parse_from(args);

    // Then
    assert!(result.is_err());
}

#[test]
fn given_explicit_config_dir_when_resolved_then_flag_wins() {
    // Given
    let cli = Cli::try_parse_from(["pc-server", "--config-dir", "/srv/controller"]).unwrap();

    // When
    let dir = cli.config_dir().unwrap();

    // Then
    assert_that!(dir, eq(&PathBuf::from("/srv/controller")));
}

#[test]
#[serial]
fn given_env_config_dir_when_no_flag_then_env_used() {
    // Given
    let original = std::env::var("PC_CONFIG_DIR").ok();
    unsafe { std::env::set_var("PC_CONFIG_DIR", "/var/lib/pc") };
    let cli = Cli::try_parse_from(["pc-server"]).unwrap();

    // When
    let dir = cli.config_dir().unwrap();

    // Then
    unsafe {
        match original {
            Some(value) => std::env::set_var("PC_CONFIG_DIR", value),
            None => std::env::remove_var("PC_CONFIG_DIR"),
        }
    }
    assert_that!(dir, eq(&PathBuf::from("/var/lib/pc")));
}
