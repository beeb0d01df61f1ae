//! CLI argument parsing tests.
//!
//! These tests verify that command-line arguments are parsed correctly
//! without starting the worker (which would need the game process).

use std::path::PathBuf;

use clap::Parser;

// Re-create Args structure for testing since it's not publicly exported
#[derive(Parser, Debug)]
#[command(name = "autopot")]
struct Args {
    #[arg(short, long, default_value = "autopot.toml")]
    config: PathBuf,

    #[arg(long)]
    debug: bool,

    #[arg(long)]
    disabled: bool,
}

#[test]
fn test_defaults() {
    let args = Args::try_parse_from(["autopot"]).unwrap();
    assert_eq!(args.config, PathBuf::from("autopot.toml"));
    assert!(!args.debug);
    assert!(!args.disabled);
}

#[test]
fn test_config_path_long_and_short() {
    let args = Args::try_parse_from(["autopot", "--config", "custom.toml"]).unwrap();
    assert_eq!(args.config, PathBuf::from("custom.toml"));

    let args = Args::try_parse_from(["autopot", "-c", "dir/other.toml"]).unwrap();
    assert_eq!(args.config, PathBuf::from("dir/other.toml"));
}

#[test]
fn test_flags() {
    let args = Args::try_parse_from(["autopot", "--debug", "--disabled"]).unwrap();
    assert!(args.debug);
    assert!(args.disabled);
}

#[test]
fn test_unknown_argument_rejected() {
    assert!(Args::try_parse_from(["autopot", "--threshold", "0.5"]).is_err());
}

#[test]
fn test_config_requires_value() {
    assert!(Args::try_parse_from(["autopot", "--config"]).is_err());
}
