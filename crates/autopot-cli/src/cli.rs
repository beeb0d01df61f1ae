//! CLI argument definitions for autopot.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "autopot")]
#[command(about = "Automatic HP potion for Last Epoch", version)]
pub struct Args {
    /// Path to config file (created with defaults if missing)
    #[arg(short, long, default_value = "autopot.toml", env = "AUTOPOT_CONFIG")]
    pub config: PathBuf,

    /// Enable debug logging (same as `developer_debug = true`)
    #[arg(long)]
    pub debug: bool,

    /// Start with auto potion turned off
    #[arg(long)]
    pub disabled: bool,
}
