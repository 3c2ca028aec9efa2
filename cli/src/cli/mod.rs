pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "nanobana-proxy")]
#[command(author, version, about = "Image API proxy - forwards Nano Banana requests to fal with a server-held key")]
pub struct Cli {
    /// Path to config file (checked in order: local config.toml, ~/.config/nanobana-proxy/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Defaults to `start`
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the proxy server
    Start {
        /// Port to listen on (overrides config and PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show effective configuration and whether the server answers
    Status,
}
