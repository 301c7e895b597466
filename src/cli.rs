//! CLI definitions for steptrail.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Steptrail CLI.
#[derive(Parser)]
#[command(name = "steptrail")]
#[command(about = "Record page interactions as replayable, encrypted sessions")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Feed interaction reports (one JSON object per line) into a session
    Replay {
        /// Reports file
        reports: PathBuf,
    },

    /// Run a scripted page fixture through an observer into a session
    Simulate {
        /// Simulation file (page fixture plus script)
        fixture: PathBuf,
    },

    /// Encrypt a file into a session envelope
    Seal {
        /// Access token the key is derived from
        #[arg(long, env = "STEPTRAIL_ACCESS_TOKEN")]
        token: String,

        /// Plaintext file
        input: PathBuf,
    },

    /// Verify and decrypt a session envelope
    Open {
        /// Access token the key is derived from
        #[arg(long, env = "STEPTRAIL_ACCESS_TOKEN")]
        token: String,

        /// Envelope file
        input: PathBuf,
    },

    /// Replay reports and save the session remotely
    Save {
        /// Session name
        #[arg(short, long)]
        name: String,

        /// Access token
        #[arg(long, env = "STEPTRAIL_ACCESS_TOKEN")]
        token: String,

        /// Refresh token used once if the access token has expired
        #[arg(long, env = "STEPTRAIL_REFRESH_TOKEN")]
        refresh_token: Option<String>,

        /// Reports file
        reports: PathBuf,
    },
}
