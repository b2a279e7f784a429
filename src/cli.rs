use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::logging::LogFormat;

#[derive(Parser)]
#[command(name = "gridstate")]
#[command(about = "Drive a URL-backed admin data grid from the command line")]
#[command(version)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log output format: pretty, compact or json
    #[arg(long, default_value = "pretty", global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command that talks to a server.
#[derive(clap::Args, Clone)]
pub struct GridArgs {
    /// Table definition (.json, .yaml or .yml)
    #[arg(short, long)]
    pub config: PathBuf,

    /// Server origin the configured endpoints are relative to
    #[arg(short, long, default_value = "http://localhost:8000")]
    pub server: String,

    /// Query string of the list page to start from
    #[arg(short, long, default_value = "")]
    pub url: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the parameter tree encoded in a URL
    Decode {
        /// Full URL or query string
        url: String,

        /// Only print this grid's slice
        #[arg(long)]
        view: Option<String>,

        /// Query parameter holding the tree
        #[arg(long, default_value = "params")]
        param: String,
    },

    /// Print the query string for a JSON parameter tree
    Encode {
        /// Parameter tree as JSON
        json: String,

        /// Query parameter holding the tree
        #[arg(long, default_value = "params")]
        param: String,
    },

    /// Load state from a URL, fetch the page and print it
    Fetch {
        #[command(flatten)]
        grid: GridArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a bulk list action against the loaded state
    Action {
        #[command(flatten)]
        grid: GridArgs,

        /// Action endpoint
        action_url: String,

        /// Do not append the grid state to a GET action
        #[arg(long)]
        no_params: bool,

        /// Open a GET action in a new tab
        #[arg(long)]
        new_tab: bool,

        /// Directory for downloaded files
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },

    /// Move a row to an absolute 1-based position
    Move {
        #[command(flatten)]
        grid: GridArgs,

        /// Id of the row to move
        row_id: String,

        /// Target position in the full ordering
        #[arg(allow_negative_numbers = true)]
        position: i64,
    },

    /// Show which saved views match the loaded state
    Views {
        #[command(flatten)]
        grid: GridArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
