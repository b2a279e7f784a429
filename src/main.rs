use clap::Parser;
use std::process::ExitCode;

use gridstate::cli::{Cli, Commands};
use gridstate::commands::{cmd_action, cmd_decode, cmd_encode, cmd_fetch, cmd_move, cmd_views};
use gridstate::logging::{LogConfig, init_logging};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_config = LogConfig::from_verbosity(cli.verbose).with_format(cli.log_format);
    if let Err(e) = init_logging(&log_config) {
        eprintln!("{e}");
    }

    let result = match cli.command {
        Commands::Decode { url, view, param } => cmd_decode(&url, view.as_deref(), &param),
        Commands::Encode { json, param } => cmd_encode(&json, &param),
        Commands::Fetch { grid, json } => cmd_fetch(&grid, json).await,
        Commands::Action {
            grid,
            action_url,
            no_params,
            new_tab,
            out,
        } => cmd_action(&grid, &action_url, no_params, new_tab, &out).await,
        Commands::Move {
            grid,
            row_id,
            position,
        } => cmd_move(&grid, &row_id, position).await,
        Commands::Views { grid, json } => cmd_views(&grid, json).await,
    };

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
