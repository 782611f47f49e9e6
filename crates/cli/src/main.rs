//! user-actions - Resolve action visibility against a fixture
//!
//! Usage:
//!   user-actions controls -f <fixture> -r <role> -i <item> -t <template> [-s <json>]
//!   user-actions run -f <fixture> -r <role> -i <item> -t <template> -a <action>
//!   user-actions roles -f <fixture>
//!
//! Logging goes to stderr and is controlled by `RUST_LOG`.

use clap::{Parser, Subcommand};
use cli::commands::{ControlsCommand, RolesCommand, RunCommand};
use shared::UserActionsError;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "user-actions")]
#[command(about = "Resolve which actions a role may see and run on an item")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the visibility map for an item
    Controls(ControlsCommand),
    /// Authorize and dispatch one action
    Run(RunCommand),
    /// List the roles in a fixture
    Roles(RolesCommand),
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Controls(cmd) => cmd.run().await,
        Commands::Run(cmd) => cmd.run().await,
        Commands::Roles(cmd) => cmd.run(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

fn report(err: &anyhow::Error) {
    match err.downcast_ref::<UserActionsError>() {
        Some(engine_err) => println!("{}", engine_err.to_json()),
        None => eprintln!("Error: {:#}", err),
    }
}
