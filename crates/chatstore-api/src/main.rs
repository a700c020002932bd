//! chatstore operator CLI entry point.
//!
//! Binary name: `chatstore`
//!
//! Parses CLI arguments, opens chat storage (running pending migrations),
//! then dispatches to the command handler.

mod cli;
mod state;

use clap::Parser;
use chatstore_observe::tracing_setup::{TracingOptions, init_tracing, shutdown_tracing};

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut tracing_options = TracingOptions::from_verbosity(cli.verbose, cli.log_json);
    tracing_options.otel = cli.otel;
    if let Err(e) = init_tracing(tracing_options) {
        eprintln!("Warning: tracing setup failed: {e}");
    }

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let state = AppState::init(cli.db.clone()).await?;

    match cli.command {
        Commands::Migrate => cli::maintenance::migrate(&state, cli.json),
        Commands::Stats => cli::maintenance::stats(&state, cli.json).await,
        Commands::Chats(args) => cli::chats::list_chats(&state, args, cli.json).await,
        Commands::DeleteChat { jid, yes } => {
            cli::chats::delete_chat(&state, &jid, yes, cli.json).await
        }
        Commands::Messages(args) => cli::messages::list_messages(&state, args, cli.json).await,
        Commands::Search { chat, text, limit } => {
            cli::messages::search(&state, &chat, &text, limit, cli.json).await
        }
        Commands::Show { id } => cli::messages::show_message(&state, &id, cli.json).await,
        Commands::Truncate { yes } => cli::maintenance::truncate(&state, yes, cli.json).await,
    }
}
