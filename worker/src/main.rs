use anyhow::Result;
use clap::Parser;
use tracing::info;
use vigil_worker::cli::{Cli, Commands};
use vigil_worker::commands;
use vigil_worker::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    vigil_worker::init_tracing();

    info!("Starting Vigil v{}", env!("CARGO_PKG_VERSION"));

    let state = AppState::load().await?;
    let mut out = std::io::stdout();

    let result = match cli.command {
        Commands::Run(args) => commands::worker::run(&state, &args).await,
        Commands::Enqueue(args) => commands::audit::enqueue(&state, &args, &mut out).await,
        Commands::Once => commands::audit::once(&state, &mut out).await,
        Commands::Status(args) => commands::audit::status(&state, &args, &mut out).await,
        Commands::Report(args) => commands::report::show(&state, &args, &mut out).await,
    };

    state.close().await;
    result
}
