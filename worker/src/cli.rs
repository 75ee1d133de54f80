use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "vigil")]
#[command(about = "Single-URL technical and SEO audits", long_about = None, version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Poll the queue and process runs until Ctrl-C
    Run(RunArgs),
    /// Queue an audit for a URL
    Enqueue(EnqueueArgs),
    /// Process at most one queued run and exit
    Once,
    /// Show the state of a run
    Status(StatusArgs),
    /// Print the public report for an access token
    Report(ReportArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Override the poll interval in milliseconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval_ms: Option<u64>,
}

#[derive(Args, Debug, Clone)]
pub struct EnqueueArgs {
    /// URL to audit (http or https)
    pub url: String,

    /// Process the queue once right after enqueueing
    #[arg(long)]
    pub now: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    /// Run id printed by `enqueue`
    pub run_id: String,
}

#[derive(Args, Debug, Clone)]
pub struct ReportArgs {
    /// Access token printed when the report was published
    pub token: String,
}
