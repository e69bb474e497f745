use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "signage",
    about = "Slide signage: distribute a presentation deck to display terminals",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the distribution service
    Serve(ServeArgs),
    /// Run a branch terminal
    Branch(BranchArgs),
    /// Upload a deck to the distribution service
    Upload(UploadArgs),
    /// Ask the distribution service to signal every branch
    Reload(RemoteArgs),
    /// List the slides the distribution service is serving
    Slides(RemoteArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// TOML configuration file; flags override its values
    #[arg(short, long, env = "SIGNAGE_SERVER_CONFIG")]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub bind: Option<SocketAddr>,
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
    /// Branch base address; repeat for each branch
    #[arg(long = "branch")]
    pub branches: Vec<String>,
    #[arg(long)]
    pub archive: bool,
}

#[derive(Args)]
pub struct BranchArgs {
    /// TOML configuration file; flags override its values
    #[arg(short, long, env = "SIGNAGE_BRANCH_CONFIG")]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub bind: Option<SocketAddr>,
    #[arg(long, env = "SIGNAGE_SERVER")]
    pub server: Option<String>,
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,
    /// Seconds each slide stays on screen
    #[arg(long)]
    pub interval: Option<u64>,
}

#[derive(Args)]
pub struct RemoteArgs {
    #[arg(long, env = "SIGNAGE_SERVER", default_value = "http://127.0.0.1:5000")]
    pub server: String,
}

#[derive(Args)]
pub struct UploadArgs {
    pub file: PathBuf,
    #[command(flatten)]
    pub remote: RemoteArgs,
}
