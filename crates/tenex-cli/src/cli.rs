use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "tenex")]
#[command(version, about = "Tenex - streaming chat client for the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Chat API base URL (defaults to http://localhost:8000)
    #[arg(long, global = true, env = "TENEX_BASE_URL")]
    pub base_url: Option<String>,

    /// Value of the session_id cookie issued at sign-in
    #[arg(long, global = true, env = "TENEX_SESSION", hide_env_values = true)]
    pub session: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive chat (default)
    Chat,

    /// Send a single message and print the reply
    Send(SendArgs),

    /// Show the signed-in user
    Whoami,

    /// Show authentication status
    Status,

    /// End the server-side session
    Logout,

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
pub struct SendArgs {
    /// Message text
    pub message: String,

    /// Wait for the whole reply instead of streaming it
    #[arg(long)]
    pub no_stream: bool,
}
