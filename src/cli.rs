use clap::{Parser, Subcommand};

/// `docrelay` - Relay chat messages to an automation webhook and sanitize the replies.
#[derive(Parser, Debug)]
#[command(name = "docrelay")]
#[command(version = "0.1.0")]
#[command(about = "Chat-to-webhook relay with document sanitization.", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP relay
    Serve {
        /// Port to listen on (overrides config and PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (overrides config and HOST)
        #[arg(long)]
        host: Option<String>,
    },
}
