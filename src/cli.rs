//! Command-line interface definitions and parsing

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path (without extension)
    #[arg(short, long, default_value = "config")]
    pub config: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the chat server. Type /start, /stop or /quit; any other line is broadcast
    Server {
        /// Port to listen on (defaults to the configured port)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Connect to a chat server and send every typed line
    Client {
        /// Server IPv4 address
        #[arg(short, long, default_value = "127.0.0.1")]
        server: String,
        /// Your display name (random when omitted)
        #[arg(short, long)]
        name: Option<String>,
    },
}
