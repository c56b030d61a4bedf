use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "relaychat", version, about = "Chat relay for hosted completion APIs", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Override the config file path globally
    #[arg(short, long, global = true, default_value = "config.yaml")]
    pub config: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP relay
    Serve,

    /// Chat with the model through a running relay
    Chat {
        /// Relay base URL (defaults to client.relay_url)
        #[arg(long)]
        relay: Option<String>,

        /// Sign in to keep history; anonymous chats are not saved
        #[arg(short, long, requires = "password")]
        email: Option<String>,

        #[arg(short, long, requires = "email")]
        password: Option<String>,

        /// Create the account instead of signing in
        #[arg(long, requires = "email")]
        sign_up: bool,

        /// Wait for the full reply instead of streaming it
        #[arg(long)]
        no_stream: bool,
    },

    /// Print the stored conversation of a user
    History {
        /// The user id whose messages to print
        #[arg(short, long)]
        user: String,

        /// Delete the history instead of printing it
        #[arg(long)]
        clear: bool,
    },
}
