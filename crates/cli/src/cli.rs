use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "jobwatch", version, about = "Start migrations and watch them finish")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, PartialEq, Eq)]
pub enum Command {
    /// Start a new migration, then watch until nothing is running
    Start,
    /// Reconcile stored migrations and watch any still running
    Watch,
    /// Print the stored migration history without contacting the backend
    History,
}

impl Command {
    /// Whether the command talks to the backend at all.
    pub fn needs_backend(&self) -> bool {
        !matches!(self, Command::History)
    }
}
