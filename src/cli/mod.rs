pub mod password;
pub mod serve;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "evote-admin")]
#[command(about = "E-voting administration backend")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve(serve::ServeArgs),

    #[command(about = "Print an Argon2id hash for provisioning an account")]
    HashPassword {
        #[arg(help = "Plaintext password to hash")]
        password: String,
    },
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        None => serve::run(serve::ServeArgs::default()).await,
        Some(Commands::Serve(args)) => serve::run(args).await,
        Some(Commands::HashPassword { password }) => password::run(&password),
    }
}
