use clap::{Parser, Subcommand};
use rupture_bot::BoxError;
use rupture_bot::config::RegistrationConfig;
use rupture_bot::registration::{RegistrationClient, load_definitions};
use rupture_bot::trace::init_tracing;
use std::path::PathBuf;
use tracing::error;

#[derive(Parser)]
#[command(name = "register-commands")]
#[command(about = "Manage the bot's slash commands", long_about = None)]
struct Cli {
    /// Command definitions file
    #[arg(short, long, default_value = "discord_commands.json")]
    file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the commands currently registered
    List,

    /// Delete commands missing from the definitions file, then create the defined ones
    Sync {
        /// Only create these commands (may be repeated)
        #[arg(long)]
        only: Vec<String>,
    },
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), BoxError> {
    init_tracing();
    let cli = Cli::parse();

    let cfg = match RegistrationConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Configuration error: {}", e);
            return Err(Box::new(e) as BoxError);
        }
    };

    let client = RegistrationClient::new(
        reqwest::Client::new(),
        &cfg.discord_api_base,
        &cfg.application_id,
        &cfg.bot_token,
    )?;

    match cli.command {
        Commands::List => {
            for cmd in client.list().await? {
                println!("{}\t{}\t{}", cmd.id, cmd.name, cmd.description);
            }
        }
        Commands::Sync { only } => {
            let defs = load_definitions(&cli.file)?;
            let report = client.sync(&defs, &only).await?;
            for name in &report.deleted {
                println!("deleted {name}");
            }
            for name in &report.created {
                println!("created {name}");
            }
            for (name, reason) in &report.failed {
                println!("failed  {name}: {reason}");
            }
        }
    }

    Ok(())
}
