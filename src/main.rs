use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use watchlog_lib::settings::SettingsStore;

#[derive(Parser, Debug)]
#[command(name = "watchlog")]
#[command(about = "Measurement tracking service with gap-filled statistics")]
struct Cli {
    /// Path to the JSON settings file
    #[arg(short, long, default_value = "watchlog.json")]
    config: PathBuf,

    /// Address to listen on (overrides the settings file)
    #[arg(short, long)]
    listen: Option<String>,

    /// SQLite database path (overrides the settings file)
    #[arg(short, long)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, Default)]
enum Command {
    /// Run the HTTP API
    #[default]
    Serve,
    /// Create or migrate the database and exit
    InitDb,
    /// Write the effective settings to the config file and exit
    InitConfig,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    watchlog_lib::init_logging();

    let store = SettingsStore::load(cli.config.clone())?;
    let store_path = store.path().to_path_buf();
    let mut settings = store.into_settings();
    if let Some(listen) = cli.listen {
        settings.listen_addr = listen;
    }
    if let Some(database) = cli.database {
        settings.database_path = database;
    }

    match cli.command.unwrap_or_default() {
        Command::Serve => watchlog_lib::run(settings),
        Command::InitDb => watchlog_lib::init_database(settings.database_path),
        Command::InitConfig => {
            SettingsStore::from_settings(store_path.clone(), settings).persist()?;
            log::info!("Wrote settings to {}", store_path.display());
            Ok(())
        }
    }
}
