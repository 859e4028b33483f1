//! Trialmine CLI binary entry point.

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use trialmine_cli::{commands, connect, connect_offline, Cli, Command, Config, Formatter, Result};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = Config::resolve_path(cli.config.as_deref())?;
    let mut config = Config::load_from(&config_path)?;
    if let Some(provider) = cli.oracle {
        config.oracle.provider = provider.into();
    }
    if let Some(dir) = cli.checkpoint_dir {
        config.checkpoint_dir = dir;
    }
    debug!("Loaded configuration from {}", config_path.display());

    let format = cli.format.map(Into::into).unwrap_or(config.settings.format);
    let color = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color);

    match cli.command {
        Command::Extract(args) => {
            let service = connect(&config)?;
            commands::execute_extract(args, &service, &formatter).await?;
        }
        Command::Resume(args) => {
            let service = connect(&config)?;
            commands::execute_resume(args, &service, &formatter).await?;
        }
        Command::List => {
            let service = connect_offline(&config)?;
            commands::execute_list(&service, &formatter)?;
        }
        Command::Merge(args) => {
            let service = connect_offline(&config)?;
            commands::execute_merge(args, &service, &formatter)?;
        }
        Command::Compare(args) => {
            let service = connect(&config)?;
            commands::execute_compare(args, &service, &formatter).await?;
        }
        Command::Delete(args) => {
            let service = connect_offline(&config)?;
            commands::execute_delete(args, &service, &formatter)?;
        }
        Command::Config(args) => {
            commands::execute_config(args, &config, &config_path, &formatter)?;
        }
    }

    Ok(())
}

/// Log to stderr; `RUST_LOG` wins over `-v`.
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}
