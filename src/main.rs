use clap::Parser;
use respaldo::config::{Cli, CliCommand};
use respaldo::notify::LogNotifier;
use respaldo::Config;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    respaldo::logging::init(&cli.log_level)?;

    match cli.command {
        CliCommand::List(args) => {
            respaldo::commands::list::run(args)?;
        }
        CliCommand::Mirror(args) => {
            // Convert CLI args to Config - this validates immediately
            let config = Config::try_from(args)?;
            let outcome = respaldo::commands::mirror::run(config, &LogNotifier);
            if !outcome.success {
                anyhow::bail!(outcome
                    .diagnostic
                    .unwrap_or_else(|| "mirror operation failed".to_string()));
            }
        }
    }

    Ok(())
}
