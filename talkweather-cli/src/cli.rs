use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use inquire::Password;
use std::path::PathBuf;
use talkweather_core::{Config, logging, narration, provider};

use crate::{console, session::Session};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "talkweather", version, about = "Spoken weather reports for any city")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the interactive weather session (the default).
    Run(RunArgs),

    /// Store the weatherapi.com API key in the config file.
    Configure {
        /// API key; prompted for when omitted.
        #[arg(long)]
        api_key: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Directory saved reports are written to.
    #[arg(long, default_value = ".")]
    pub reports_dir: PathBuf,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Some(Command::Configure { api_key }) => configure(api_key),
            Some(Command::Run(args)) => run_session(args).await,
            None => {
                run_session(RunArgs {
                    reports_dir: PathBuf::from("."),
                })
                .await
            }
        }
    }
}

fn configure(api_key: Option<String>) -> Result<()> {
    let mut config = Config::load()?;

    let api_key = match api_key {
        Some(key) => key,
        None => Password::new("weatherapi.com API key:")
            .without_confirmation()
            .prompt()
            .context("Failed to read API key")?,
    };
    config.set_api_key(api_key);
    config.api_key()?;

    let path = config.save()?;
    println!("API key saved to {}", path.display());
    Ok(())
}

async fn run_session(args: RunArgs) -> Result<()> {
    let config = Config::load()?;

    logging::init(&config.log_file, &config.log_level)?;

    let provider = provider::provider_from_config(&config)?;
    let mut speaker = narration::speaker_from_config(&config);
    if speaker.name() == "muted" && config.speech != narration::SpeechBackend::Muted {
        println!("Speech output is unavailable; continuing with text only.");
    }

    let mut console = console::stdio_console();
    let mut session = Session::new(
        &mut *console,
        &*provider,
        &mut *speaker,
        args.reports_dir,
        config.forecast_days,
    );

    session.run().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_run() {
        let cli = Cli::try_parse_from(["talkweather"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn run_accepts_reports_dir() {
        let cli =
            Cli::try_parse_from(["talkweather", "run", "--reports-dir", "/tmp/reports"]).unwrap();
        match cli.command {
            Some(Command::Run(args)) => assert_eq!(args.reports_dir, PathBuf::from("/tmp/reports")),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn run_defaults_reports_dir_to_cwd() {
        let cli = Cli::try_parse_from(["talkweather", "run"]).unwrap();
        match cli.command {
            Some(Command::Run(args)) => assert_eq!(args.reports_dir, PathBuf::from(".")),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn configure_takes_optional_key() {
        let cli = Cli::try_parse_from(["talkweather", "configure", "--api-key", "KEY"]).unwrap();
        match cli.command {
            Some(Command::Configure { api_key }) => assert_eq!(api_key.as_deref(), Some("KEY")),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn clap_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
