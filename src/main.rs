//! Rigger - deploy and tear down the chatbot platform.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use rigger::cli::output;
use rigger::cli::{execute, Cli};
use rigger::error::{CleanupError, ConfigError, Error, LockError, StageError};

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_env("RIGGER_LOG").unwrap_or_else(|_| {
        if cli.global.verbose {
            EnvFilter::new("rigger=debug")
        } else {
            EnvFilter::new("rigger=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    let env = cli.global.env.clone();
    if let Err(e) = execute(cli) {
        let suggestion = match e.root() {
            Error::Config(ConfigError::UnknownEnvironment { .. }) => Some(
                "environments are dev, staging and prod, each with infrastructure/environments/<env>.tfvars"
                    .to_string(),
            ),
            Error::Stage(StageError::MissingPublishedParameter { .. })
            | Error::Stage(StageError::StateUnavailable { .. }) => {
                Some(format!("run: rigger deploy-infra -e {}", env))
            }
            Error::Stage(StageError::ToolNotFound { tool }) => Some(format!(
                "install {} or point [tools] in rigger.toml at it",
                tool
            )),
            Error::Lock(LockError::Held { .. }) => {
                Some("wait for the other run to finish, then retry".to_string())
            }
            Error::Cleanup(CleanupError::Cancelled) => {
                Some("pass --yes to skip the prompt".to_string())
            }
            Error::Cleanup(CleanupError::BucketsFailed { .. }) => {
                Some("re-run the same command; emptying is safe to repeat".to_string())
            }
            _ => None,
        };

        output::error(&e.to_string());
        if let Some(hint) = suggestion {
            output::hint(&hint);
        }
        std::process::exit(1);
    }
}
