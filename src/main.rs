mod cli;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "archscope=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();
    let settings = cli.settings.as_deref();

    match cli.command {
        Commands::Extract {
            catalog,
            config,
            module,
            base_package,
            output,
            format,
            no_rest_calls,
            parallel,
        } => {
            cli::extract(
                settings,
                &catalog,
                config.as_deref(),
                module,
                base_package,
                output.as_deref(),
                &format,
                no_rest_calls,
                parallel,
            )?;
        }
        Commands::Classify { catalog, all } => {
            cli::classify(settings, &catalog, all)?;
        }
        Commands::Config { config, key } => {
            cli::resolve_config(&config, &key)?;
        }
    }

    Ok(())
}
