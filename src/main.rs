//! config-cascade
//!
//! Loads a configuration file through the full resolution pipeline (parent
//! chain, include/import directives, CLI overrides) and prints or saves the
//! resolved tree.

use anyhow::Result;
use std::fs::OpenOptions;
use std::sync::Arc;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use config_cascade::cli::Cli;
use config_cascade::{Config, LoadOptions, Registry};

fn main() -> Result<()> {
    let (cli, overrides) = Cli::parse_with_overrides();

    // Initialize logging based on --log option
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    match cli.log.as_str() {
        "0" | "off" => {
            // No logging
        }
        "1" | "stdout" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        "2" | "stderr" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        filename => {
            let file = OpenOptions::new().create(true).append(true).open(filename)?;
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    let mut options = LoadOptions::new()
        .with_overrides(overrides)
        .with_resolver(Arc::new(Registry::new()));
    if let Some(path) = cli.config.clone() {
        options = options.with_file(path);
    }

    let config = Config::load(options)?;

    if let Some(output) = cli.output {
        config.save_to(&output)?;
        info!(path = %output.display(), "resolved configuration saved");
    } else {
        println!("{}", serde_json::to_string_pretty(&config.to_value())?);
    }

    Ok(())
}
