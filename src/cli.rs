//! CLI definitions for config-cascade.
//!
//! The primary parser understands a small fixed surface; every other
//! `--dotted.path [value]` token is an override and is split off before clap
//! runs, mirroring argparse's parse-known-args behavior.

use clap::Parser;
use std::path::PathBuf;

/// Hierarchical config loader and resolver
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    pub config: Option<PathBuf>,

    /// Save the resolved configuration to this path
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2")]
    pub log: String,
}

impl Cli {
    /// Parse `std::env::args`, returning the CLI plus override tokens.
    pub fn parse_with_overrides() -> (Self, Vec<String>) {
        let (known, overrides) = split_known_args(std::env::args());
        (Self::parse_from(known), overrides)
    }
}

/// Flags the primary parser understands.
const KNOWN_FLAGS: &[&str] = &[
    "--output", "-o", "--verbose", "-v", "--log", "-l", "--help", "-h", "--version", "-V",
];
/// Known flags that consume the following token as their value.
const FLAGS_WITH_VALUE: &[&str] = &["--output", "-o", "--log", "-l"];

/// Split raw arguments into tokens for the primary parser and override
/// tokens for the override engine.
pub fn split_known_args(args: impl IntoIterator<Item = String>) -> (Vec<String>, Vec<String>) {
    let mut known = Vec::new();
    let mut overrides = Vec::new();
    let mut iter = args.into_iter().peekable();

    while let Some(token) = iter.next() {
        if KNOWN_FLAGS.contains(&token.as_str()) {
            let takes_value = FLAGS_WITH_VALUE.contains(&token.as_str());
            known.push(token);
            if takes_value {
                if let Some(value) = iter.next() {
                    known.push(value);
                }
            }
        } else if token
            .split_once('=')
            .is_some_and(|(flag, _)| KNOWN_FLAGS.contains(&flag))
        {
            known.push(token);
        } else if token.starts_with("--") {
            overrides.push(token);
            if let Some(next) = iter.peek() {
                if !next.starts_with("--") {
                    overrides.push(iter.next().unwrap_or_default());
                }
            }
        } else {
            known.push(token);
        }
    }

    (known, overrides)
}
