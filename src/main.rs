// SPDX-FileCopyrightText: 2024 Maciej Borzecki <maciek.borzecki@gmail.com>
//
// SPDX-License-Identifier: MIT

use std::env;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log;
use simple_logger;

mod config;
mod flags;
mod git;
mod version;

use flags::Quoting;
use git::{GitCommandRunner, GitDescriber};
use version::BuildIdentifier;

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq)]
enum Format {
    /// All flags on a single line.
    Flags,
    /// One flag per line.
    Lines,
    /// JSON array of flags.
    Json,
    /// Cargo build script directive.
    Cargo,
    /// Just the token.
    Token,
}

/// Computes a firmware version define from git metadata.
#[derive(Parser, Debug)]
#[command(name = "firmware-version", version = env!("BUILD_GIT_VERSION"))]
struct Args {
    /// Repository directory, defaults to the current one.
    #[arg(short = 'C', long)]
    repo: Option<PathBuf>,
    /// Configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Name of the defined macro.
    #[arg(short, long)]
    define: Option<String>,
    /// Token used when the repository cannot be described.
    #[arg(long)]
    fallback: Option<String>,
    /// Git executable.
    #[arg(long)]
    git: Option<String>,
    /// Do not escape quotes around the token.
    #[arg(long)]
    raw_quotes: bool,
    #[arg(short, long, value_enum, default_value = "flags")]
    format: Format,
    /// Increase log verbosity.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    /// Only log errors.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
    /// Flags the define is appended to.
    existing_flags: Vec<String>,
}

impl Args {
    fn log_level(&self) -> log::Level {
        if self.quiet {
            return log::Level::Error;
        }
        match self.verbose {
            0 => log::Level::Info,
            1 => log::Level::Debug,
            _ => log::Level::Trace,
        }
    }

    /// Applies command line overrides on top of the loaded configuration.
    fn apply(&self, mut conf: config::Config) -> config::Config {
        if let Some(define) = &self.define {
            conf.define = define.clone();
        }
        if let Some(fallback) = &self.fallback {
            conf.fallback = fallback.clone();
        }
        if let Some(git) = &self.git {
            conf.git = git.clone();
        }
        if self.raw_quotes {
            conf.escape_quotes = false;
        }
        conf
    }
}

fn render(
    format: Format,
    conf: &config::Config,
    id: &BuildIdentifier,
    flags: &[String],
) -> Result<String> {
    Ok(match format {
        Format::Flags => flags.join(" "),
        Format::Lines => flags.join("\n"),
        Format::Json => serde_json::to_string(flags).context("cannot serialize flags")?,
        Format::Cargo => format!("cargo:rustc-env={}={}", conf.define, id.as_str()),
        Format::Token => id.as_str().to_string(),
    })
}

fn main() -> Result<()> {
    let args = Args::parse();

    simple_logger::init_with_level(args.log_level()).context("cannot set up logging")?;

    let cwd = env::current_dir().context("cannot obtain current directory")?;
    let start_dir = args.repo.as_ref().map_or(cwd.clone(), |r| cwd.join(r));
    let conf = config::load(args.config.as_deref(), &start_dir)
        .context("cannot load configuration")?;
    let conf = args.apply(conf);

    let outcome = GitDescriber::new(GitCommandRunner {}, &conf.git, args.repo.clone()).describe();
    let id = BuildIdentifier::from_outcome(&outcome, &conf.fallback);

    let quoting = if conf.escape_quotes {
        Quoting::Escaped
    } else {
        Quoting::Raw
    };
    let flag = flags::define_flag(&conf.define, &id, quoting);
    log::info!("build flag: {}", flag);

    let all = flags::append_flag(&args.existing_flags, flag);
    let out = render(args.format, &conf, &id, &all)?;

    writeln!(io::stdout(), "{}", out).context("cannot write output")?;
    Ok(())
}
