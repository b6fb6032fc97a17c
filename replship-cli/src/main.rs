//! Replship CLI
//!
//! `pack` snapshots a compiler output directory into a fresh archive,
//! `resolve` shows which stage of the loader answers a unit name, and `list`
//! prints the entries of a built archive.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

mod commands;
mod config;
mod logging;
mod report;

use crate::config::LogConfig;
use crate::logging::{LogFormat, CLI_TARGET};

#[derive(Parser)]
#[command(
    name = "replship",
    about = "Ship interactive session output as ordered archives",
    version
)]
struct Cli {
    /// Raise log verbosity (repeatable)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Compact, global = true)]
    log_format: LogFormat,

    /// Also append log events to this file
    #[arg(long, value_name = "FILE", global = true)]
    log_file: Option<PathBuf>,

    /// JSON configuration file
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Archive the compiled units of an output directory
    Pack {
        #[arg(value_name = "OUTPUT_DIR")]
        output: PathBuf,
        /// Parent directory for staging directories
        #[arg(long, value_name = "DIR")]
        staging: Option<PathBuf>,
        /// Print the planned entries without writing anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Resolve a unit name through session, classpath and platform
    Resolve {
        name: String,
        /// Session output directory answering fragment names
        #[arg(long, value_name = "DIR")]
        session: Option<PathBuf>,
        /// Directory or .jar/.zip archive to search, in order
        #[arg(long, value_name = "DIR|JAR")]
        classpath: Vec<PathBuf>,
    },
    /// List the entries of an archive
    List {
        #[arg(value_name = "ARCHIVE")]
        archive: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let ship = match config::read_config(cli.config.as_deref()) {
        Ok(ship) => ship,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    config::init_config(ship);
    let config = config::config();

    let log_config = LogConfig::from_logging(&config.logging, cli.verbose);
    if let Err(e) = logging::init_with_file(&log_config, cli.log_format, cli.log_file.as_deref())
    {
        eprintln!("error: cannot open log file: {}", e);
        return ExitCode::FAILURE;
    }
    debug!(target: CLI_TARGET, command = ?cli.command, "starting");

    let result = match &cli.command {
        Command::Pack {
            output,
            staging,
            dry_run,
        } => commands::pack(config, output, staging.as_deref(), *dry_run),
        Command::Resolve {
            name,
            session,
            classpath,
        } => commands::resolve(config, name, session.as_deref(), classpath),
        Command::List { archive } => commands::list(archive),
    };

    match result {
        Ok(lines) => {
            for line in lines {
                println!("{}", line);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            report::print_error(e.as_ref());
            ExitCode::FAILURE
        }
    }
}
