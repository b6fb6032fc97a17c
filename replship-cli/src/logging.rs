//! CLI logging setup
//!
//! Per-component filtering over `tracing-subscriber`, with an optional copy of
//! every event appended to a log file.

use crate::config::LogConfig;
use replship_config::Component;
use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{
    filter::Targets, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer, Registry,
};

pub const CLI_TARGET: &str = "replship::cli";

/// Log output format
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Colored multi-line output
    Pretty,
    /// One line per event
    Compact,
    /// Newline-delimited JSON, for tooling
    Json,
}

/// Build the per-target filter for `log_config`
pub fn targets(log_config: &LogConfig) -> Targets {
    Component::ALL.iter().fold(
        Targets::new()
            .with_default(log_config.global)
            .with_target(CLI_TARGET, log_config.global),
        |targets, component| {
            let target = component.target();
            let level = log_config.level_for(&target);
            targets.with_target(target, level)
        },
    )
}

/// Install the global subscriber: stderr, plus `file` when given
pub fn init_with_file(
    log_config: &LogConfig,
    format: LogFormat,
    file: Option<&Path>,
) -> io::Result<()> {
    let targets = targets(log_config);
    let mut layers = vec![create_format_layer(format, io::stderr)
        .with_filter(targets.clone())
        .boxed()];

    if let Some(path) = file {
        let handle = OpenOptions::new().create(true).append(true).open(path)?;
        layers.push(
            create_format_layer(format, Arc::new(handle))
                .with_filter(targets)
                .boxed(),
        );
    }

    tracing_subscriber::registry().with(layers).init();
    Ok(())
}

/// Create formatter layer based on format
fn create_format_layer<W>(
    format: LogFormat,
    make_writer: W,
) -> Box<dyn Layer<Registry> + Send + Sync>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_target(true)
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(false)
            .without_time()
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_writer(make_writer)
            .boxed(),
    }
}
