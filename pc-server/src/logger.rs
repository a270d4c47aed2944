use crate::error::{Result as ServerErrorResult, ServerError};

use pc_config::{LogLevel, LoggingConfig};

use std::fmt::{Arguments, Display};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use fern::colors::{Color, ColoredLevelConfig};
use fern::{Dispatch, FormatCallback};
use log::{LevelFilter, Record, info};

/// HTTP plumbing under the admin client; its chatter is kept at `Warn`
/// whatever the configured level.
const QUIET_TARGETS: [&str; 3] = ["hyper", "hyper_util", "reqwest"];

/// Where log lines go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// Appended to a file under the config directory
    File(PathBuf),
    /// Written to stdout, with levels colored unless a service manager is
    /// capturing the output
    Console { colored: bool },
}

impl LogTarget {
    /// Pick the target for `logging`, creating the log directory when a
    /// file is configured.
    pub fn resolve(config_dir: &Path, logging: &LoggingConfig) -> ServerErrorResult<Self> {
        let Some(filename) = &logging.file else {
            return Ok(Self::Console {
                colored: logging.colored,
            });
        };

        let log_dir = config_dir.join(&logging.dir);
        std::fs::create_dir_all(&log_dir).map_err(|e| ServerError::io(&log_dir, e))?;
        Ok(Self::File(log_dir.join(filename)))
    }
}

impl Display for LogTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "file={}", path.display()),
            Self::Console { .. } => f.write_str("stdout"),
        }
    }
}

/// Install the global logger for the controller.
///
/// Lines read `[<rfc3339> - <LEVEL>] <message> [<file>:<line>]`. Records
/// emitted through `tracing` are bridged in as well.
pub fn initialize(level: LogLevel, target: &LogTarget) -> ServerErrorResult<()> {
    let level_filter = level.0;
    let quiet = level_filter.min(LevelFilter::Warn);

    let dispatch = QUIET_TARGETS
        .iter()
        .fold(Dispatch::new().level(level_filter), |dispatch, name| {
            dispatch.level_for(*name, quiet)
        });

    let dispatch = match target {
        LogTarget::File(path) => {
            let file = fern::log_file(path).map_err(|e| ServerError::Logger {
                message: format!("Failed to open log file {}: {e}", path.display()),
            })?;
            dispatch
                .format(|out, message, record| write_line(out, message, record, record.level()))
                .chain(file)
        }
        LogTarget::Console { colored: true } => {
            let colors = ColoredLevelConfig::new()
                .trace(Color::Magenta)
                .debug(Color::Blue)
                .info(Color::Green)
                .warn(Color::Yellow)
                .error(Color::Red);
            dispatch
                .format(move |out, message, record| {
                    write_line(out, message, record, colors.color(record.level()))
                })
                .chain(std::io::stdout())
        }
        LogTarget::Console { colored: false } => dispatch
            .format(|out, message, record| write_line(out, message, record, record.level()))
            .chain(std::io::stdout()),
    };

    dispatch.apply().map_err(|e| ServerError::Logger {
        message: format!("Failed to initialize logger: {e}"),
    })?;

    info!("Logger initialized: level={level_filter:?}, {target}");
    tracing_log::LogTracer::init().ok();

    Ok(())
}

fn write_line(
    out: FormatCallback<'_>,
    message: &Arguments<'_>,
    record: &Record<'_>,
    level: impl Display,
) {
    out.finish(format_args!(
        "[{} - {level}] {message} [{}]",
        humantime::format_rfc3339(SystemTime::now()),
        source_location(record)
    ))
}

pub(crate) fn source_location(record: &Record<'_>) -> String {
    format!(
        "{}:{}",
        record.file().unwrap_or("unknown"),
        record.line().unwrap_or(0)
    )
}
