//! Process log sink for torquesrv services
//!
//! Console output plus an append-only log file. Access records are emitted
//! under the [`ACCESS_TARGET`] target and always pass the filter at `info`,
//! regardless of the configured level, unless `RUST_LOG` names them explicitly.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::Writer, FmtContext, FormatEvent, FormatFields},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Tracing target used for per-request access records
pub const ACCESS_TARGET: &str = "api_access";

const DEFAULT_LOG_FILE: &str = "torque_server.log";

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive (trace, debug, info, warn, error or a full `EnvFilter` string)
    pub level: String,
    /// Directory of the log file; unset means the directory of the executable
    pub dir: Option<PathBuf>,
    /// Log file name
    pub file: String,
    /// Mirror records to stdout
    pub console: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: None,
            file: DEFAULT_LOG_FILE.to_string(),
            console: true,
        }
    }
}

impl LogConfig {
    /// Directory the log file lives in
    pub fn resolve_dir(&self) -> PathBuf {
        if let Some(dir) = &self.dir {
            return dir.clone();
        }

        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Full path of the log file
    pub fn file_path(&self) -> PathBuf {
        self.resolve_dir().join(&self.file)
    }

    fn env_filter(&self) -> EnvFilter {
        // RUST_LOG wins; api_access stays at info unless it is named explicitly
        let base = std::env::var("RUST_LOG").unwrap_or_else(|_| self.level.clone());
        if base.contains(ACCESS_TARGET) {
            EnvFilter::new(base)
        } else {
            EnvFilter::new(format!("{},{}=info", base, ACCESS_TARGET))
        }
    }
}

/// Custom format for log level with brackets: `[INFO]`, `[WARN]`, etc.
fn format_level(level: &Level) -> &'static str {
    match *level {
        Level::TRACE => "[TRACE]",
        Level::DEBUG => "[DEBUG]",
        Level::INFO => "[INFO]",
        Level::WARN => "[WARN]",
        Level::ERROR => "[ERROR]",
    }
}

/// Event formatter that outputs: `timestamp [LEVEL] message fields`
///
/// Access records additionally carry their target so they can be grepped
/// out of the shared file: `2025-12-02T00:50:44.809Z [INFO] api_access: ...`
struct BracketedLevelFormat;

impl<S, N> FormatEvent<S, N> for BracketedLevelFormat
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let now = chrono::Utc::now();
        write!(writer, "{} ", now.format("%Y-%m-%dT%H:%M:%S%.6fZ"))?;

        let level = *event.metadata().level();
        if writer.has_ansi_escapes() {
            let color = match level {
                Level::TRACE => "\x1b[35m", // magenta
                Level::DEBUG => "\x1b[34m", // blue
                Level::INFO => "\x1b[32m",  // green
                Level::WARN => "\x1b[33m",  // yellow
                Level::ERROR => "\x1b[31m", // red
            };
            write!(writer, "{}{}\x1b[0m ", color, format_level(&level))?;
        } else {
            write!(writer, "{} ", format_level(&level))?;
        }

        if event.metadata().target() == ACCESS_TARGET {
            write!(writer, "{}: ", ACCESS_TARGET)?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

/// Initialize the process log sink
///
/// Returns the file writer guard; it must be kept alive for the lifetime of
/// the process or buffered records are lost.
pub fn init_logging(config: &LogConfig) -> Result<WorkerGuard> {
    let dir = config.resolve_dir();
    fs::create_dir_all(&dir)
        .with_context(|| format!("error opening log dir {}", dir.display()))?;

    // never() opens the file in append mode and does not rotate
    let file_appender = tracing_appender::rolling::never(&dir, &config.file);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .event_format(BracketedLevelFormat);

    let console_layer = config.console.then(|| {
        fmt::layer()
            .with_ansi(true)
            .event_format(BracketedLevelFormat)
    });

    tracing_subscriber::registry()
        .with(config.env_filter())
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    tracing::info!(
        "Logging initialized: level={}, file={}",
        config.level,
        dir.join(&config.file).display()
    );

    Ok(guard)
}
