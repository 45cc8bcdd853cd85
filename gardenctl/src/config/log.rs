//! Logging sinks and level for gardenctl.
//!
//! Command output goes to stdout, so by default diagnostics only reach
//! stderr and only at `WARN` or above. The optional `log` section of the
//! configuration file can redirect them to a file or journald.
use std::{fmt, fs::OpenOptions, path::PathBuf};

use resolve_path::PathResolveExt;
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use tracing_subscriber::{
    Layer, filter::LevelFilter, layer::SubscriberExt, registry::LookupSpan,
    util::SubscriberInitExt,
};

/// Where log records are emitted and at which level.
#[serde_as]
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogConfig {
    /// Append log records to this file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,

    #[serde(default = "LogConfig::default_emit_journald")]
    pub emit_journald: bool,

    #[serde(default = "LogConfig::default_emit_stdout")]
    pub emit_stdout: bool,

    #[serde(default = "LogConfig::default_emit_stderr")]
    pub emit_stderr: bool,

    /// Records below this level are dropped.
    #[serde(default = "LogConfig::default_log_level")]
    #[serde_as(as = "DisplayFromStr")]
    pub level: tracing::Level,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file_path: None,
            emit_journald: Self::default_emit_journald(),
            emit_stdout: Self::default_emit_stdout(),
            emit_stderr: Self::default_emit_stderr(),
            level: Self::default_log_level(),
        }
    }
}

impl LogConfig {
    #[inline]
    #[must_use]
    pub const fn default_log_level() -> tracing::Level { tracing::Level::WARN }

    #[inline]
    #[must_use]
    pub const fn default_emit_journald() -> bool { false }

    #[inline]
    #[must_use]
    pub const fn default_emit_stdout() -> bool { false }

    #[inline]
    #[must_use]
    pub const fn default_emit_stderr() -> bool { true }

    /// Sinks enabled by this config, in emission order.
    ///
    /// `~` and relative segments of the file path are expanded here, so the
    /// configuration keeps the path as written.
    fn sinks(&self) -> Vec<LogSink> {
        let mut sinks = Vec::new();
        if self.emit_journald {
            sinks.push(LogSink::Journald);
        }
        if let Some(path) = &self.file_path {
            let path = path.try_resolve().map_or_else(|_| path.clone(), |path| path.to_path_buf());
            sinks.push(LogSink::File(path));
        }
        if self.emit_stdout {
            sinks.push(LogSink::Stdout);
        }
        if self.emit_stderr {
            sinks.push(LogSink::Stderr);
        }
        sinks
    }

    /// Installs the global `tracing` subscriber described by this config.
    ///
    /// Sinks that cannot be opened are skipped and reported through the
    /// remaining ones.
    ///
    /// # Panics
    ///
    /// Panics if a global subscriber has already been installed.
    pub fn init(&self) {
        let mut unavailable = Vec::new();
        let layers = self
            .sinks()
            .into_iter()
            .filter_map(|sink| {
                let layer = sink.layer();
                if layer.is_none() {
                    unavailable.push(sink);
                }
                layer
            })
            .collect::<Vec<_>>();

        tracing_subscriber::registry()
            .with(LevelFilter::from_level(self.level))
            .with(layers)
            .init();

        for sink in unavailable {
            tracing::warn!("Failed to open log sink {sink}");
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum LogSink {
    Stdout,
    Stderr,
    Journald,
    File(PathBuf),
}

impl fmt::Display for LogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => f.write_str("stdout"),
            Self::Stderr => f.write_str("stderr"),
            Self::Journald => f.write_str("journald"),
            Self::File(path) => write!(f, "file {}", path.display()),
        }
    }
}

impl LogSink {
    /// Builds the formatting layer for this sink, or `None` when the sink
    /// cannot be opened.
    #[allow(clippy::type_repetition_in_bounds)]
    fn layer<S>(&self) -> Option<Box<dyn Layer<S> + Send + Sync + 'static>>
    where
        S: tracing::Subscriber,
        for<'a> S: LookupSpan<'a>,
    {
        let fmt = tracing_subscriber::fmt::layer().with_target(false);

        match self {
            Self::Stdout => Some(Box::new(fmt.with_writer(std::io::stdout))),
            Self::Stderr => Some(Box::new(fmt.with_writer(std::io::stderr))),
            Self::File(path) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent).ok()?;
                }
                let file = OpenOptions::new().create(true).append(true).open(path).ok()?;
                Some(Box::new(fmt.with_ansi(false).with_writer(file)))
            }
            Self::Journald => Some(Box::new(tracing_journald::layer().ok()?)),
        }
    }
}
