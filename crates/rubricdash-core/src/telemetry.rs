//! Log output for rubricdash binaries.
//!
//! Everything is written to stderr so command output on stdout stays
//! machine-readable. `RUST_LOG` directives win over the level picked on the
//! command line; unparsable directives are reported and ignored.

use std::fmt;
use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::layer::{Layered, SubscriberExt};
use tracing_subscriber::registry::Registry;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt as log_fmt, EnvFilter, Layer};

type OutputLayer = Box<dyn Layer<Layered<EnvFilter, Registry>> + Send + Sync>;

/// Shape of each log line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable single lines.
    #[default]
    Text,
    /// Newline-delimited JSON objects.
    Json,
}

impl LogFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "plain" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogFormat::Text => "text",
            LogFormat::Json => "json",
        })
    }
}

/// How the global subscriber should be built.
#[derive(Debug, Clone)]
pub struct LogSettings {
    pub format: LogFormat,
    /// Verbosity used when no directives are given.
    pub level: Level,
    /// `EnvFilter` directives, normally taken from `RUST_LOG`.
    pub directives: Option<String>,
}

impl LogSettings {
    /// Settings for `format` and `level`, picking up `RUST_LOG` if set.
    pub fn new(format: LogFormat, level: Level) -> Self {
        Self {
            format,
            level,
            directives: std::env::var(EnvFilter::DEFAULT_ENV)
                .ok()
                .filter(|d| !d.trim().is_empty()),
        }
    }

    pub fn with_directives(mut self, directives: impl Into<String>) -> Self {
        self.directives = Some(directives.into());
        self
    }

    /// The filter to install, plus the directives that had to be ignored.
    pub fn filter(&self) -> (EnvFilter, Option<String>) {
        match self.directives.as_deref().map(EnvFilter::try_new) {
            Some(Ok(filter)) => (filter, None),
            Some(Err(_)) => (EnvFilter::new(self.level.as_str()), self.directives.clone()),
            None => (EnvFilter::new(self.level.as_str()), None),
        }
    }

    /// Install the global subscriber. Returns `false` when one was already
    /// installed, in which case nothing changes.
    pub fn install(self) -> bool {
        let (filter, ignored) = self.filter();

        let lines = log_fmt::layer().with_target(false).with_writer(std::io::stderr);
        let output: OutputLayer = match self.format {
            LogFormat::Json => lines.json().boxed(),
            LogFormat::Text => lines.boxed(),
        };

        let installed = tracing_subscriber::registry()
            .with(filter)
            .with(output)
            .try_init()
            .is_ok();

        if installed {
            if let Some(directives) = ignored {
                tracing::warn!(%directives, level = %self.level, "ignoring invalid RUST_LOG");
            }
        }
        installed
    }
}

/// Install stderr logging at `level`, as JSON when `json` is set.
pub fn init_tracing(json: bool, level: Level) -> bool {
    LogSettings::new(LogFormat::from_json_flag(json), level).install()
}
