//! Logging setup.
//!
//! The subscriber writes to stderr and, optionally, to `{log_dir}/app.log`.
//! The console sink can be muted for a bounded operation through
//! [`Logging::quiet_scope`]; the file log is never muted.

use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{FestifyError, Result};

/// Name of the log file inside the log directory.
const LOG_FILE_NAME: &str = "app.log";

/// How logging should be set up.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Level or filter directive, e.g. `"INFO"` or `"festify=debug"`.
    /// `RUST_LOG` takes precedence when set.
    pub level: String,
    /// Directory for `app.log`; `None` disables the file log.
    pub log_dir: Option<PathBuf>,
    /// Start with the console muted.
    pub quiet: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: None,
            quiet: false,
        }
    }
}

/// Handle to the installed logging configuration.
#[derive(Debug, Clone)]
pub struct Logging {
    console_muted: Arc<AtomicBool>,
}

impl Logging {
    /// A handle that is not connected to any subscriber.
    pub fn detached() -> Self {
        Self {
            console_muted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether console output is currently discarded.
    pub fn is_console_muted(&self) -> bool {
        self.console_muted.load(Ordering::SeqCst)
    }

    /// Mute the console until the returned guard is dropped.
    pub fn quiet_scope(&self) -> QuietGuard {
        let previous = self.console_muted.swap(true, Ordering::SeqCst);
        QuietGuard {
            flag: Arc::clone(&self.console_muted),
            previous,
        }
    }

    fn console_sink(&self) -> ConsoleSink {
        ConsoleSink {
            muted: Arc::clone(&self.console_muted),
        }
    }
}

/// Restores the previous console state on drop.
#[must_use = "the console is unmuted as soon as the guard is dropped"]
#[derive(Debug)]
pub struct QuietGuard {
    flag: Arc<AtomicBool>,
    previous: bool,
}

impl Drop for QuietGuard {
    fn drop(&mut self) {
        self.flag.store(self.previous, Ordering::SeqCst);
    }
}

/// Console writer factory that honours the mute flag.
#[derive(Debug, Clone)]
struct ConsoleSink {
    muted: Arc<AtomicBool>,
}

enum ConsoleWriter {
    Stderr(io::Stderr),
    Muted,
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            ConsoleWriter::Stderr(w) => w.write(buf),
            ConsoleWriter::Muted => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            ConsoleWriter::Stderr(w) => w.flush(),
            ConsoleWriter::Muted => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for ConsoleSink {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> Self::Writer {
        if self.muted.load(Ordering::SeqCst) {
            ConsoleWriter::Muted
        } else {
            ConsoleWriter::Stderr(io::stderr())
        }
    }
}

/// Install the global subscriber. Can only succeed once per process.
pub fn init(config: &LogConfig) -> Result<Logging> {
    let logging = Logging {
        console_muted: Arc::new(AtomicBool::new(config.quiet)),
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.level.to_lowercase()))
        .map_err(|e| {
            FestifyError::Configuration(format!("Invalid log level '{}': {}", config.level, e))
        })?;

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(logging.console_sink());

    let file_layer = match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(dir.join(LOG_FILE_NAME))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| FestifyError::Configuration(format!("Logging already initialised: {}", e)))?;

    Ok(logging)
}
