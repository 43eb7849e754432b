//! Logging setup: human-readable console output plus size-rotated JSON files,
//! both filtered per subsystem according to the `logging` config section.
//!
//! Section keys are target prefixes (`nutrition`, `dbkit`, `tower_http`, ...).
//! The `default` section covers every target without its own section.

use crate::config::{LoggingConfig, Section};
use crate::paths::resolve_under;
use std::{
    collections::HashMap,
    io::{self, IsTerminal, Write},
    path::Path,
    sync::{Arc, Mutex},
};
use tracing::level_filters::LevelFilter;
use tracing::Level;
use tracing_subscriber::{
    filter::Targets,
    fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
    Registry,
};

use file_rotate::{
    compression::Compression,
    suffix::{AppendTimestamp, FileLimit},
    ContentLimit, FileRotate,
};

const DEFAULT_SECTION: &str = "default";
const DEFAULT_MAX_SIZE_MB: u64 = 100;
const DEFAULT_MAX_AGE_DAYS: u32 = 7;

// -------- level helpers --------

/// `None` means "off". Unknown names fall back to INFO.
fn parse_tracing_level(s: &str) -> Option<Level> {
    match s.trim().to_ascii_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        "off" | "none" => None,
        _ => Some(Level::INFO),
    }
}

fn level_filter(s: &str, inherited: LevelFilter) -> LevelFilter {
    if s.trim().is_empty() {
        return inherited;
    }
    parse_tracing_level(s).map_or(LevelFilter::OFF, LevelFilter::from_level)
}

/// Returns true if target == prefix or target starts with "prefix::"
fn matches_crate_prefix(target: &str, prefix: &str) -> bool {
    target
        .strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

// -------- rotating writer for files --------

#[derive(Clone)]
struct RotWriter(Arc<Mutex<FileRotate<AppendTimestamp>>>);

impl Write for RotWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log file writer poisoned"))?
            .write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log file writer poisoned"))?
            .flush()
    }
}

/// A writer that may be absent; writes to it are dropped.
struct RoutedWriter(Option<RotWriter>);

impl Write for RoutedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.0 {
            Some(w) => w.write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.0 {
            Some(w) => w.flush(),
            None => Ok(()),
        }
    }
}

/// Routes each record to the file of the longest matching section prefix,
/// falling back to the default file.
#[derive(Default)]
struct FileRouter {
    default: Option<RotWriter>,
    by_prefix: HashMap<String, RotWriter>,
}

impl FileRouter {
    fn resolve_for(&self, target: &str) -> Option<RotWriter> {
        self.by_prefix
            .iter()
            .filter(|(prefix, _)| matches_crate_prefix(target, prefix))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, w)| w.clone())
            .or_else(|| self.default.clone())
    }

    fn is_empty(&self) -> bool {
        self.default.is_none() && self.by_prefix.is_empty()
    }
}

impl<'a> fmt::MakeWriter<'a> for FileRouter {
    type Writer = RoutedWriter;

    fn make_writer(&'a self) -> Self::Writer {
        RoutedWriter(self.default.clone())
    }

    fn make_writer_for(&'a self, meta: &tracing::Metadata<'_>) -> Self::Writer {
        RoutedWriter(self.resolve_for(meta.target()))
    }
}

/// Create a rotating writer, ensuring the parent directory exists.
fn create_rotating_writer_at_path(log_path: &Path, section: &Section) -> io::Result<RotWriter> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let max_bytes = section.max_size_mb.unwrap_or(DEFAULT_MAX_SIZE_MB) * 1024 * 1024;
    let limit = match section.max_backups {
        Some(n) => FileLimit::MaxFiles(n),
        None => FileLimit::Age(chrono::Duration::days(i64::from(
            section.max_age_days.unwrap_or(DEFAULT_MAX_AGE_DAYS),
        ))),
    };

    let rot = FileRotate::new(
        log_path,
        AppendTimestamp::default(limit),
        ContentLimit::BytesSurpassed(usize::try_from(max_bytes).unwrap_or(usize::MAX)),
        Compression::None,
        #[cfg(unix)]
        None,
    );

    Ok(RotWriter(Arc::new(Mutex::new(rot))))
}

// -------- filters --------

struct Plan {
    console: Targets,
    file: Targets,
    router: FileRouter,
}

fn plan(cfg: &LoggingConfig, base_dir: &Path) -> Plan {
    let default = cfg.get(DEFAULT_SECTION);

    let console_default = default.map_or(LevelFilter::OFF, |s| {
        level_filter(&s.console_level, LevelFilter::INFO)
    });

    let mut router = FileRouter::default();
    if let Some(section) = default {
        router.default = open_section_file(DEFAULT_SECTION, section, base_dir);
    }
    let file_default = match (default, router.default.is_some()) {
        (Some(s), true) => level_filter(&s.file_level, LevelFilter::DEBUG),
        _ => LevelFilter::OFF,
    };

    let mut console = Targets::new().with_default(console_default);
    let mut file = Targets::new().with_default(file_default);

    for (prefix, section) in cfg.iter().filter(|(k, _)| k.as_str() != DEFAULT_SECTION) {
        console = console.with_target(
            prefix.clone(),
            level_filter(&section.console_level, console_default),
        );

        // A section without its own file still lands in the default file.
        let has_own_file = match open_section_file(prefix, section, base_dir) {
            Some(writer) => {
                router.by_prefix.insert(prefix.clone(), writer);
                true
            }
            None => false,
        };
        let level = if has_own_file || router.default.is_some() {
            level_filter(&section.file_level, file_default.max(LevelFilter::INFO))
        } else {
            LevelFilter::OFF
        };
        file = file.with_target(prefix.clone(), level);
    }

    Plan {
        console,
        file,
        router,
    }
}

fn open_section_file(name: &str, section: &Section, base_dir: &Path) -> Option<RotWriter> {
    if section.file.trim().is_empty() {
        return None;
    }
    let log_path = resolve_under(base_dir, Path::new(&section.file));
    match create_rotating_writer_at_path(&log_path, section) {
        Ok(writer) => Some(writer),
        Err(e) => {
            // The subscriber is not up yet; stderr is the only channel.
            eprintln!(
                "Failed to init log file for '{}': {} ({})",
                name,
                log_path.display(),
                e
            );
            None
        }
    }
}

// -------- public init --------

/// Initialize logging from a configuration.
/// - `cfg`: LoggingConfig containing the logging sections
/// - `base_dir`: directory used to resolve relative log file paths (usually server.home_dir)
///
/// Calling it again is a no-op: the first subscriber wins.
pub fn init_logging_from_config(cfg: &LoggingConfig, base_dir: &Path) {
    // Bridge `log` → `tracing` before installing the subscriber
    let _ = tracing_log::LogTracer::init();

    if cfg.is_empty() {
        let _ = tracing_subscriber::fmt()
            .with_target(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .try_init();
        return;
    }

    let Plan {
        console,
        file,
        router,
    } = plan(cfg, base_dir);

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = vec![fmt::layer()
        .with_ansi(io::stdout().is_terminal())
        .with_target(true)
        .with_level(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_filter(console)
        .boxed()];

    if !router.is_empty() {
        layers.push(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_target(true)
                .with_level(true)
                .with_current_span(true)
                .with_timer(fmt::time::UtcTime::rfc_3339())
                .with_writer(router)
                .with_filter(file)
                .boxed(),
        );
    }

    let _ = Registry::default().with(layers).try_init();
}

// =================== tests ===================
