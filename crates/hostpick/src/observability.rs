//! Structured JSONL logging for the CLI.
//!
//! Stdout belongs to command output (including `--json` documents), so logs
//! go to a daily-rolled file, or to stderr when no file can be opened.
//!
//! Records emitted under the `hostpick::usage` target are tagged with
//! `"usage": true` so usage attributes can be pulled out of the log with a
//! single filter.

use anyhow::Result;
use serde_json::{Map, Value};
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::Event;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::layer::{Context as LayerContext, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;

use hostpick_core::usage::USAGE_TARGET;

const ENV_LOG_PATH: &str = "HOSTPICK_LOG_PATH";
const ENV_LOG_DIR: &str = "HOSTPICK_LOG_DIR";
const DEFAULT_LOG_DIR_UNIX: &str = "/var/log";
const LOG_FILE_SUFFIX: &str = ".jsonl";

/// Logging settings resolved from config.
#[derive(Clone, Debug)]
pub struct LogSettings {
    /// Service name written into every record and used for the file name.
    pub service: String,
    /// `log_dir` from config; the environment takes precedence.
    pub log_dir: Option<PathBuf>,
}

impl LogSettings {
    /// Settings for this binary with an optional configured directory.
    pub fn new(log_dir: Option<PathBuf>) -> Self {
        Self {
            service: env!("CARGO_PKG_NAME").to_string(),
            log_dir,
        }
    }
}

/// Where the log file location came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LogSource {
    EnvPath,
    EnvDir,
    Config,
    Fallback,
}

impl LogSource {
    const fn as_str(self) -> &'static str {
        match self {
            Self::EnvPath => ENV_LOG_PATH,
            Self::EnvDir => ENV_LOG_DIR,
            Self::Config => "config",
            Self::Fallback => "default",
        }
    }
}

#[derive(Clone, Debug)]
struct LogTarget {
    dir: PathBuf,
    file_name: String,
    source: LogSource,
}

impl LogTarget {
    fn path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }
}

/// Keeps the background log writer alive; drop it last.
pub struct LogGuard {
    _worker: tracing_appender::non_blocking::WorkerGuard,
}

/// Install the global subscriber.
///
/// # Errors
///
/// Only fails if the subscriber cannot be installed; an unwritable log
/// location falls back to stderr with a warning.
pub fn init(settings: &LogSettings, env_filter: EnvFilter) -> Result<LogGuard> {
    let resolved = resolve_log_target(&settings.service, settings.log_dir.as_deref());
    let (writer, worker, target) = match resolved {
        Ok(target) => {
            let appender = tracing_appender::rolling::daily(&target.dir, &target.file_name);
            let (writer, worker) = tracing_appender::non_blocking(appender);
            (writer, worker, Some(target))
        }
        Err(err) => {
            eprintln!("Warning: {err}. Falling back to stderr logging.");
            let (writer, worker) = tracing_appender::non_blocking(std::io::stderr());
            (writer, worker, None)
        }
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(JsonLogLayer::new(writer, &settings.service))
        .try_init()?;

    match target {
        Some(target) => tracing::debug!(
            path = %target.path().display(),
            source = target.source.as_str(),
            "logging initialized"
        ),
        None => tracing::debug!("logging initialized on stderr"),
    }

    Ok(LogGuard { _worker: worker })
}

/// Build an `EnvFilter` from CLI flags.
///
/// Priority: `--quiet` > `-v`/`-vv` > `RUST_LOG` > configured level.
pub fn env_filter(quiet: bool, verbose: u8, default_level: &str) -> EnvFilter {
    if quiet {
        return EnvFilter::new("error");
    }

    match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    }
}

// ============================================================================
// JSON Log Layer
// ============================================================================

struct JsonLogLayer<W> {
    writer: W,
    service: String,
}

impl<W> JsonLogLayer<W> {
    fn new(writer: W, service: &str) -> Self {
        Self {
            writer,
            service: service.to_string(),
        }
    }
}

impl<S, W> tracing_subscriber::Layer<S> for JsonLogLayer<W>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    W: for<'writer> tracing_subscriber::fmt::MakeWriter<'writer> + Send + Sync + 'static,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        id: &tracing::span::Id,
        ctx: LayerContext<'_, S>,
    ) {
        let Some(span) = ctx.span(id) else { return };
        let mut visitor = JsonVisitor::default();
        attrs.record(&mut visitor);
        span.extensions_mut().insert(SpanFields(visitor.0));
    }

    fn on_record(
        &self,
        id: &tracing::span::Id,
        values: &tracing::span::Record<'_>,
        ctx: LayerContext<'_, S>,
    ) {
        let Some(span) = ctx.span(id) else { return };
        let mut visitor = JsonVisitor::default();
        values.record(&mut visitor);
        let mut extensions = span.extensions_mut();
        match extensions.get_mut::<SpanFields>() {
            Some(fields) => fields.0.extend(visitor.0),
            None => extensions.insert(SpanFields(visitor.0)),
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: LayerContext<'_, S>) {
        let metadata = event.metadata();
        let mut record = Map::new();
        record.insert(
            "timestamp".into(),
            Value::String(UtcTimestamp::now().to_string()),
        );
        record.insert(
            "level".into(),
            Value::String(metadata.level().as_str().to_lowercase()),
        );
        record.insert("service".into(), Value::String(self.service.clone()));
        record.insert("target".into(), Value::String(metadata.target().to_string()));
        if metadata.target() == USAGE_TARGET {
            record.insert("usage".into(), Value::Bool(true));
        }

        if let Some(scope) = ctx.event_scope(event) {
            for span in scope.from_root() {
                if let Some(fields) = span.extensions().get::<SpanFields>() {
                    record.extend(fields.0.clone());
                }
            }
        }

        let mut visitor = JsonVisitor::default();
        event.record(&mut visitor);
        record.extend(visitor.0);

        let mut writer = self.writer.make_writer();
        if serde_json::to_writer(&mut writer, &Value::Object(record)).is_ok() {
            let _ = writer.write_all(b"\n");
        }
    }
}

#[derive(Clone, Debug)]
struct SpanFields(Map<String, Value>);

#[derive(Default)]
struct JsonVisitor(Map<String, Value>);

impl JsonVisitor {
    fn put(&mut self, field: &tracing::field::Field, value: Value) {
        self.0.insert(field.name().to_string(), value);
    }
}

impl tracing::field::Visit for JsonVisitor {
    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.put(field, Value::Bool(value));
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.put(field, Value::Number(value.into()));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.put(field, Value::Number(value.into()));
    }

    fn record_f64(&mut self, field: &tracing::field::Field, value: f64) {
        if let Some(number) = serde_json::Number::from_f64(value) {
            self.put(field, Value::Number(number));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.put(field, Value::String(value.to_string()));
    }

    fn record_error(
        &mut self,
        field: &tracing::field::Field,
        value: &(dyn std::error::Error + 'static),
    ) {
        self.put(field, Value::String(value.to_string()));
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
        self.put(field, Value::String(format!("{value:?}")));
    }
}

/// UTC wall-clock time, rendered as RFC 3339 with millisecond precision.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct UtcTimestamp {
    secs: u64,
    millis: u32,
}

impl UtcTimestamp {
    fn now() -> Self {
        use std::time::{SystemTime, UNIX_EPOCH};

        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self {
            secs: since_epoch.as_secs(),
            millis: since_epoch.subsec_millis(),
        }
    }
}

impl fmt::Display for UtcTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (year, month, day) = civil_from_days((self.secs / 86_400) as i64);
        let secs_of_day = self.secs % 86_400;
        write!(
            f,
            "{year:04}-{month:02}-{day:02}T{:02}:{:02}:{:02}.{:03}Z",
            secs_of_day / 3600,
            (secs_of_day % 3600) / 60,
            secs_of_day % 60,
            self.millis,
        )
    }
}

/// Days since 1970-01-01 to a proleptic Gregorian (year, month, day).
const fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let shifted = days + 719_468;
    let era = if shifted >= 0 { shifted } else { shifted - 146_096 } / 146_097;
    let day_of_era = (shifted - era * 146_097) as u32;
    let year_of_era =
        (day_of_era - day_of_era / 1460 + day_of_era / 36_524 - day_of_era / 146_096) / 365;
    let day_of_year = day_of_era - (365 * year_of_era + year_of_era / 4 - year_of_era / 100);
    let month_index = (5 * day_of_year + 2) / 153;
    let day = day_of_year - (153 * month_index + 2) / 5 + 1;
    let month = if month_index < 10 {
        month_index + 3
    } else {
        month_index - 9
    };
    let year = year_of_era as i64 + era * 400 + if month <= 2 { 1 } else { 0 };
    (year, month, day)
}

// ============================================================================
// Log Target Resolution
// ============================================================================

fn resolve_log_target(service: &str, config_dir: Option<&Path>) -> Result<LogTarget, String> {
    resolve_log_target_with(
        service,
        std::env::var_os(ENV_LOG_PATH).map(PathBuf::from),
        std::env::var_os(ENV_LOG_DIR).map(PathBuf::from),
        config_dir.map(Path::to_path_buf),
    )
}

fn resolve_log_target_with(
    service: &str,
    path_override: Option<PathBuf>,
    dir_override: Option<PathBuf>,
    config_dir: Option<PathBuf>,
) -> Result<LogTarget, String> {
    if let Some(path) = path_override {
        return log_target_from_path(&path);
    }
    if let Some(dir) = dir_override {
        return log_target_in(dir, service, LogSource::EnvDir);
    }
    if let Some(dir) = config_dir {
        return log_target_in(dir, service, LogSource::Config);
    }

    let mut candidates = Vec::new();
    if cfg!(unix) {
        candidates.push(PathBuf::from(DEFAULT_LOG_DIR_UNIX));
    }
    if let Some(dir) = hostpick_core::config::user_data_local_dir() {
        candidates.push(dir.into_std_path_buf().join("logs"));
    }
    if let Ok(dir) = std::env::current_dir() {
        candidates.push(dir);
    }

    candidates
        .into_iter()
        .find_map(|dir| log_target_in(dir, service, LogSource::Fallback).ok())
        .ok_or_else(|| "no writable log directory found".to_string())
}

fn log_target_in(dir: PathBuf, service: &str, source: LogSource) -> Result<LogTarget, String> {
    let file_name = format!("{service}{LOG_FILE_SUFFIX}");
    ensure_writable(&dir, &file_name)?;
    Ok(LogTarget {
        dir,
        file_name,
        source,
    })
}

fn log_target_from_path(path: &Path) -> Result<LogTarget, String> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| format!("{ENV_LOG_PATH} must end in a UTF-8 file name"))?;
    let dir = path.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();
    ensure_writable(&dir, &file_name)?;

    Ok(LogTarget {
        dir,
        file_name,
        source: LogSource::EnvPath,
    })
}

fn ensure_writable(dir: &Path, file_name: &str) -> Result<(), String> {
    std::fs::create_dir_all(dir)
        .map_err(|e| format!("failed to create log directory {}: {e}", dir.display()))?;

    let path = dir.join(file_name);
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| format!("failed to open log file {}: {e}", path.display()))?;

    Ok(())
}
