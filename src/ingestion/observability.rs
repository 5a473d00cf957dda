//! Read lifecycle callbacks.
//!
//! [`read_from_path`](super::read_from_path) reports every attempt to an optional
//! [`ReadObserver`]. Two implementations ship with the crate:
//!
//! - [`TracingObserver`] emits `tracing` events under the `tabinspect::read` target
//! - [`JsonLinesObserver`] appends one JSON object per event to a log file
//!
//! A `Vec<Arc<dyn ReadObserver>>` is itself an observer and forwards to each element in order.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::error::{ErrorKind, InspectError, InspectResult};

use super::detect::FormatTag;
use super::registry::DecoderKind;

/// How bad a failed read is. Ordered, so it can be compared against an alert threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    /// The read failed.
    Error,
    /// The file could not be opened or read at all.
    Critical,
}

impl Severity {
    /// I/O failures are critical, everything else is an error.
    pub fn for_error(error: &InspectError) -> Self {
        match error.kind() {
            ErrorKind::Io => Severity::Critical,
            ErrorKind::FileFormat | ErrorKind::Configuration | ErrorKind::Engine => Severity::Error,
        }
    }
}

/// What was being read when an event fired.
#[derive(Debug, Clone)]
pub struct ReadContext {
    pub path: PathBuf,
    /// Detected format, `None` when detection failed or the tag is not registered.
    pub format: Option<FormatTag>,
    /// Decoder the format routes to.
    pub decoder: Option<DecoderKind>,
}

impl ReadContext {
    pub fn new(path: impl Into<PathBuf>, format: Option<FormatTag>) -> Self {
        Self {
            path: path.into(),
            format,
            decoder: format.map(DecoderKind::for_tag),
        }
    }

    fn format_label(&self) -> &'static str {
        self.format.map_or("unknown", FormatTag::as_str)
    }

    fn decoder_label(&self) -> &'static str {
        self.decoder.map_or("none", DecoderKind::name)
    }
}

/// Shape of the table a successful read produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadStats {
    pub rows: usize,
    pub columns: usize,
}

/// Receives the outcome of each read. All methods default to doing nothing.
pub trait ReadObserver: Send + Sync {
    fn on_success(&self, _ctx: &ReadContext, _stats: ReadStats) {}

    fn on_failure(&self, _ctx: &ReadContext, _severity: Severity, _error: &InspectError) {}

    /// Called after [`Self::on_failure`] when `severity` reaches the configured threshold.
    fn on_alert(&self, _ctx: &ReadContext, _severity: Severity, _error: &InspectError) {}
}

impl ReadObserver for Vec<Arc<dyn ReadObserver>> {
    fn on_success(&self, ctx: &ReadContext, stats: ReadStats) {
        self.iter().for_each(|o| o.on_success(ctx, stats));
    }

    fn on_failure(&self, ctx: &ReadContext, severity: Severity, error: &InspectError) {
        self.iter().for_each(|o| o.on_failure(ctx, severity, error));
    }

    fn on_alert(&self, ctx: &ReadContext, severity: Severity, error: &InspectError) {
        self.iter().for_each(|o| o.on_alert(ctx, severity, error));
    }
}

/// Forwards read events to `tracing` (target `tabinspect::read`).
#[derive(Debug, Default)]
pub struct TracingObserver;

impl ReadObserver for TracingObserver {
    fn on_success(&self, ctx: &ReadContext, stats: ReadStats) {
        tracing::info!(
            target: "tabinspect::read",
            format = ctx.format_label(),
            decoder = ctx.decoder_label(),
            path = %ctx.path.display(),
            rows = stats.rows,
            columns = stats.columns,
            "read ok"
        );
    }

    fn on_failure(&self, ctx: &ReadContext, severity: Severity, error: &InspectError) {
        tracing::warn!(
            target: "tabinspect::read",
            ?severity,
            kind = ?error.kind(),
            format = ctx.format_label(),
            path = %ctx.path.display(),
            %error,
            "read failed"
        );
    }

    fn on_alert(&self, ctx: &ReadContext, severity: Severity, error: &InspectError) {
        tracing::error!(
            target: "tabinspect::read",
            ?severity,
            kind = ?error.kind(),
            format = ctx.format_label(),
            path = %ctx.path.display(),
            %error,
            "read alert"
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum ReadEvent {
    Ok,
    Failed,
    Alert,
}

/// One line of a [`JsonLinesObserver`] log.
#[derive(Debug, Serialize)]
struct ReadLogEntry<'a> {
    unix_ms: u128,
    event: ReadEvent,
    path: String,
    format: &'a str,
    decoder: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    rows: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    columns: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    severity: Option<Severity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<'a> ReadLogEntry<'a> {
    fn new(event: ReadEvent, ctx: &'a ReadContext) -> Self {
        Self {
            unix_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default(),
            event,
            path: ctx.path.display().to_string(),
            format: ctx.format_label(),
            decoder: ctx.decoder_label(),
            rows: None,
            columns: None,
            severity: None,
            error_kind: None,
            error: None,
        }
    }

    fn failed(event: ReadEvent, ctx: &'a ReadContext, severity: Severity, error: &InspectError) -> Self {
        Self {
            severity: Some(severity),
            error_kind: Some(error.kind()),
            error: Some(error.to_string()),
            ..Self::new(event, ctx)
        }
    }
}

/// Appends each read event as a JSON object on its own line.
///
/// The log file is opened (and created if missing) up front; a write that fails later is
/// reported through `tracing` and otherwise ignored so it never changes the read result.
#[derive(Debug)]
pub struct JsonLinesObserver {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonLinesObserver {
    pub fn create(path: impl AsRef<Path>) -> InspectResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, entry: &ReadLogEntry<'_>) {
        let mut line = match serde_json::to_vec(entry) {
            Ok(line) => line,
            Err(err) => {
                tracing::warn!(%err, "read log entry not serializable");
                return;
            }
        };
        line.push(b'\n');
        let Ok(mut file) = self.file.lock() else {
            return;
        };
        if let Err(err) = file.write_all(&line) {
            tracing::warn!(path = %self.path.display(), %err, "read log write failed");
        }
    }
}

impl ReadObserver for JsonLinesObserver {
    fn on_success(&self, ctx: &ReadContext, stats: ReadStats) {
        self.append(&ReadLogEntry {
            rows: Some(stats.rows),
            columns: Some(stats.columns),
            ..ReadLogEntry::new(ReadEvent::Ok, ctx)
        });
    }

    fn on_failure(&self, ctx: &ReadContext, severity: Severity, error: &InspectError) {
        self.append(&ReadLogEntry::failed(ReadEvent::Failed, ctx, severity, error));
    }

    fn on_alert(&self, ctx: &ReadContext, severity: Severity, error: &InspectError) {
        self.append(&ReadLogEntry::failed(ReadEvent::Alert, ctx, severity, error));
    }
}

#[cfg(test)]
mod tests {
    use super::{ReadContext, ReadEvent, ReadLogEntry, Severity};
    use crate::error::InspectError;
    use crate::ingestion::{DecoderKind, FormatTag};

    #[test]
    fn io_failures_are_critical() {
        let io = InspectError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(Severity::for_error(&io), Severity::Critical);
        assert_eq!(
            Severity::for_error(&InspectError::file_format("bad")),
            Severity::Error
        );
        assert!(Severity::Critical > Severity::Error);
    }

    #[test]
    fn context_knows_its_decoder() {
        let ctx = ReadContext::new("a.tsv", Some(FormatTag::Tsv));
        assert_eq!(ctx.decoder, Some(DecoderKind::Delimited));
        assert_eq!(ReadContext::new("a.bin", None).decoder, None);
    }

    #[test]
    fn failure_entry_carries_kind_and_severity() {
        let ctx = ReadContext::new("a.json", Some(FormatTag::Json));
        let err = InspectError::file_format("bad");
        let entry = ReadLogEntry::failed(ReadEvent::Alert, &ctx, Severity::Error, &err);
        let v = serde_json::to_value(&entry).unwrap();
        assert_eq!(v["event"], "alert");
        assert_eq!(v["format"], "json");
        assert_eq!(v["decoder"], "json");
        assert_eq!(v["severity"], "error");
        assert_eq!(v["error_kind"], "file_format");
        assert!(v.get("rows").is_none());
    }
}
