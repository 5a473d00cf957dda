//! Unified read entrypoint.
//!
//! Most callers should use [`read_from_path`], which detects the format of a file, routes it to
//! the matching decoder and returns a normalized [`crate::types::Table`].
//!
//! - If [`ReadOptions::hint`] is set, it wins over the file extension.
//! - If [`ReadOptions::decode`] is `None`, the decoder runs with defaults for the detected tag.
//! - If a [`super::observability::ReadObserver`] is provided, success/failure/alerts are
//!   reported to it.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::error::{InspectError, InspectResult};
use crate::types::Table;

use super::detect::{detect, FormatTag};
use super::observability::{ReadContext, ReadObserver, ReadStats, Severity};
use super::registry::{resolve, DecodeOptions};

/// Options controlling a unified read.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct ReadOptions {
    /// Explicit format tag (`csv`, `jsonl`, ...). Wins over the extension when non-empty.
    pub hint: Option<String>,
    /// Decoder options. `None` = defaults for the detected tag.
    pub decode: Option<DecodeOptions>,
    /// Row limit; overrides any limit inside `decode`.
    pub limit: Option<usize>,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn ReadObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: Severity,
}

impl fmt::Debug for ReadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadOptions")
            .field("hint", &self.hint)
            .field("decode", &self.decode)
            .field("limit", &self.limit)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            hint: None,
            decode: None,
            limit: None,
            observer: None,
            alert_at_or_above: Severity::Critical,
        }
    }
}

impl ReadOptions {
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_decode(mut self, decode: impl Into<DecodeOptions>) -> Self {
        self.decode = Some(decode.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn ReadObserver>) -> Self {
        self.observer = Some(observer);
        self
    }
}

/// Unified read entry point for path-based sources.
///
/// Steps: detect the tag (hint wins), resolve it to a decoder, decode. An undetectable or
/// unregistered format is a configuration error.
///
/// When an observer is configured, this function reports:
///
/// - `on_success` on success, with row/column stats
/// - `on_failure` on failure, with a computed severity
/// - `on_alert` on failure when the computed severity is >= `options.alert_at_or_above`
///
/// # Examples
///
/// ## Auto-detect by extension
///
/// ```no_run
/// use tabinspect::ingestion::{read_from_path, ReadOptions};
///
/// # fn main() -> Result<(), tabinspect::InspectError> {
/// let table = read_from_path("people.csv.gz", &ReadOptions::default().with_limit(100))?;
/// println!("shape={:?}", table.shape());
/// # Ok(())
/// # }
/// ```
///
/// ## Force a format and pass decoder options
///
/// ```no_run
/// use tabinspect::ingestion::{read_from_path, ReadOptions, SqliteOptions};
///
/// # fn main() -> Result<(), tabinspect::InspectError> {
/// let opts = ReadOptions::default()
///     .with_hint("sqlite")
///     .with_decode(SqliteOptions::table("people"));
/// let table = read_from_path("warehouse.bin", &opts)?;
/// println!("columns={:?}", table.columns());
/// # Ok(())
/// # }
/// ```
///
/// ## Observability (tracing + alert threshold)
///
/// ```no_run
/// use std::sync::Arc;
///
/// use tabinspect::ingestion::{read_from_path, ReadOptions, Severity, TracingObserver};
///
/// let opts = ReadOptions {
///     observer: Some(Arc::new(TracingObserver)),
///     alert_at_or_above: Severity::Critical,
///     ..Default::default()
/// };
///
/// // Missing files are treated as Critical and will trigger `on_alert` at this threshold.
/// let _err = read_from_path("does_not_exist.csv", &opts).unwrap_err();
/// ```
pub fn read_from_path(path: impl AsRef<Path>, options: &ReadOptions) -> InspectResult<Table> {
    let path = path.as_ref();
    let tag = detect(path, options.hint.as_deref());
    let format = tag.as_deref().and_then(FormatTag::parse);
    let ctx = ReadContext::new(path, format);
    debug!(path = %path.display(), tag = ?tag, "unified read");

    let result = decode(path, tag.as_deref(), options);

    if let Some(obs) = options.observer.as_ref() {
        match &result {
            Ok(table) => obs.on_success(
                &ctx,
                ReadStats {
                    rows: table.row_count(),
                    columns: table.column_count(),
                },
            ),
            Err(e) => {
                let sev = Severity::for_error(e);
                obs.on_failure(&ctx, sev, e);
                if sev >= options.alert_at_or_above {
                    obs.on_alert(&ctx, sev, e);
                }
            }
        }
    }

    result
}

fn decode(path: &Path, tag: Option<&str>, options: &ReadOptions) -> InspectResult<Table> {
    let tag = tag.ok_or_else(|| {
        InspectError::configuration(format!("cannot detect format of {}", path.display()))
    })?;
    let kind = resolve(tag).ok_or_else(|| {
        InspectError::configuration(format!("no decoder registered for format '{tag}'"))
    })?;

    let mut decode = match &options.decode {
        Some(d) => d.clone(),
        None => DecodeOptions::defaults_for(tag).ok_or_else(|| {
            InspectError::configuration(format!("no default options for format '{tag}'"))
        })?,
    };
    if let Some(limit) = options.limit {
        decode = decode.with_limit(limit);
    }
    kind.read(path, &decode)
}

/// Owned read request, for callers that queue reads or hand them across threads.
#[derive(Debug, Clone)]
pub struct ReadRequest {
    pub path: PathBuf,
    pub options: ReadOptions,
}

impl ReadRequest {
    pub fn new(path: impl Into<PathBuf>, options: ReadOptions) -> Self {
        Self {
            path: path.into(),
            options,
        }
    }

    /// Execute the request by calling [`read_from_path`].
    pub fn run(&self) -> InspectResult<Table> {
        read_from_path(&self.path, &self.options)
    }
}
