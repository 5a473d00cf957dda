//! Format detection from a path's extension chain or an explicit hint.
//!
//! Detection is pure: nothing here touches the filesystem.

use std::fmt;
use std::path::Path;

/// Logical file formats understood by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatTag {
    /// Comma-separated values.
    Csv,
    /// Tab-separated values.
    Tsv,
    /// JSON array of objects.
    Json,
    /// One JSON object per line.
    Jsonl,
    /// Excel workbook.
    Xlsx,
    /// Apache Parquet.
    Parquet,
    /// SQLite database file.
    Sqlite,
    /// HTML page containing `<table>` elements.
    Html,
}

impl FormatTag {
    /// All tags, in a stable order.
    pub const ALL: [FormatTag; 8] = [
        FormatTag::Csv,
        FormatTag::Tsv,
        FormatTag::Json,
        FormatTag::Jsonl,
        FormatTag::Xlsx,
        FormatTag::Parquet,
        FormatTag::Sqlite,
        FormatTag::Html,
    ];

    /// Lowercase tag string (`csv`, `tsv`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            FormatTag::Csv => "csv",
            FormatTag::Tsv => "tsv",
            FormatTag::Json => "json",
            FormatTag::Jsonl => "jsonl",
            FormatTag::Xlsx => "xlsx",
            FormatTag::Parquet => "parquet",
            FormatTag::Sqlite => "sqlite",
            FormatTag::Html => "html",
        }
    }

    /// Parse a tag string (case-insensitive, surrounding dots ignored).
    pub fn parse(tag: &str) -> Option<Self> {
        let tag = tag.trim_matches('.').to_ascii_lowercase();
        Self::ALL.into_iter().find(|t| t.as_str() == tag)
    }

    /// Map a file extension (without the dot) to a tag, case-insensitively.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "tsv" => Some(Self::Tsv),
            "jsonl" => Some(Self::Jsonl),
            "json" => Some(Self::Json),
            "xlsx" => Some(Self::Xlsx),
            "parquet" => Some(Self::Parquet),
            "sqlite" | "db" => Some(Self::Sqlite),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }
}

impl fmt::Display for FormatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compression wrapper recognized on the last suffix of a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// Plain file.
    None,
    /// `.gz`
    Gzip,
    /// `.zip` (single-entry archive)
    Zip,
}

impl Compression {
    /// Compression wrapper implied by the last suffix of `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        match suffix_chain(path).last().map(String::as_str) {
            Some("gz") => Self::Gzip,
            Some("zip") => Self::Zip,
            _ => Self::None,
        }
    }
}

/// Lowercased dot-separated suffixes of the file name (`a.CSV.gz` -> `["csv", "gz"]`).
///
/// Leading dots of hidden files (`.env`) do not start a suffix.
pub fn suffix_chain(path: impl AsRef<Path>) -> Vec<String> {
    let Some(name) = path.as_ref().file_name().and_then(|n| n.to_str()) else {
        return Vec::new();
    };
    name.trim_start_matches('.')
        .split('.')
        .skip(1)
        .filter(|s| !s.is_empty())
        .map(str::to_ascii_lowercase)
        .collect()
}

/// Last suffix of `path` after dropping a trailing compression wrapper.
pub fn inner_extension(path: impl AsRef<Path>) -> Option<String> {
    let mut suffixes = suffix_chain(path);
    if matches!(suffixes.last().map(String::as_str), Some("gz" | "zip")) {
        suffixes.pop();
    }
    suffixes.pop()
}

/// Detect the logical format tag of `path`.
///
/// - A non-empty `hint` wins unconditionally: it is lowercased, stripped of dots and returned
///   as-is, even if it names no known format (lookup fails later, at the registry).
/// - Otherwise the extension chain decides; a trailing `.gz`/`.zip` is ignored.
///
/// ```
/// use tabinspect::ingestion::detect;
///
/// assert_eq!(detect("FILE.CSV", None).as_deref(), Some("csv"));
/// assert_eq!(detect("a.csv.gz", None).as_deref(), Some("csv"));
/// assert_eq!(detect("x", Some(".jsonl")).as_deref(), Some("jsonl"));
/// assert_eq!(detect("file.unknown", None), None);
/// ```
pub fn detect(path: impl AsRef<Path>, hint: Option<&str>) -> Option<String> {
    if let Some(hint) = hint.filter(|h| !h.is_empty()) {
        return Some(hint.to_lowercase().trim_matches('.').to_string());
    }
    let ext = inner_extension(path)?;
    FormatTag::from_extension(&ext).map(|t| t.as_str().to_string())
}
