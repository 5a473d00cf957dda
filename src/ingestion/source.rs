//! Byte and text access for decoders, with transparent `.gz` / `.zip` unwrapping.
//!
//! Every function here reads the whole source into memory and releases the file handle before
//! returning.

use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;

use encoding_rs::Encoding;
use flate2::read::GzDecoder;
use tracing::debug;
use zip::ZipArchive;

use crate::error::{InspectError, InspectResult};

use super::detect::Compression;

/// Default text encoding label.
pub const DEFAULT_ENCODING: &str = "utf-8";

/// Read the (decompressed) bytes behind `path`.
///
/// - `.gz`: the gzip stream is inflated
/// - `.zip`: the archive must contain exactly one file entry, which is returned
/// - anything else: the raw file bytes
pub fn read_bytes(path: impl AsRef<Path>) -> InspectResult<Vec<u8>> {
    let path = path.as_ref();
    let raw = fs::read(path)?;
    match Compression::from_path(path) {
        Compression::None => Ok(raw),
        Compression::Gzip => {
            let mut decoder = GzDecoder::new(&raw[..]);
            let mut out = Vec::new();
            decoder.read_to_end(&mut out).map_err(|e| {
                InspectError::file_format(format!(
                    "invalid gzip stream in {}: {e}",
                    path.display()
                ))
            })?;
            debug!(path = %path.display(), inflated = out.len(), "gunzipped source");
            Ok(out)
        }
        Compression::Zip => unzip_single_entry(path, raw),
    }
}

fn unzip_single_entry(path: &Path, raw: Vec<u8>) -> InspectResult<Vec<u8>> {
    let mut archive = ZipArchive::new(Cursor::new(raw)).map_err(|e| {
        InspectError::file_format(format!("invalid zip archive {}: {e}", path.display()))
    })?;

    let mut file_idx: Option<usize> = None;
    for i in 0..archive.len() {
        let entry = archive.by_index(i).map_err(|e| {
            InspectError::file_format(format!("invalid zip entry in {}: {e}", path.display()))
        })?;
        if entry.is_dir() {
            continue;
        }
        if file_idx.is_some() {
            return Err(InspectError::file_format(format!(
                "zip archive {} contains more than one file",
                path.display()
            )));
        }
        file_idx = Some(i);
    }
    let idx = file_idx.ok_or_else(|| {
        InspectError::file_format(format!("zip archive {} contains no file", path.display()))
    })?;

    let mut entry = archive.by_index(idx).map_err(|e| {
        InspectError::file_format(format!("invalid zip entry in {}: {e}", path.display()))
    })?;
    let mut out = Vec::new();
    entry.read_to_end(&mut out).map_err(|e| {
        InspectError::file_format(format!(
            "cannot extract '{}' from {}: {e}",
            entry.name(),
            path.display()
        ))
    })?;
    debug!(path = %path.display(), entry = entry.name(), size = out.len(), "unzipped source");
    Ok(out)
}

/// Look up an encoding by its WHATWG label (`utf-8`, `latin1`, `windows-1252`, ...).
pub fn resolve_encoding(label: &str) -> InspectResult<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| InspectError::configuration(format!("unknown encoding '{label}'")))
}

/// Decode `bytes` strictly; malformed input is a format error. A BOM is kept as text.
pub fn decode_text(bytes: &[u8], encoding: &'static Encoding) -> InspectResult<String> {
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| text.into_owned())
        .ok_or_else(|| {
            InspectError::file_format(format!("input is not valid {}", encoding.name()))
        })
}

/// Read and decode the text behind `path` (decompressing first when needed).
pub fn read_text(path: impl AsRef<Path>, encoding_label: &str) -> InspectResult<String> {
    let encoding = resolve_encoding(encoding_label)?;
    let bytes = read_bytes(path)?;
    decode_text(&bytes, encoding)
}

/// Fail if `path` carries a compression wrapper; used by decoders that need a seekable file.
pub fn require_uncompressed(path: impl AsRef<Path>, format: &str) -> InspectResult<()> {
    let path = path.as_ref();
    match Compression::from_path(path) {
        Compression::None => Ok(()),
        _ => Err(InspectError::configuration(format!(
            "compressed {format} input is not supported ({}); decompress it first",
            path.display()
        ))),
    }
}
