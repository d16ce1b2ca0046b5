//! File scraping: format identification, stream description, grading.
//!
//! The scraper contract is intentionally small: given a file, report its MIME
//! type, format version, well-formedness, a support grade, and one descriptor
//! per content stream. Scraping is best-effort and never fails the caller; a
//! file that cannot be read produces a not-well-formed report carrying the
//! error text.
//!
//! [`BuiltinScraper`] identifies formats from magic bytes with an extension
//! fallback. It covers the payload types this pipeline needs to special-case
//! (audio/image/video streams, CSV structure, HTML well-formedness); anything
//! else degrades to a plain-text or binary stream.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Broad stream classification used to pick type-specific metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamType {
    Audio,
    Video,
    Image,
    Text,
    Binary,
}

/// One content stream of a scraped file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamDescriptor {
    pub index: usize,
    pub stream_type: StreamType,
    pub mimetype: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_separator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_header: Option<bool>,
}

/// Format-support classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Grade {
    RecommendedFileFormat,
    AcceptableFileFormat,
    BitLevelFileFormat,
    UnacceptableFileFormat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub version: String,
}

impl Default for ToolInfo {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeReport {
    pub mimetype: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// `None` when well-formedness checking was skipped.
    pub well_formed: Option<bool>,
    pub grade: Grade,
    pub streams: Vec<StreamDescriptor>,
    pub tool: ToolInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub trait FileScraper: Send + Sync {
    fn scrape(&self, path: &Path, check_wellformed: bool) -> ScrapeReport;
}

/// Magic-byte identification with an extension fallback.
#[derive(Debug, Clone, Default)]
pub struct BuiltinScraper;

/// Content sniffed from a file: enough bytes for magic numbers plus a text
/// window for structure probes.
const SNIFF_LIMIT: usize = 256 * 1024;

impl FileScraper for BuiltinScraper {
    fn scrape(&self, path: &Path, check_wellformed: bool) -> ScrapeReport {
        let mut buf = Vec::new();
        let read = File::open(path).and_then(|mut f| {
            let mut chunk = vec![0u8; SNIFF_LIMIT];
            let mut total = 0;
            loop {
                let n = f.read(&mut chunk[total..])?;
                if n == 0 || total + n == SNIFF_LIMIT {
                    total += n;
                    break;
                }
                total += n;
            }
            chunk.truncate(total);
            buf = chunk;
            Ok(())
        });

        if let Err(err) = read {
            return ScrapeReport {
                mimetype: "application/octet-stream".to_string(),
                version: None,
                well_formed: Some(false),
                grade: Grade::UnacceptableFileFormat,
                streams: Vec::new(),
                tool: ToolInfo::default(),
                error: Some(format!("cannot read {}: {err}", path.display())),
            };
        }

        let identified = identify(path, &buf);
        let well_formed = if check_wellformed {
            Some(check_wellformedness(&identified, &buf))
        } else {
            None
        };

        let grade = match well_formed {
            Some(false) => Grade::UnacceptableFileFormat,
            _ => identified.grade,
        };

        ScrapeReport {
            mimetype: identified.mimetype.clone(),
            version: identified.version.clone(),
            well_formed,
            grade,
            streams: identified.streams,
            tool: ToolInfo::default(),
            error: None,
        }
    }
}

struct Identified {
    mimetype: String,
    version: Option<String>,
    grade: Grade,
    streams: Vec<StreamDescriptor>,
}

fn stream(index: usize, stream_type: StreamType, mimetype: &str, version: Option<&str>) -> StreamDescriptor {
    StreamDescriptor {
        index,
        stream_type,
        mimetype: mimetype.to_string(),
        version: version.map(str::to_string),
        charset: None,
        delimiter: None,
        record_separator: None,
        has_header: None,
    }
}

fn simple(
    mimetype: &str,
    version: Option<&str>,
    stream_type: StreamType,
    grade: Grade,
) -> Identified {
    Identified {
        mimetype: mimetype.to_string(),
        version: version.map(str::to_string),
        grade,
        streams: vec![stream(0, stream_type, mimetype, version)],
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default()
}

fn identify(path: &Path, buf: &[u8]) -> Identified {
    use Grade::*;
    use StreamType::*;

    // Magic numbers first.
    if buf.len() >= 12 && &buf[0..4] == b"RIFF" && &buf[8..12] == b"WAVE" {
        return simple("audio/x-wav", None, Audio, RecommendedFileFormat);
    }
    if buf.len() >= 12 && &buf[0..4] == b"RIFF" && &buf[8..12] == b"AVI " {
        return simple("video/x-msvideo", None, Video, AcceptableFileFormat);
    }
    if buf.starts_with(b"fLaC") {
        return simple("audio/flac", None, Audio, RecommendedFileFormat);
    }
    if buf.starts_with(b"ID3") || (buf.len() >= 2 && buf[0] == 0xFF && buf[1] & 0xE0 == 0xE0) {
        return simple("audio/mpeg", None, Audio, AcceptableFileFormat);
    }
    if buf.starts_with(&[0x89, b'P', b'N', b'G']) {
        return simple("image/png", Some("1.2"), Image, RecommendedFileFormat);
    }
    if buf.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return simple("image/jpeg", None, Image, RecommendedFileFormat);
    }
    if buf.starts_with(b"GIF87a") || buf.starts_with(b"GIF89a") {
        let version = std::str::from_utf8(&buf[3..6]).ok();
        return simple("image/gif", version, Image, AcceptableFileFormat);
    }
    if buf.starts_with(b"II*\0") || buf.starts_with(b"MM\0*") {
        return simple("image/tiff", Some("6.0"), Image, RecommendedFileFormat);
    }
    if buf.len() >= 8 && &buf[4..8] == b"ftyp" {
        return simple("video/mp4", None, Video, AcceptableFileFormat);
    }
    if buf.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
        return simple("video/x-matroska", None, Video, AcceptableFileFormat);
    }
    if buf.starts_with(b"%PDF-") {
        let version = buf
            .get(5..8)
            .and_then(|v| std::str::from_utf8(v).ok())
            .map(|v| v.trim_end_matches(|c: char| !c.is_ascii_digit() && c != '.'));
        return simple("application/pdf", version, Binary, RecommendedFileFormat);
    }

    // Text formats by extension and content.
    let ext = extension_of(path);
    let text = std::str::from_utf8(buf).ok();

    if ext == "csv" {
        return identify_csv(text, buf);
    }
    if ext == "html" || ext == "htm" || looks_like_html(text) {
        return simple("text/html", Some("5"), Text, AcceptableFileFormat);
    }
    if ext == "xml" || text.map(|t| t.trim_start().starts_with("<?xml")).unwrap_or(false) {
        return simple("text/xml", Some("1.0"), Text, RecommendedFileFormat);
    }
    if text.is_some() {
        let mut identified = simple("text/plain", None, Text, RecommendedFileFormat);
        identified.streams[0].charset = Some("UTF-8".to_string());
        return identified;
    }

    simple(
        "application/octet-stream",
        None,
        Binary,
        UnacceptableFileFormat,
    )
}

fn looks_like_html(text: Option<&str>) -> bool {
    let Some(text) = text else { return false };
    let head = text.trim_start().to_ascii_lowercase();
    head.starts_with("<!doctype html") || head.starts_with("<html")
}

/// Probe the tabular structure of a CSV payload from its first lines.
fn identify_csv(text: Option<&str>, buf: &[u8]) -> Identified {
    let (content, charset) = match text {
        Some(t) => (t.to_string(), "UTF-8"),
        None => (String::from_utf8_lossy(buf).into_owned(), "ISO-8859-15"),
    };

    let record_separator = if content.contains("\r\n") { "CR+LF" } else { "LF" };
    let first_line = content.lines().next().unwrap_or_default();
    let delimiter = [';', '\t', ',']
        .into_iter()
        .max_by_key(|d| first_line.matches(*d).count())
        .filter(|d| first_line.contains(*d))
        .unwrap_or(',');
    // A header row is assumed when no first-line field is purely numeric.
    let has_header = !first_line
        .split(delimiter)
        .any(|field| !field.trim().is_empty() && field.trim().chars().all(|c| c.is_ascii_digit()));

    let mut descriptor = stream(0, StreamType::Text, "text/csv", None);
    descriptor.charset = Some(charset.to_string());
    descriptor.delimiter = Some(delimiter.to_string());
    descriptor.record_separator = Some(record_separator.to_string());
    descriptor.has_header = Some(has_header);

    Identified {
        mimetype: "text/csv".to_string(),
        version: None,
        grade: Grade::RecommendedFileFormat,
        streams: vec![descriptor],
    }
}

fn check_wellformedness(identified: &Identified, buf: &[u8]) -> bool {
    match identified.mimetype.as_str() {
        "text/html" => {
            let Ok(text) = std::str::from_utf8(buf) else {
                return false;
            };
            let lowered = text.to_ascii_lowercase();
            lowered.contains("<html") && lowered.contains("</html>")
        }
        "text/xml" => {
            let Ok(text) = std::str::from_utf8(buf) else {
                return false;
            };
            // crude balance check: every element opened is closed
            text.matches('<').count() == text.matches('>').count()
        }
        "text/plain" | "text/csv" => std::str::from_utf8(buf).is_ok(),
        "application/octet-stream" => false,
        // magic number matched
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn scrape_bytes(name: &str, bytes: &[u8]) -> ScrapeReport {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(bytes).unwrap();
        BuiltinScraper.scrape(&path, true)
    }

    #[test]
    fn wav_is_identified_as_audio() {
        let mut bytes = b"RIFF".to_vec();
        bytes.extend_from_slice(&[0x24, 0x00, 0x00, 0x00]);
        bytes.extend_from_slice(b"WAVEfmt ");
        let report = scrape_bytes("testfile1.wav", &bytes);
        assert_eq!(report.mimetype, "audio/x-wav");
        assert_eq!(report.well_formed, Some(true));
        assert_eq!(report.grade, Grade::RecommendedFileFormat);
        assert_eq!(report.streams[0].stream_type, StreamType::Audio);
    }

    #[test]
    fn csv_structure_is_probed() {
        let report = scrape_bytes("table.csv", b"name;age\nalice;30\nbob;31\n");
        assert_eq!(report.mimetype, "text/csv");
        let descriptor = &report.streams[0];
        assert_eq!(descriptor.delimiter.as_deref(), Some(";"));
        assert_eq!(descriptor.record_separator.as_deref(), Some("LF"));
        assert_eq!(descriptor.has_header, Some(true));
        assert_eq!(descriptor.charset.as_deref(), Some("UTF-8"));
    }

    #[test]
    fn broken_html_is_not_well_formed() {
        let report = scrape_bytes("page.html", b"<html><body><p>unclosed");
        assert_eq!(report.mimetype, "text/html");
        assert_eq!(report.well_formed, Some(false));
        assert_eq!(report.grade, Grade::UnacceptableFileFormat);

        let ok = scrape_bytes("ok.html", b"<html><body><p>fine</p></body></html>");
        assert_eq!(ok.well_formed, Some(true));
    }

    #[test]
    fn wellformedness_check_can_be_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.txt");
        std::fs::write(&path, "hello").unwrap();
        let report = BuiltinScraper.scrape(&path, false);
        assert_eq!(report.well_formed, None);
        assert_eq!(report.mimetype, "text/plain");
    }

    #[test]
    fn missing_file_yields_error_report() {
        let report = BuiltinScraper.scrape(Path::new("/nonexistent/file.bin"), true);
        assert_eq!(report.well_formed, Some(false));
        assert!(report.error.is_some());
    }
}
