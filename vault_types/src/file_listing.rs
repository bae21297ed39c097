//! Helpers for presenting a file listing: sorting, searching, MIME lookups and storage usage.

use std::cmp::Ordering;

use crate::descriptor::FileRecord;

const MIME_EXTENSIONS: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/gif", "gif"),
    ("application/pdf", "pdf"),
    ("application/msword", "doc"),
    ("application/vnd.openxmlformats-officedocument.wordprocessingml.document", "docx"),
    ("application/vnd.ms-excel", "xls"),
    ("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet", "xlsx"),
    ("application/vnd.ms-powerpoint", "ppt"),
    ("application/vnd.openxmlformats-officedocument.presentationml.presentation", "pptx"),
    ("text/plain", "txt"),
    ("text/html", "html"),
    ("text/css", "css"),
    ("text/javascript", "js"),
    ("application/json", "json"),
    ("application/xml", "xml"),
    ("application/zip", "zip"),
    ("audio/mpeg", "mp3"),
    ("audio/wav", "wav"),
    ("video/mp4", "mp4"),
    ("video/webm", "webm"),
    ("video/ogg", "ogv"),
];

pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    Name,
    Date,
    Size,
}

impl std::str::FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "name" => Ok(SortBy::Name),
            "date" => Ok(SortBy::Date),
            "size" => Ok(SortBy::Size),
            other => Err(format!("unknown sort key {other:?}, expected one of name, date, size")),
        }
    }
}

fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

/// Returns a sorted copy of `files`.
///
/// With `ascending`, names sort A to Z, sizes smallest first, and dates newest first.
/// The sort is stable.
pub fn sort_files(files: &[FileRecord], sort_by: SortBy, ascending: bool) -> Vec<FileRecord> {
    let mut sorted = files.to_vec();
    sorted.sort_by(|a, b| {
        let ordering = match sort_by {
            SortBy::Name => compare_names(&a.name, &b.name),
            SortBy::Date => b.upload_date.cmp(&a.upload_date),
            SortBy::Size => a.size.cmp(&b.size),
        };
        if ascending { ordering } else { ordering.reverse() }
    });
    sorted
}

/// Keeps the records whose name, or whose extension derived from the MIME type, contains `query`
/// case-insensitively.  An empty query keeps everything.
pub fn filter_files_by_search(files: &[FileRecord], query: &str) -> Vec<FileRecord> {
    if query.is_empty() {
        return files.to_vec();
    }

    let query = query.to_lowercase();
    files
        .iter()
        .filter(|f| {
            f.name.to_lowercase().contains(&query) || extension_for_mime_type(&f.mime_type).to_lowercase().contains(&query)
        })
        .cloned()
        .collect()
}

/// Short extension for a MIME type.  Unknown types fall back to their subtype with any
/// parameters stripped, and to `"file"` when the type has no subtype.
pub fn extension_for_mime_type(mime_type: &str) -> String {
    if let Some((_, ext)) = MIME_EXTENSIONS.iter().find(|(mime, _)| *mime == mime_type) {
        return ext.to_string();
    }

    let mut parts = mime_type.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(subtype), None) => subtype.split(';').next().unwrap_or(subtype).trim().to_string(),
        _ => "file".to_string(),
    }
}

/// MIME type for a file extension (with or without the leading dot), or `None` if unknown.
pub fn mime_type_for_extension(extension: &str) -> Option<&'static str> {
    let ext = extension.trim_start_matches('.').to_ascii_lowercase();
    if ext == "jpeg" {
        return Some("image/jpeg");
    }
    MIME_EXTENSIONS.iter().find(|(_, e)| *e == ext).map(|(mime, _)| *mime)
}

/// Whether `mime_type` matches any of `allowed`.  Entries of the form `type/*` match a whole category.
pub fn is_file_type_allowed<S: AsRef<str>>(mime_type: &str, allowed: &[S]) -> bool {
    allowed.iter().any(|pattern| {
        let pattern = pattern.as_ref();
        match pattern.strip_suffix("/*") {
            Some(category) => mime_type.strip_prefix(category).is_some_and(|rest| rest.starts_with('/')),
            None => mime_type == pattern,
        }
    })
}

/// Replaces characters that are not allowed in file names with `_`.
pub fn sanitize_file_name(file_name: &str) -> String {
    file_name
        .chars()
        .map(|c| match c {
            '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Image,
    Pdf,
    Document,
    Spreadsheet,
    Presentation,
    File,
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Image => "image",
            FileKind::Pdf => "pdf",
            FileKind::Document => "document",
            FileKind::Spreadsheet => "spreadsheet",
            FileKind::Presentation => "presentation",
            FileKind::File => "file",
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse category of a MIME type.
pub fn file_kind(mime_type: &str) -> FileKind {
    if mime_type.starts_with("image/") {
        FileKind::Image
    } else if mime_type.contains("pdf") {
        FileKind::Pdf
    } else if mime_type.contains("excel") || mime_type.contains("sheet") {
        // Checked before documents: OOXML spreadsheet types contain "officedocument".
        FileKind::Spreadsheet
    } else if mime_type.contains("powerpoint") || mime_type.contains("presentation") {
        FileKind::Presentation
    } else if mime_type.contains("word") || mime_type.contains("doc") {
        FileKind::Document
    } else {
        FileKind::File
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageLevel {
    Normal,
    Warning,
    Critical,
}

/// Bytes used against a storage quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageUsage {
    pub used: u64,
    pub total: u64,
}

impl StorageUsage {
    pub fn new(used: u64, total: u64) -> Self {
        Self { used, total }
    }

    /// Total bytes over a set of records.
    pub fn from_records(files: &[FileRecord], total: u64) -> Self {
        Self::new(files.iter().map(|f| f.size).sum(), total)
    }

    /// Percentage used, capped at 100.  A zero quota reads as full once anything is stored.
    pub fn used_percent(&self) -> f64 {
        if self.total == 0 {
            return if self.used == 0 { 0.0 } else { 100.0 };
        }
        (self.used as f64 / self.total as f64 * 100.0).min(100.0)
    }

    pub fn level(&self) -> StorageLevel {
        let pct = self.used_percent();
        if pct > 90.0 {
            StorageLevel::Critical
        } else if pct > 70.0 {
            StorageLevel::Warning
        } else {
            StorageLevel::Normal
        }
    }
}
