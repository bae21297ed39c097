use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, VaultTypesError};

/// A stored file as the backend describes it on the wire.
///
/// Every field is optional here so that a descriptor missing a field is reported precisely
/// by [FileRecord::try_from] instead of failing deserialization with a generic message.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FileDescriptor {
    #[serde(alias = "_id")]
    pub id: Option<String>,
    pub name: Option<String>,
    pub size: Option<u64>,
    #[serde(rename = "type")]
    pub mime_type: Option<String>,
    pub upload_date: Option<String>,
    pub drive_url: Option<String>,
    pub drive_id: Option<String>,
}

/// Body of `GET /files`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListFilesResponse {
    #[serde(default)]
    pub files: Vec<FileDescriptor>,
}

/// The canonical, validated record for a stored file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileRecord {
    pub id: String,
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    pub upload_date: DateTime<Utc>,
    /// Retrieval URL; the backend serves files from their drive URL.
    pub url: String,
    pub drive_id: String,
    pub drive_url: String,
}

fn required_string(value: Option<String>, field: &str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        Some(_) => Err(VaultTypesError::MalformedDescriptor(format!("field `{field}` is empty"))),
        None => Err(VaultTypesError::MalformedDescriptor(format!("missing field `{field}`"))),
    }
}

/// Parses an upload timestamp.  RFC 3339 is preferred; naive ISO-8601 timestamps (as written by
/// `datetime.isoformat()` on a UTC clock) are taken to be UTC.
pub fn parse_upload_timestamp(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| VaultTypesError::MalformedDescriptor(format!("invalid upload_date {value:?}: {e}")))
}

impl TryFrom<FileDescriptor> for FileRecord {
    type Error = VaultTypesError;

    fn try_from(descriptor: FileDescriptor) -> Result<Self> {
        let id = required_string(descriptor.id, "id")?;
        let name = required_string(descriptor.name, "name")?;
        let size = descriptor
            .size
            .ok_or_else(|| VaultTypesError::MalformedDescriptor("missing field `size`".to_string()))?;
        let mime_type = required_string(descriptor.mime_type, "type")?;
        let upload_date = parse_upload_timestamp(&required_string(descriptor.upload_date, "upload_date")?)?;
        let drive_url = required_string(descriptor.drive_url, "drive_url")?;
        let drive_id = required_string(descriptor.drive_id, "drive_id")?;

        Ok(FileRecord {
            id,
            name,
            size,
            mime_type,
            upload_date,
            url: drive_url.clone(),
            drive_id,
            drive_url,
        })
    }
}

/// Parses the body of a successful `POST /upload`.
///
/// The descriptor may be the whole body or be wrapped as `{"file": {...}}`.
pub fn parse_upload_response(body: &[u8]) -> Result<FileRecord> {
    let value: Value = serde_json::from_slice(body)?;

    let descriptor_value = match value {
        Value::Object(mut map) => match map.remove("file") {
            Some(inner @ Value::Object(_)) => inner,
            Some(_) => {
                return Err(VaultTypesError::MalformedDescriptor("field `file` is not an object".to_string()));
            },
            None => Value::Object(map),
        },
        _ => return Err(VaultTypesError::MalformedDescriptor("response body is not a JSON object".to_string())),
    };

    let descriptor: FileDescriptor = serde_json::from_value(descriptor_value)?;
    FileRecord::try_from(descriptor)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    const FLAT: &str = r#"{"id":"f1","name":"a.png","size":10,"type":"image/png",
        "upload_date":"2024-01-01T00:00:00Z","drive_url":"https://x/a.png","drive_id":"d1"}"#;

    #[test]
    fn test_parse_flat_descriptor() {
        let record = parse_upload_response(FLAT.as_bytes()).unwrap();

        assert_eq!(record.id, "f1");
        assert_eq!(record.name, "a.png");
        assert_eq!(record.size, 10);
        assert_eq!(record.mime_type, "image/png");
        assert_eq!(record.upload_date, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(record.url, "https://x/a.png");
        assert_eq!(record.drive_url, "https://x/a.png");
        assert_eq!(record.drive_id, "d1");
    }

    #[test]
    fn test_parse_wrapped_descriptor_with_object_id() {
        let body = r#"{"message":"File uploaded successfully!","file":{"_id":"65a1","name":"report.pdf",
            "size":2048,"type":"application/pdf","upload_date":"2024-03-05T10:20:30.123456",
            "drive_url":"https://drive/report","drive_id":"dr9","user_id":"u1"}}"#;

        let record = parse_upload_response(body.as_bytes()).unwrap();
        assert_eq!(record.id, "65a1");
        assert_eq!(record.name, "report.pdf");
        assert_eq!(record.upload_date.timestamp(), Utc.with_ymd_and_hms(2024, 3, 5, 10, 20, 30).unwrap().timestamp());
    }

    #[test]
    fn test_missing_field_is_malformed() {
        let body = r#"{"id":"f1","name":"a.png","size":10,"type":"image/png","upload_date":"2024-01-01T00:00:00Z"}"#;
        let err = parse_upload_response(body.as_bytes()).unwrap_err();
        assert!(matches!(err, VaultTypesError::MalformedDescriptor(ref m) if m.contains("drive_url")), "{err}");
    }

    #[test]
    fn test_bad_timestamp_is_malformed() {
        let body = FLAT.replace("2024-01-01T00:00:00Z", "yesterday");
        let err = parse_upload_response(body.as_bytes()).unwrap_err();
        assert!(matches!(err, VaultTypesError::MalformedDescriptor(_)));
    }

    #[test]
    fn test_non_json_and_non_object_bodies() {
        assert!(matches!(parse_upload_response(b"<html>ok</html>"), Err(VaultTypesError::Json(_))));
        assert!(matches!(parse_upload_response(b"[1,2]"), Err(VaultTypesError::MalformedDescriptor(_))));
        assert!(matches!(parse_upload_response(br#"{"file":"f1"}"#), Err(VaultTypesError::MalformedDescriptor(_))));
    }

    #[test]
    fn test_wrong_field_type_is_json_error() {
        let body = FLAT.replace("\"size\":10", "\"size\":\"ten\"");
        assert!(matches!(parse_upload_response(body.as_bytes()), Err(VaultTypesError::Json(_))));
    }

    #[test]
    fn test_list_response_defaults_to_empty() {
        let list: ListFilesResponse = serde_json::from_str("{}").unwrap();
        assert!(list.files.is_empty());
    }
}
