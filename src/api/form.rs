use axum::extract::Multipart;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use crate::api::response::{ApiError, ApiResult};
use crate::services::FileUpload;

/// Text fields of a multipart form plus the one file part it may carry.
pub struct FormParts {
    pub fields: Map<String, Value>,
    pub file: Option<FileUpload>,
}

/// Accepts RFC 3339, `datetime-local` style values (taken as UTC) and bare
/// dates (midnight UTC).
pub fn parse_form_date(raw: &str) -> Result<DateTime<Utc>, String> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    Err(format!("Invalid date '{}'", raw))
}

/// Reads every part of `multipart`. The part named `file_field` becomes the
/// upload (empty parts are ignored); text parts go through `insert`.
pub async fn read_form<F>(
    mut multipart: Multipart,
    file_field: &str,
    mut insert: F,
) -> ApiResult<FormParts>
where
    F: FnMut(&mut Map<String, Value>, &str, String) -> Result<(), String>,
{
    let mut fields = Map::new();
    let mut file = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        if name == file_field {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().map(str::to_string);
            let bytes = field.bytes().await?;
            if !bytes.is_empty() {
                file = Some(FileUpload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            continue;
        }

        let value = field.text().await?;
        insert(&mut fields, &name, value).map_err(ApiError::bad_request)?;
    }

    Ok(FormParts { fields, file })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_form_date_formats() {
        let expected = Utc.with_ymd_and_hms(2025, 6, 1, 9, 30, 0).unwrap();

        assert_eq!(parse_form_date("2025-06-01T09:30:00Z").unwrap(), expected);
        assert_eq!(parse_form_date("2025-06-01T15:00:00+05:30").unwrap(), expected);
        assert_eq!(parse_form_date("2025-06-01T09:30").unwrap(), expected);
        assert_eq!(
            parse_form_date("2025-06-01").unwrap(),
            Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
        );
        assert!(parse_form_date("next tuesday").is_err());
    }
}
