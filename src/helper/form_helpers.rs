use actix_multipart::{Multipart, MultipartError};
use actix_web::{web, web::BytesMut, HttpResponse};
use futures_util::StreamExt;
use std::collections::HashMap;
use thiserror::Error;
use url::form_urlencoded;

/// Parses URL-encoded form data from bytes, handling potential UTF-8 errors gracefully.
pub fn parse_form(form_bytes: &web::Bytes) -> Result<HashMap<String, String>, HttpResponse> {
    parse_form_pairs(form_bytes).map(|pairs| pairs.into_iter().collect())
}

/// Like `parse_form`, but keeps every occurrence of repeated keys (checkbox groups).
pub fn parse_form_pairs(form_bytes: &web::Bytes) -> Result<Vec<(String, String)>, HttpResponse> {
    let body = match String::from_utf8(form_bytes.to_vec()) {
        Ok(s) => s,
        Err(_) => return Err(HttpResponse::BadRequest().body("Invalid UTF-8 in request body.")),
    };
    Ok(form_urlencoded::parse(body.as_bytes()).into_owned().collect())
}

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Upload could not be read: {0}")]
    Multipart(#[from] MultipartError),
    #[error("Invalid UTF-8 in form field '{0}'.")]
    InvalidUtf8(String),
    #[error("File size exceeds {limit_mb}MB limit")]
    TooLarge { limit_mb: usize },
    #[error("Invalid file type. Only JPEG, PNG, and GIF are allowed.")]
    InvalidType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// A fully buffered multipart form: text fields plus any non-empty files.
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub fields: HashMap<String, String>,
    pub files: HashMap<String, UploadedFile>,
}

impl MultipartForm {
    pub fn text(&self, name: &str) -> String {
        self.fields.get(name).map(|v| v.trim().to_string()).unwrap_or_default()
    }

    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name)
    }
}

/// Buffers a multipart payload. Any single file larger than `max_file_bytes`
/// aborts the read. File inputs left empty by the browser are skipped.
pub async fn read_multipart(mut payload: Multipart, max_file_bytes: usize) -> Result<MultipartForm, UploadError> {
    let mut form = MultipartForm::default();

    while let Some(item) = payload.next().await {
        let mut field = item?;
        let field_name = field.content_disposition().get_name().unwrap_or_default().to_string();
        let file_name = field.content_disposition().get_filename().map(|f| f.to_string());

        let mut data = BytesMut::new();
        while let Some(chunk) = field.next().await {
            data.extend_from_slice(&chunk?);
            if file_name.is_some() && data.len() > max_file_bytes {
                return Err(UploadError::TooLarge { limit_mb: max_file_bytes / (1024 * 1024) });
            }
        }

        match file_name {
            Some(file_name) => {
                if file_name.is_empty() && data.is_empty() {
                    continue;
                }
                let content_type = field
                    .content_type()
                    .map(|m| m.essence_str().to_string())
                    .unwrap_or_default();
                form.files.insert(
                    field_name,
                    UploadedFile { file_name, content_type, bytes: data.to_vec() },
                );
            }
            None => {
                let value = String::from_utf8(data.to_vec()).map_err(|_| UploadError::InvalidUtf8(field_name.clone()))?;
                form.fields.insert(field_name, value);
            }
        }
    }

    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_keys_survive_in_pairs() {
        let body = web::Bytes::from_static(b"category_0=Books&category_0=Essays&name=Jane+Doe");
        let pairs = parse_form_pairs(&body).unwrap();
        assert_eq!(pairs.iter().filter(|(k, _)| k == "category_0").count(), 2);

        let map = parse_form(&body).unwrap();
        assert_eq!(map.get("name").map(String::as_str), Some("Jane Doe"));
    }

    #[test]
    fn invalid_utf8_is_a_bad_request() {
        let body = web::Bytes::from_static(&[0xff, 0xfe]);
        let response = parse_form(&body).unwrap_err();
        assert_eq!(response.status(), actix_web::http::StatusCode::BAD_REQUEST);
    }
}
