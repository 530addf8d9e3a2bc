use super::{ApiClient, ApiError};
use crate::models::UploadTicket;
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;

/// GET /api/posts/s3/upload-url?fileName=..&fileType=..
pub async fn request_upload_url(
    client: &ApiClient,
    token: &str,
    file_name: &str,
    file_type: &str,
) -> Result<UploadTicket, ApiError> {
    let request = client
        .request(Method::GET, &["api", "posts", "s3", "upload-url"], Some(token))?
        .query(&[("fileName", file_name), ("fileType", file_type)]);
    let ticket: UploadTicket = client.fetch_json(request).await?;
    if ticket.upload_url.trim().is_empty() {
        return Err(ApiError::MissingUploadUrl);
    }
    Ok(ticket)
}

/// PUTs the file bytes straight to the presigned URL. Any 2xx is success.
pub async fn put_object(
    client: &ApiClient,
    upload_url: &str,
    content_type: &str,
    bytes: Vec<u8>,
) -> Result<(), ApiError> {
    let response = client
        .http()
        .put(upload_url)
        .header(CONTENT_TYPE, content_type)
        .body(bytes)
        .send()
        .await?;

    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    // Object storage answers with XML, so keep the raw text for the message.
    let text = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        message: format!("Storage upload failed: {} - {}", status.as_u16(), text.trim()),
    })
}

/// Presign, then PUT. Returns the public URL of the stored object.
pub async fn upload_image(
    client: &ApiClient,
    token: &str,
    file_name: &str,
    content_type: &str,
    bytes: Vec<u8>,
) -> Result<String, ApiError> {
    let ticket = request_upload_url(client, token, file_name, content_type).await?;
    put_object(client, &ticket.upload_url, content_type, bytes).await?;
    Ok(ticket.public_url)
}
