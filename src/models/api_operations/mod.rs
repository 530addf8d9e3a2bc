use crate::models::ErrorBody;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub mod posts_api_operations;
pub mod uploads_api_operations;
pub mod writers_api_operations;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Backend responded with status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Backend did not return an upload URL")]
    MissingUploadUrl,
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Status { status: 404, .. })
    }

    /// The message shown inline to the user: the server-provided text when
    /// there is one, the caller's fallback otherwise.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Status { message, .. } if !message.trim().is_empty() => message.clone(),
            _ => fallback.to_string(),
        }
    }
}

/// Thin client over the backend REST API. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: Url,
    http: Client,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            return Err(ApiError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase));
        }
        let http = Client::builder().timeout(timeout).build()?;
        Ok(ApiClient { base_url, http })
    }

    /// The underlying HTTP client, shared with object-storage uploads and image probes.
    pub fn http(&self) -> &Client {
        &self.http
    }

    /// Builds `<base>/<segments...>`, percent-encoding each segment.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub(crate) fn request(
        &self,
        method: Method,
        segments: &[&str],
        token: Option<&str>,
    ) -> Result<RequestBuilder, ApiError> {
        let builder = self.http.request(method, self.endpoint(segments)?);
        Ok(match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    pub(crate) async fn fetch_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let body = check_response(request.send().await?).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    pub(crate) async fn send(&self, request: RequestBuilder) -> Result<(), ApiError> {
        check_response(request.send().await?).await.map(|_| ())
    }
}

/// Splits a response into its body or the error taxonomy: 401 is singled out,
/// any other non-2xx carries the server's `error`/`message` text if present.
pub(crate) async fn check_response(response: Response) -> Result<Vec<u8>, ApiError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized);
    }
    let body = response.bytes().await?.to_vec();
    if !status.is_success() {
        let message = serde_json::from_slice::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.error.or(b.message))
            .unwrap_or_default();
        return Err(ApiError::Status { status: status.as_u16(), message });
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_encodes_segments_under_base_path() {
        let client = ApiClient::new("https://api.example.org/backend/", Duration::from_secs(1)).unwrap();
        let url = client.endpoint(&["api", "writer", "jane doe", "password"]).unwrap();
        assert_eq!(url.as_str(), "https://api.example.org/backend/api/writer/jane%20doe/password");
    }

    #[test]
    fn rejects_non_http_base() {
        assert!(ApiClient::new("ftp://example.org", Duration::from_secs(1)).is_err());
        assert!(ApiClient::new("not a url", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn user_message_prefers_server_text() {
        let err = ApiError::Status { status: 400, message: "Title taken".into() };
        assert_eq!(err.user_message("Failed"), "Title taken");
        assert_eq!(ApiError::Unauthorized.user_message("Failed"), "Failed");
    }
}
