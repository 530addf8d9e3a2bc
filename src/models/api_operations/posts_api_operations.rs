use super::{ApiClient, ApiError};
use crate::models::{ModerationStatus, Post, PostList, PostPayload, PostUpdatePayload, SinglePost, StatusPayload};
use reqwest::Method;

/// GET /api/posts. The writer panel passes its token; the public site does not.
pub async fn read_posts(client: &ApiClient, token: Option<&str>) -> Result<Vec<Post>, ApiError> {
    let request = client.request(Method::GET, &["api", "posts"], token)?;
    let list: PostList = client.fetch_json(request).await?;
    Ok(list.into_posts())
}

/// GET /api/posts/status/{status}
pub async fn read_posts_by_status(client: &ApiClient, status: ModerationStatus) -> Result<Vec<Post>, ApiError> {
    let request = client.request(Method::GET, &["api", "posts", "status", status.as_str()], None)?;
    let list: PostList = client.fetch_json(request).await?;
    Ok(list.into_posts())
}

/// GET /api/posts/{id}. A 404 is reported as `Ok(None)`.
pub async fn read_post(client: &ApiClient, post_id: &str, token: Option<&str>) -> Result<Option<Post>, ApiError> {
    let request = client.request(Method::GET, &["api", "posts", post_id], token)?;
    match client.fetch_json::<SinglePost>(request).await {
        Ok(single) => Ok(Some(single.into_post())),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// POST /api/posts
pub async fn create_post(client: &ApiClient, token: &str, payload: &PostPayload) -> Result<(), ApiError> {
    let request = client.request(Method::POST, &["api", "posts"], Some(token))?.json(payload);
    client.send(request).await
}

/// PATCH /api/posts/{id}
pub async fn update_post(
    client: &ApiClient,
    token: &str,
    post_id: &str,
    payload: &PostUpdatePayload,
) -> Result<(), ApiError> {
    let request = client.request(Method::PATCH, &["api", "posts", post_id], Some(token))?.json(payload);
    client.send(request).await
}

/// PATCH /api/posts/{id}/status. The backend owns the transition; this only issues it.
pub async fn update_post_status(
    client: &ApiClient,
    token: &str,
    post_id: &str,
    status: ModerationStatus,
) -> Result<(), ApiError> {
    let request = client
        .request(Method::PATCH, &["api", "posts", post_id, "status"], Some(token))?
        .json(&StatusPayload { post_status: status });
    client.send(request).await
}
