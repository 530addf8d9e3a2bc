use super::{ApiClient, ApiError};
use crate::models::{
    AdminCredentials, AdminLoginResponse, NewWriter, PasswordPayload, Writer, WriterCredentials, WriterList,
    WriterLoginResponse,
};
use reqwest::Method;

pub async fn read_writers(client: &ApiClient, token: &str) -> Result<Vec<Writer>, ApiError> {
    let request = client.request(Method::GET, &["api", "writer"], Some(token))?;
    let list: WriterList = client.fetch_json(request).await?;
    Ok(list.writers)
}

pub async fn create_writer(client: &ApiClient, token: &str, writer: &NewWriter) -> Result<(), ApiError> {
    let request = client.request(Method::POST, &["api", "writer"], Some(token))?.json(writer);
    client.send(request).await
}

pub async fn delete_writer(client: &ApiClient, token: &str, writer_name: &str) -> Result<(), ApiError> {
    let request = client.request(Method::DELETE, &["api", "writer", writer_name], Some(token))?;
    client.send(request).await
}

pub async fn change_writer_password(
    client: &ApiClient,
    token: &str,
    writer_name: &str,
    new_password: &str,
) -> Result<(), ApiError> {
    let request = client
        .request(Method::PATCH, &["api", "writer", writer_name, "password"], Some(token))?
        .json(&PasswordPayload { new_password: new_password.to_string() });
    client.send(request).await
}

/// POST /api/admin/login, returning the bearer token for the admin panel.
pub async fn login_admin(client: &ApiClient, credentials: &AdminCredentials) -> Result<String, ApiError> {
    let request = client.request(Method::POST, &["api", "admin", "login"], None)?.json(credentials);
    let response: AdminLoginResponse = client.fetch_json(request).await?;
    Ok(response.token)
}

/// POST /api/writer/login, returning the token together with the writer's
/// name and permitted publication types.
pub async fn login_writer(
    client: &ApiClient,
    credentials: &WriterCredentials,
) -> Result<WriterLoginResponse, ApiError> {
    let request = client.request(Method::POST, &["api", "writer", "login"], None)?.json(credentials);
    let mut response: WriterLoginResponse = client.fetch_json(request).await?;
    if response.writer_name.is_empty() {
        response.writer_name = credentials.writer_name.clone();
    }
    Ok(response)
}
