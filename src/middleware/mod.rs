use crate::models::WriterLoginResponse;
use actix_session::{Session, SessionExt, SessionInsertError};
use actix_web::{
    dev, http::header::LOCATION, http::StatusCode, FromRequest, HttpRequest, HttpResponse, ResponseError,
};
use serde::Serialize;
use std::future::{ready, Ready};
use thiserror::Error;

pub const ADMIN_TOKEN_KEY: &str = "admin-token";
pub const WRITER_TOKEN_KEY: &str = "writer-token";
pub const WRITER_NAME_KEY: &str = "writer-name";
pub const WRITER_CATEGORIES_KEY: &str = "writer-categories";

pub const ADMIN_LOGIN_PATH: &str = "/admin/login";
pub const WRITER_LOGIN_PATH: &str = "/writer/login";

/// Typed access to the signed cookie session holding the panel tokens.
pub struct AuthSession(Session);

impl AuthSession {
    pub fn new(session: Session) -> Self {
        AuthSession(session)
    }

    pub fn session(&self) -> &Session {
        &self.0
    }

    fn string(&self, key: &str) -> Option<String> {
        self.0
            .get::<String>(key)
            .unwrap_or_else(|e| {
                log::warn!("Discarding unreadable session value '{}': {}", key, e);
                None
            })
            .filter(|v| !v.is_empty())
    }

    pub fn admin_token(&self) -> Option<String> {
        self.string(ADMIN_TOKEN_KEY)
    }

    pub fn set_admin_token(&self, token: &str) -> Result<(), SessionInsertError> {
        self.0.insert(ADMIN_TOKEN_KEY, token)
    }

    pub fn clear_admin(&self) {
        self.0.remove(ADMIN_TOKEN_KEY);
    }

    /// The logged-in writer, present only when both token and name are stored.
    pub fn writer(&self) -> Option<WriterIdentity> {
        let token = self.string(WRITER_TOKEN_KEY)?;
        let writer_name = self.string(WRITER_NAME_KEY)?;
        let categories = self.0.get::<Vec<String>>(WRITER_CATEGORIES_KEY).unwrap_or(None).unwrap_or_default();
        Some(WriterIdentity { token, writer_name, categories })
    }

    pub fn set_writer(&self, login: &WriterLoginResponse) -> Result<(), SessionInsertError> {
        self.0.insert(WRITER_TOKEN_KEY, &login.token)?;
        self.0.insert(WRITER_NAME_KEY, &login.writer_name)?;
        self.0.insert(WRITER_CATEGORIES_KEY, &login.categories)
    }

    pub fn clear_writer(&self) {
        self.0.remove(WRITER_TOKEN_KEY);
        self.0.remove(WRITER_NAME_KEY);
        self.0.remove(WRITER_CATEGORIES_KEY);
    }
}

impl FromRequest for AuthSession {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        ready(Ok(AuthSession(req.get_session())))
    }
}

/// Answers an unauthenticated panel request with a redirect to its login page.
#[derive(Debug, Error)]
#[error("Authentication required")]
pub struct AuthRedirect {
    location: &'static str,
}

impl AuthRedirect {
    pub fn to(location: &'static str) -> Self {
        AuthRedirect { location }
    }
}

impl ResponseError for AuthRedirect {
    fn status_code(&self) -> StatusCode {
        StatusCode::FOUND
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::Found().append_header((LOCATION, self.location)).finish()
    }
}

/// Bearer token of the logged-in admin.
pub struct AdminToken(pub String);

impl FromRequest for AdminToken {
    type Error = AuthRedirect;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let session = AuthSession(req.get_session());
        ready(session.admin_token().map(AdminToken).ok_or(AuthRedirect::to(ADMIN_LOGIN_PATH)))
    }
}

/// The logged-in writer: token, name and permitted publication types.
#[derive(Debug, Clone, Serialize)]
pub struct WriterIdentity {
    #[serde(skip_serializing)]
    pub token: String,
    pub writer_name: String,
    pub categories: Vec<String>,
}

impl FromRequest for WriterIdentity {
    type Error = AuthRedirect;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let session = AuthSession(req.get_session());
        ready(session.writer().ok_or(AuthRedirect::to(WRITER_LOGIN_PATH)))
    }
}

pub fn admin_guard(session: &Session) -> bool {
    AuthSession::new(session.clone()).admin_token().is_some()
}

pub fn writer_guard(session: &Session) -> bool {
    AuthSession::new(session.clone()).writer().is_some()
}
