#![allow(dead_code)]

use actix_session::{storage::CookieSessionStore, Session, SessionMiddleware};
use actix_web::cookie::Key;
use actix_web::{web, HttpResponse};
use publication_site::helper::image_helpers::ImageResolver;
use publication_site::helper::section_helpers::default_home_sections;
use publication_site::models::api_operations::ApiClient;
use publication_site::models::content_source::ContentSource;
use publication_site::AppState;
use std::time::Duration;
use tera::Tera;

pub const DEFAULT_IMAGE: &str = "/static/article.jpg";
pub const ADMIN_TEST_TOKEN: &str = "admin-test-token";
pub const WRITER_TEST_TOKEN: &str = "writer-test-token";

/// A bundle with posts spread over a few categories and dates.
pub const BUNDLE: &str = r#"{
  "categories": [
    {
      "name": "Web Articles",
      "items": [
        { "postId": "p1", "title": "Border Roads Ahead", "content": "<p>Roads <script>alert(1)</script>matter.</p>", "uploadDate": "2024-03-01", "author": ["A. Rao", "B. Singh"], "image": "s3://wcrt-content-images/roads.jpg", "viewCount": 40 },
        { "postId": "p2", "title": "Maritime Outlook", "content": "Sea lanes.", "uploadDate": "2024-05-10T09:30:00Z", "author": "C. Das", "viewCount": 90 },
        { "postId": "p3", "title": "Undated Piece", "content": "No date here.", "uploadDate": "soon", "viewCount": 5 }
      ]
    },
    {
      "name": "Issue Briefs",
      "items": [
        { "postId": "p4", "title": "Drone Doctrine", "content": "Brief text.", "uploadDate": "2024-04-02", "viewCount": 12 },
        { "postId": "p5", "title": "Space Assets", "content": "Orbit.", "category": "issue-briefs", "uploadDate": "2023-12-24", "viewCount": 70 }
      ]
    }
  ]
}"#;

pub fn resolver() -> ImageResolver {
    ImageResolver::new("wcrt-content-images", Some("https://cdn.example.org"), DEFAULT_IMAGE)
}

pub fn tera() -> web::Data<Tera> {
    web::Data::new(Tera::new("templates/**/*.html").expect("templates should parse"))
}

pub fn bundled_state() -> web::Data<AppState> {
    let content = ContentSource::from_bundle_str(BUNDLE).expect("bundle should parse");
    web::Data::new(AppState::new(content, None, resolver(), default_home_sections()))
}

pub fn api_state(backend_url: &str) -> web::Data<AppState> {
    let client = ApiClient::new(backend_url, Duration::from_secs(5)).expect("mock server url is valid");
    web::Data::new(AppState::new(
        ContentSource::Api(client.clone()),
        Some(client),
        resolver(),
        default_home_sections(),
    ))
}

pub fn session_key() -> Key {
    Key::from(&[7u8; 64])
}

pub fn test_session_middleware(key: Key) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_secure(false)
        .build()
}

/// Stands in for a successful admin login.
pub async fn fake_admin_login(session: Session) -> HttpResponse {
    session.insert("admin-token", ADMIN_TEST_TOKEN).expect("session insert");
    HttpResponse::Ok().finish()
}

/// Stands in for a successful writer login as `jdoe`.
pub async fn fake_writer_login(session: Session) -> HttpResponse {
    session.insert("writer-token", WRITER_TEST_TOKEN).expect("session insert");
    session.insert("writer-name", "jdoe").expect("session insert");
    session
        .insert("writer-categories", vec!["Web Articles".to_string(), "Essays".to_string()])
        .expect("session insert");
    HttpResponse::Ok().finish()
}
