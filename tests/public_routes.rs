mod common;

use actix_web::http::{header, StatusCode};
use actix_web::{test, App};
use publication_site::routes::config_site;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

macro_rules! public_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(common::tera())
                .app_data($state)
                .configure(|cfg| config_site(cfg, common::session_key(), false)),
        )
        .await
    };
}

async fn body_text(resp: actix_web::dev::ServiceResponse) -> String {
    let bytes = test::read_body(resp).await;
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

#[actix_web::test]
async fn server_reports_active() {
    let app = public_app!(common::bundled_state());
    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/is_server_active").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, "active");
}

#[actix_web::test]
async fn home_lists_published_posts() {
    let app = public_app!(common::bundled_state());
    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_text(resp).await;
    assert!(body.contains("Maritime Outlook"));
    assert!(body.contains("Drone Doctrine"));
    assert!(body.contains("/newsflash/next"));
    assert!(!body.contains("<script>alert(1)"));
}

#[actix_web::test]
async fn category_page_matches_label_ignoring_hyphens() {
    let app = public_app!(common::bundled_state());
    let resp = test::call_service(&app, test::TestRequest::get().uri("/publication/web-articles").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_text(resp).await;
    assert!(body.contains("Web Articles"));
    assert!(body.contains("Border Roads Ahead"));
    assert!(body.contains("Undated Piece"));
    assert!(!body.contains("Drone Doctrine"));
}

#[actix_web::test]
async fn category_page_out_of_range_still_renders() {
    let app = public_app!(common::bundled_state());
    let resp =
        test::call_service(&app, test::TestRequest::get().uri("/publication/issue-briefs?page=40").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains("Space Assets"));
}

#[actix_web::test]
async fn article_page_sanitizes_and_resolves_images() {
    let app = public_app!(common::bundled_state());
    let resp =
        test::call_service(&app, test::TestRequest::get().uri("/publication/web-articles/p1").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_text(resp).await;
    assert!(body.contains("Border Roads Ahead"));
    assert!(body.contains("A. Rao, B. Singh"));
    assert!(body.contains("March 1, 2024"));
    // Tera escapes slashes inside attribute values.
    assert!(body.contains("https:&#x2F;&#x2F;cdn.example.org&#x2F;roads.jpg"));
    assert!(body.contains("facebook.com&#x2F;sharer"));
    assert!(!body.contains("<script>alert(1)"));
}

#[actix_web::test]
async fn unknown_posts_render_not_found() {
    let app = public_app!(common::bundled_state());
    for uri in ["/post/does-not-exist", "/publication/web-articles/does-not-exist", "/no/such/page"] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{}", uri);
    }
}

#[actix_web::test]
async fn archive_lists_sections() {
    let app = public_app!(common::bundled_state());
    let resp = test::call_service(&app, test::TestRequest::get().uri("/archive").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_text(resp).await;
    assert!(body.contains("Issue Briefs"));
    assert!(body.contains("Space Assets"));
}

#[actix_web::test]
async fn about_page_is_static() {
    let app = public_app!(common::bundled_state());
    let resp = test::call_service(&app, test::TestRequest::get().uri("/about").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains("Women and Child Rights Thrust"));
}

#[actix_web::test]
async fn newsflash_controls_return_to_local_referer_only() {
    let app = public_app!(common::bundled_state());

    let req = test::TestRequest::post()
        .uri("/newsflash/next")
        .insert_header((header::REFERER, "http://localhost:8080/archive?essays_shown=12"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/archive?essays_shown=12");

    let req = test::TestRequest::post()
        .uri("/newsflash/prev")
        .insert_header((header::REFERER, "https://elsewhere.example.com/phish"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/phish");

    let resp = test::call_service(&app, test::TestRequest::post().uri("/newsflash/next").to_request()).await;
    assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/");
}

#[actix_web::test]
async fn newsflash_steps_belong_to_one_visitor() {
    let app = public_app!(common::bundled_state());

    let resp = test::call_service(&app, test::TestRequest::post().uri("/newsflash/next").to_request()).await;
    let offset = resp
        .response()
        .cookies()
        .find(|c| c.name() == "newsflash_offset")
        .expect("step should set the offset cookie")
        .into_owned();
    assert_eq!(offset.value(), "1");

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert!(body_text(resp).await.contains("1 of 5"));

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").cookie(offset.clone()).to_request()).await;
    assert!(body_text(resp).await.contains("2 of 5"));

    let req = test::TestRequest::post().uri("/newsflash/prev").cookie(offset).to_request();
    let resp = test::call_service(&app, req).await;
    let back = resp.response().cookies().find(|c| c.name() == "newsflash_offset").map(|c| c.value().to_string());
    assert_eq!(back.as_deref(), Some("0"));
}

#[actix_web::test]
async fn backend_failure_renders_inline_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/posts/status/approved"))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({ "error": "Database unavailable" })))
        .mount(&server)
        .await;

    let app = public_app!(common::api_state(&server.uri()));
    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains("Database unavailable"));
}

#[actix_web::test]
async fn api_backed_article_is_fetched_by_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/posts/status/approved"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "posts": [] })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/posts/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "post": { "postId": "abc123", "title": "Fetched Directly", "content": "Body", "category": "Essays" }
        })))
        .mount(&server)
        .await;

    let app = public_app!(common::api_state(&server.uri()));
    let resp = test::call_service(&app, test::TestRequest::get().uri("/post/abc123").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains("Fetched Directly"));
}

#[actix_web::test]
async fn unapproved_posts_are_not_served() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/posts/status/approved"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "posts": [] })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/posts/hidden1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "post": { "postId": "hidden1", "title": "Rejected Draft", "content": "Body", "post_status": "rejected" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/posts/pending1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "post": { "postId": "pending1", "title": "Awaiting Review", "content": "Body", "post_status": "open" }
        })))
        .mount(&server)
        .await;

    let app = public_app!(common::api_state(&server.uri()));
    for uri in ["/post/hidden1", "/publication/web-articles/hidden1", "/post/pending1"] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{}", uri);
        let body = body_text(resp).await;
        assert!(!body.contains("Rejected Draft") && !body.contains("Awaiting Review"), "{}", uri);
    }
}
