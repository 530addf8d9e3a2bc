use crate::models::api_operations::ApiClient;
use crate::models::Notification;
use crate::AppState;
use actix_csrf::CsrfMiddleware;
use actix_session::{storage::CookieSessionStore, Session, SessionMiddleware};
use actix_web::cookie::{Key, SameSite};
use actix_web::http::{header::LOCATION, Method};
use actix_web::{web, HttpResponse};
use rand::rngs::StdRng;
use tera::{Context, Tera};

pub mod admin;
pub mod public;
pub mod writer;

/// Registers every route of the site. The panels live in their own scopes
/// with the cookie session and CSRF cookies; the public pages need neither.
pub fn config_site(cfg: &mut web::ServiceConfig, session_key: Key, use_secure_cookies: bool) {
    let session_mw = |key: Key| {
        SessionMiddleware::builder(CookieSessionStore::default(), key)
            .cookie_secure(use_secure_cookies)
            .cookie_http_only(true)
            .cookie_same_site(SameSite::Lax)
            .build()
    };

    cfg.configure(public::config_api)
        .configure(public::config_pages)
        .service(actix_files::Files::new("/static", "./static"))
        .service(
            web::scope("/admin")
                .wrap(CsrfMiddleware::<StdRng>::new().set_cookie(Method::GET, "/admin/login"))
                .wrap(session_mw(session_key.clone()))
                .configure(admin::config_login)
                .configure(admin::config_dashboard),
        )
        .service(
            web::scope("/writer")
                .wrap(CsrfMiddleware::<StdRng>::new().set_cookie(Method::GET, "/writer/login"))
                .wrap(session_mw(session_key))
                .configure(writer::config_login)
                .configure(writer::config_dashboard),
        )
        .default_service(web::to(public::default_not_found));
}

pub(crate) fn render(tera: &Tera, template: &str, ctx: &Context) -> HttpResponse {
    match tera.render(template, ctx) {
        Ok(rendered) => HttpResponse::Ok().content_type("text/html; charset=utf-8").body(rendered),
        Err(err) => {
            log::error!("Template rendering error in {}: {:?}", template, err);
            HttpResponse::InternalServerError().body("Error rendering page.")
        }
    }
}

pub(crate) fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found().append_header((LOCATION, location)).finish()
}

pub(crate) fn set_notification(session: &Session, message: &str, r#type: &str) {
    let notification = Notification { message: message.to_string(), r#type: r#type.to_string() };
    if let Err(e) = session.insert("notification", &notification) {
        log::error!("Could not store notification in session: {}", e);
    }
}

/// Moves a pending flash notification into the template context.
pub(crate) fn take_notification(session: &Session, ctx: &mut Context) {
    if let Ok(Some(notification)) = session.get::<Notification>("notification") {
        ctx.insert("notification", &notification);
        session.remove("notification");
    }
}

/// The backend client for panel routes. Sites serving only a content file
/// have none, and the panels answer 503.
pub(crate) fn backend(state: &AppState) -> Result<&ApiClient, HttpResponse> {
    state.backend.as_ref().ok_or_else(|| {
        HttpResponse::ServiceUnavailable().body("The backend API is not configured for this site.")
    })
}
