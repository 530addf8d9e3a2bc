use crate::helper::admin_helpers::{self, DraftAction, PanelError, WriterDraftForm};
use crate::helper::form_helpers::{parse_form, parse_form_pairs};
use crate::middleware::{admin_guard, AdminToken, AuthSession, ADMIN_LOGIN_PATH};
use crate::models::api_operations::writers_api_operations;
use crate::models::{AdminCredentials, ModerationStatus, OTHER_PUBLICATION_TYPE, PUBLICATION_TYPES};
use crate::routes::{backend, redirect, render, set_notification, take_notification};
use crate::AppState;
use actix_csrf::extractor::{Csrf, CsrfGuarded, CsrfToken};
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tera::{Context, Tera};

const WRITERS_URL: &str = "/admin/writers";
const CREATE_WRITERS_URL: &str = "/admin/createwriters";
const POSTS_URL: &str = "/admin/posts";

#[derive(Deserialize)]
struct LoginForm {
    csrf_token: CsrfToken,
    username: String,
    password: String,
}

impl CsrfGuarded for LoginForm {
    fn csrf_token(&self) -> &CsrfToken {
        &self.csrf_token
    }
}

pub fn config_login(cfg: &mut web::ServiceConfig) {
    cfg.route("/login", web::get().to(show_admin_login_form))
        .route("/login", web::post().to(handle_admin_login))
        .route("/logout", web::post().to(handle_admin_logout));
}

pub fn config_dashboard(cfg: &mut web::ServiceConfig) {
    cfg.route("", web::get().to(show_admin_dashboard))
        .route("/writers", web::get().to(show_writers))
        .route("/writers/{writer_name}/delete", web::post().to(delete_writer_action))
        .route("/writers/{writer_name}/password", web::post().to(change_password_action))
        .route("/createwriters", web::get().to(show_create_writers))
        .route("/createwriters", web::post().to(create_writers_action))
        .route("/posts", web::get().to(show_open_posts))
        .route("/posts/{post_id}/status", web::post().to(update_status_action));
}

/// A rejected admin token ends the admin session; anything else is reported
/// as a flash message on `back_to`.
fn handle_panel_error(auth: &AuthSession, err: &PanelError, fallback: &str, back_to: &str) -> HttpResponse {
    if err.is_unauthorized() {
        log::warn!("Backend rejected the admin token, clearing the admin session.");
        auth.clear_admin();
        set_notification(auth.session(), "Your session has expired. Please log in again.", "error");
        return redirect(ADMIN_LOGIN_PATH);
    }
    log::error!("{}: {}", fallback, err);
    set_notification(auth.session(), &err.user_message(fallback), "error");
    redirect(back_to)
}

fn base_context(auth: &AuthSession) -> Context {
    let mut ctx = Context::new();
    take_notification(auth.session(), &mut ctx);
    ctx
}

async fn show_admin_login_form(auth: AuthSession, tera: web::Data<Tera>, token: CsrfToken) -> HttpResponse {
    if admin_guard(auth.session()) {
        return redirect("/admin");
    }
    let mut ctx = base_context(&auth);
    ctx.insert("csrf_token", token.get());
    render(&tera, "admin/login.html", &ctx)
}

async fn handle_admin_login(
    auth: AuthSession,
    state: web::Data<AppState>,
    form: Csrf<web::Form<LoginForm>>,
) -> HttpResponse {
    let client = match backend(&state) {
        Ok(client) => client,
        Err(response) => return response,
    };
    let login_data = form.into_inner();
    if login_data.username.trim().is_empty() || login_data.password.is_empty() {
        set_notification(auth.session(), "Please enter your username and password.", "error");
        return redirect(ADMIN_LOGIN_PATH);
    }

    let credentials = AdminCredentials {
        username: login_data.username.trim().to_string(),
        password: login_data.password.clone(),
    };
    match writers_api_operations::login_admin(client, &credentials).await {
        Ok(token) => {
            if let Err(e) = auth.set_admin_token(&token) {
                log::error!("Could not store admin token in session: {}", e);
                set_notification(auth.session(), "Login failed. Please try again.", "error");
                return redirect(ADMIN_LOGIN_PATH);
            }
            log::info!("Admin '{}' logged in.", credentials.username);
            redirect("/admin")
        }
        Err(e) => {
            log::warn!("Admin login failed for '{}': {}", credentials.username, e);
            let message = if e.is_unauthorized() {
                "Invalid credentials.".to_string()
            } else {
                e.user_message("Login failed. Please try again.")
            };
            set_notification(auth.session(), &message, "error");
            redirect(ADMIN_LOGIN_PATH)
        }
    }
}

async fn handle_admin_logout(auth: AuthSession) -> HttpResponse {
    auth.clear_admin();
    redirect(ADMIN_LOGIN_PATH)
}

async fn render_writer_list(
    token: AdminToken,
    auth: AuthSession,
    state: web::Data<AppState>,
    tera: web::Data<Tera>,
    template: &str,
) -> HttpResponse {
    let client = match backend(&state) {
        Ok(client) => client,
        Err(response) => return response,
    };
    let mut ctx = base_context(&auth);
    match writers_api_operations::read_writers(client, &token.0).await {
        Ok(writers) => ctx.insert("writers", &writers),
        Err(e) if e.is_unauthorized() => {
            return handle_panel_error(&auth, &PanelError::Api(e), "", ADMIN_LOGIN_PATH);
        }
        Err(e) => {
            log::error!("Failed to fetch writers: {}", e);
            ctx.insert("error", &e.user_message("Failed to load writers."));
            ctx.insert("writers", &Vec::<String>::new());
        }
    }
    render(&tera, template, &ctx)
}

async fn show_admin_dashboard(
    token: AdminToken,
    auth: AuthSession,
    state: web::Data<AppState>,
    tera: web::Data<Tera>,
) -> HttpResponse {
    render_writer_list(token, auth, state, tera, "admin/dashboard.html").await
}

async fn show_writers(
    token: AdminToken,
    auth: AuthSession,
    state: web::Data<AppState>,
    tera: web::Data<Tera>,
) -> HttpResponse {
    render_writer_list(token, auth, state, tera, "admin/writers.html").await
}

async fn delete_writer_action(
    token: AdminToken,
    auth: AuthSession,
    state: web::Data<AppState>,
    writer_name: web::Path<String>,
) -> HttpResponse {
    let client = match backend(&state) {
        Ok(client) => client,
        Err(response) => return response,
    };
    let writer_name = writer_name.into_inner();
    match writers_api_operations::delete_writer(client, &token.0, &writer_name).await {
        Ok(()) => {
            log::info!("Deleted writer '{}'", writer_name);
            set_notification(auth.session(), &format!("Writer '{}' deleted successfully.", writer_name), "success");
            redirect(WRITERS_URL)
        }
        Err(e) => handle_panel_error(&auth, &PanelError::Api(e), "Failed to delete writer.", WRITERS_URL),
    }
}

async fn change_password_action(
    token: AdminToken,
    auth: AuthSession,
    state: web::Data<AppState>,
    writer_name: web::Path<String>,
    form: web::Bytes,
) -> HttpResponse {
    let client = match backend(&state) {
        Ok(client) => client,
        Err(response) => return response,
    };
    let parsed = match parse_form(&form) {
        Ok(p) => p,
        Err(response) => return response,
    };
    let writer_name = writer_name.into_inner();
    let new_password = parsed.get("new_password").cloned().unwrap_or_default();

    match admin_helpers::change_password(client, &token.0, &writer_name, &new_password).await {
        Ok(()) => {
            set_notification(auth.session(), &format!("Password updated for '{}'.", writer_name), "success");
            redirect(WRITERS_URL)
        }
        Err(e) => handle_panel_error(&auth, &e, "Failed to change password.", WRITERS_URL),
    }
}

fn render_create_writers(tera: &Tera, mut ctx: Context, form: &WriterDraftForm) -> HttpResponse {
    ctx.insert("form", form);
    ctx.insert("publication_types", &PUBLICATION_TYPES);
    ctx.insert("other_type", OTHER_PUBLICATION_TYPE);
    render(tera, "admin/create_writers.html", &ctx)
}

async fn show_create_writers(_token: AdminToken, auth: AuthSession, tera: web::Data<Tera>) -> HttpResponse {
    render_create_writers(&tera, base_context(&auth), &WriterDraftForm::default())
}

async fn create_writers_action(
    token: AdminToken,
    auth: AuthSession,
    state: web::Data<AppState>,
    tera: web::Data<Tera>,
    form: web::Bytes,
) -> HttpResponse {
    let pairs = match parse_form_pairs(&form) {
        Ok(p) => p,
        Err(response) => return response,
    };
    let mut drafts = WriterDraftForm::from_pairs(&pairs);
    let mut ctx = base_context(&auth);

    match DraftAction::from_pairs(&pairs) {
        DraftAction::AddRow => {
            drafts.add_row();
            return render_create_writers(&tera, ctx, &drafts);
        }
        DraftAction::RemoveRow(index) => {
            drafts.remove_row(index);
            return render_create_writers(&tera, ctx, &drafts);
        }
        DraftAction::Submit => {}
    }

    // Validation runs before the backend is needed at all.
    if let Err(message) = drafts.validate() {
        ctx.insert("error", &message);
        return render_create_writers(&tera, ctx, &drafts);
    }
    let client = match backend(&state) {
        Ok(client) => client,
        Err(response) => return response,
    };

    match admin_helpers::create_writers(client, &token.0, &drafts).await {
        Ok(count) => {
            set_notification(auth.session(), &format!("{} writer(s) created successfully.", count), "success");
            redirect(WRITERS_URL)
        }
        Err(e) if e.is_unauthorized() => handle_panel_error(&auth, &e, "", CREATE_WRITERS_URL),
        Err(e) => {
            log::error!("Failed to create writers: {}", e);
            ctx.insert("error", &e.user_message("Failed to create writers."));
            render_create_writers(&tera, ctx, &drafts)
        }
    }
}

async fn show_open_posts(
    _token: AdminToken,
    auth: AuthSession,
    state: web::Data<AppState>,
    tera: web::Data<Tera>,
) -> HttpResponse {
    let client = match backend(&state) {
        Ok(client) => client,
        Err(response) => return response,
    };
    let mut ctx = base_context(&auth);
    match admin_helpers::open_post_previews(client, &state.resolver).await {
        Ok(posts) => ctx.insert("posts", &posts),
        Err(e) if e.is_unauthorized() => return handle_panel_error(&auth, &e, "", ADMIN_LOGIN_PATH),
        Err(e) => {
            log::error!("Failed to fetch open posts: {}", e);
            ctx.insert("error", &e.user_message("Failed to load posts awaiting review."));
            ctx.insert("posts", &Vec::<String>::new());
        }
    }
    render(&tera, "admin/posts.html", &ctx)
}

async fn update_status_action(
    token: AdminToken,
    auth: AuthSession,
    state: web::Data<AppState>,
    post_id: web::Path<String>,
    form: web::Bytes,
) -> HttpResponse {
    let client = match backend(&state) {
        Ok(client) => client,
        Err(response) => return response,
    };
    let parsed = match parse_form(&form) {
        Ok(p) => p,
        Err(response) => return response,
    };
    let post_id = post_id.into_inner();
    let decision = match parsed.get("status").map(|s| s.parse::<ModerationStatus>()) {
        Some(Ok(status)) => status,
        _ => {
            set_notification(auth.session(), "Unknown moderation decision.", "error");
            return redirect(POSTS_URL);
        }
    };

    match admin_helpers::moderate_post(client, &token.0, &post_id, decision).await {
        Ok(()) => {
            set_notification(auth.session(), &format!("Post {}.", decision), "success");
            redirect(POSTS_URL)
        }
        Err(e) => handle_panel_error(&auth, &e, "Failed to update post status.", POSTS_URL),
    }
}
