use crate::helper::admin_helpers::PanelError;
use crate::helper::form_helpers::read_multipart;
use crate::helper::writer_helpers::{self, PostDraft, MAX_IMAGE_BYTES};
use crate::middleware::{writer_guard, AuthSession, WriterIdentity, WRITER_LOGIN_PATH};
use crate::models::api_operations::{posts_api_operations, writers_api_operations, ApiClient};
use crate::models::{Post, WriterCredentials, PUBLICATION_TYPES};
use crate::routes::{backend, redirect, render, set_notification, take_notification};
use crate::AppState;
use actix_csrf::extractor::{Csrf, CsrfGuarded, CsrfToken};
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tera::{Context, Tera};

const DASHBOARD_URL: &str = "/writer";

#[derive(Deserialize)]
struct LoginForm {
    csrf_token: CsrfToken,
    writer_name: String,
    password: String,
}

impl CsrfGuarded for LoginForm {
    fn csrf_token(&self) -> &CsrfToken {
        &self.csrf_token
    }
}

pub fn config_login(cfg: &mut web::ServiceConfig) {
    cfg.route("/login", web::get().to(show_writer_login_form))
        .route("/login", web::post().to(handle_writer_login))
        .route("/logout", web::post().to(handle_writer_logout));
}

pub fn config_dashboard(cfg: &mut web::ServiceConfig) {
    cfg.route("", web::get().to(show_writer_dashboard))
        .route("/posts", web::post().to(create_post_action))
        .route("/edit/{post_id}", web::get().to(show_edit_post))
        .route("/edit/{post_id}", web::post().to(edit_post_action));
}

/// A rejected writer token ends the writer session; anything else is
/// reported as a flash message on `back_to`.
fn handle_panel_error(auth: &AuthSession, err: &PanelError, fallback: &str, back_to: &str) -> HttpResponse {
    if err.is_unauthorized() {
        log::warn!("Backend rejected the writer token, clearing the writer session.");
        auth.clear_writer();
        set_notification(auth.session(), "Your session has expired. Please log in again.", "error");
        return redirect(WRITER_LOGIN_PATH);
    }
    log::error!("{}: {}", fallback, err);
    set_notification(auth.session(), &err.user_message(fallback), "error");
    redirect(back_to)
}

/// Categories offered in the post form: the writer's own, or every
/// publication type when the backend sent none.
fn category_options(writer: &WriterIdentity) -> Vec<String> {
    if writer.categories.is_empty() {
        PUBLICATION_TYPES.iter().map(|c| c.to_string()).collect()
    } else {
        writer.categories.clone()
    }
}

async fn show_writer_login_form(auth: AuthSession, tera: web::Data<Tera>, token: CsrfToken) -> HttpResponse {
    if writer_guard(auth.session()) {
        return redirect(DASHBOARD_URL);
    }
    let mut ctx = Context::new();
    take_notification(auth.session(), &mut ctx);
    ctx.insert("csrf_token", token.get());
    render(&tera, "writer/login.html", &ctx)
}

async fn handle_writer_login(
    auth: AuthSession,
    state: web::Data<AppState>,
    form: Csrf<web::Form<LoginForm>>,
) -> HttpResponse {
    let client = match backend(&state) {
        Ok(client) => client,
        Err(response) => return response,
    };
    let login_data = form.into_inner();
    if login_data.writer_name.trim().is_empty() || login_data.password.is_empty() {
        set_notification(auth.session(), "Please enter your writer name and password.", "error");
        return redirect(WRITER_LOGIN_PATH);
    }

    let credentials = WriterCredentials {
        writer_name: login_data.writer_name.trim().to_string(),
        password: login_data.password.clone(),
    };
    match writers_api_operations::login_writer(client, &credentials).await {
        Ok(login) => {
            if let Err(e) = auth.set_writer(&login) {
                log::error!("Could not store writer session: {}", e);
                set_notification(auth.session(), "Login failed. Please try again.", "error");
                return redirect(WRITER_LOGIN_PATH);
            }
            log::info!("Writer '{}' logged in.", login.writer_name);
            redirect(DASHBOARD_URL)
        }
        Err(e) => {
            log::warn!("Writer login failed for '{}': {}", credentials.writer_name, e);
            let message = if e.is_unauthorized() {
                "Invalid credentials.".to_string()
            } else {
                e.user_message("Login failed. Please try again.")
            };
            set_notification(auth.session(), &message, "error");
            redirect(WRITER_LOGIN_PATH)
        }
    }
}

async fn handle_writer_logout(auth: AuthSession) -> HttpResponse {
    auth.clear_writer();
    redirect(WRITER_LOGIN_PATH)
}

async fn show_writer_dashboard(
    writer: WriterIdentity,
    auth: AuthSession,
    state: web::Data<AppState>,
    tera: web::Data<Tera>,
) -> HttpResponse {
    let client = match backend(&state) {
        Ok(client) => client,
        Err(response) => return response,
    };
    let mut ctx = Context::new();
    take_notification(auth.session(), &mut ctx);
    ctx.insert("writer", &writer);
    ctx.insert("categories", &category_options(&writer));
    ctx.insert("draft", &PostDraft::default());

    match posts_api_operations::read_posts(client, Some(&writer.token)).await {
        Ok(posts) => {
            let mine = writer_helpers::my_posts(&posts, &writer.writer_name, &state.resolver);
            ctx.insert("my_posts", &mine);
        }
        Err(e) if e.is_unauthorized() => {
            return handle_panel_error(&auth, &PanelError::Api(e), "", WRITER_LOGIN_PATH);
        }
        Err(e) => {
            log::error!("Failed to fetch posts for writer '{}': {}", writer.writer_name, e);
            ctx.insert("error", &e.user_message("Failed to load your posts."));
            ctx.insert("my_posts", &Vec::<String>::new());
        }
    }
    render(&tera, "writer/dashboard.html", &ctx)
}

async fn create_post_action(
    writer: WriterIdentity,
    auth: AuthSession,
    state: web::Data<AppState>,
    payload: Multipart,
) -> HttpResponse {
    let client = match backend(&state) {
        Ok(client) => client,
        Err(response) => return response,
    };
    let result: Result<(), PanelError> = async {
        let form = read_multipart(payload, MAX_IMAGE_BYTES).await?;
        writer_helpers::submit_new_post(client, &writer.token, &writer.writer_name, &writer.categories, form).await
    }
    .await;

    match result {
        Ok(()) => {
            log::info!("Writer '{}' submitted a post for review.", writer.writer_name);
            set_notification(auth.session(), "Post submitted for review.", "success");
            redirect(DASHBOARD_URL)
        }
        Err(e) => handle_panel_error(&auth, &e, "Failed to create post.", DASHBOARD_URL),
    }
}

/// Loads a post for editing, refusing posts that belong to someone else.
async fn load_own_post(client: &ApiClient, writer: &WriterIdentity, post_id: &str) -> Result<Post, PanelError> {
    match posts_api_operations::read_post(client, post_id, Some(&writer.token)).await? {
        Some(post) if writer_helpers::owns_post(&post, &writer.writer_name) => Ok(post),
        Some(_) => Err(PanelError::Validation("You can only edit your own posts".to_string())),
        None => Err(PanelError::Validation("Post not found".to_string())),
    }
}

async fn show_edit_post(
    writer: WriterIdentity,
    auth: AuthSession,
    state: web::Data<AppState>,
    tera: web::Data<Tera>,
    post_id: web::Path<String>,
) -> HttpResponse {
    let client = match backend(&state) {
        Ok(client) => client,
        Err(response) => return response,
    };
    let post = match load_own_post(client, &writer, &post_id).await {
        Ok(post) => post,
        Err(e) => return handle_panel_error(&auth, &e, "Failed to load post.", DASHBOARD_URL),
    };

    let mut ctx = Context::new();
    take_notification(auth.session(), &mut ctx);
    ctx.insert("writer", &writer);
    ctx.insert("categories", &category_options(&writer));
    ctx.insert("post_id", &post.post_id);
    ctx.insert("draft", &PostDraft::from_post(&post));
    ctx.insert("image", &state.resolver.resolve_opt(post.image_url.as_deref()));
    ctx.insert("author_image", &post.author_image.as_deref().map(|a| state.resolver.resolve(a)));
    render(&tera, "writer/edit_post.html", &ctx)
}

async fn edit_post_action(
    writer: WriterIdentity,
    auth: AuthSession,
    state: web::Data<AppState>,
    post_id: web::Path<String>,
    payload: Multipart,
) -> HttpResponse {
    let client = match backend(&state) {
        Ok(client) => client,
        Err(response) => return response,
    };
    let post_id = post_id.into_inner();
    let edit_url = format!("/writer/edit/{}", post_id);

    let result: Result<(), PanelError> = async {
        let form = read_multipart(payload, MAX_IMAGE_BYTES).await?;
        let existing = load_own_post(client, &writer, &post_id).await?;
        writer_helpers::submit_post_edit(
            client,
            &writer.token,
            &writer.writer_name,
            &writer.categories,
            &existing,
            form,
        )
        .await
    }
    .await;

    match result {
        Ok(()) => {
            log::info!("Writer '{}' updated post {}.", writer.writer_name, post_id);
            set_notification(auth.session(), "Post updated successfully.", "success");
            redirect(DASHBOARD_URL)
        }
        Err(e) => handle_panel_error(&auth, &e, "Failed to update post.", &edit_url),
    }
}
