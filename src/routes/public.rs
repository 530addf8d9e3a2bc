use crate::helper::listing_helpers::{find_by_id_or_slug, sort_by_date_desc};
use crate::helper::pagination_helpers::PageQuery;
use crate::helper::public_helpers;
use crate::helper::ticker_helpers::{update_rotation, Rotation, SharedRotation};
use crate::models::Post;
use crate::routes::{redirect, render};
use crate::AppState;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::{http::header::REFERER, web, HttpRequest, HttpResponse, Responder};
use tera::{Context, Tera};
use url::Url;

const LOAD_ERROR: &str = "Failed to load posts. Please try again later.";
/// Steps this visitor took through the newsflash, relative to the shared timer.
const NEWSFLASH_OFFSET_COOKIE: &str = "newsflash_offset";

pub fn config_api(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/api").route("/is_server_active", web::get().to(is_server_active)));
}

pub fn config_pages(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(show_home))
        .route("/archive", web::get().to(show_archive))
        .route("/about", web::get().to(show_about))
        .route("/publication/web-articles/{slug}", web::get().to(show_article_by_slug))
        .route("/publication/{category}", web::get().to(show_category))
        .route("/post/{post_id}", web::get().to(show_article_by_id))
        .route("/newsflash/next", web::post().to(newsflash_next))
        .route("/newsflash/prev", web::post().to(newsflash_prev));
}

async fn is_server_active() -> impl Responder {
    HttpResponse::Ok().body("active")
}

/// Published posts newest first. On failure the page still renders, with an
/// inline error and no posts.
async fn load_sorted_posts(state: &AppState, ctx: &mut Context) -> Vec<Post> {
    match state.content.published_posts().await {
        Ok(posts) => sort_by_date_desc(&posts),
        Err(e) => {
            log::error!("Failed to load published posts: {}", e);
            ctx.insert("error", &e.user_message(LOAD_ERROR));
            Vec::new()
        }
    }
}

fn synced(rotation: &SharedRotation, name: &str, len: usize) -> Rotation {
    update_rotation(rotation, name, |r| {
        r.sync_len(len);
        *r
    })
}

pub fn not_found_page(tera: &Tera) -> HttpResponse {
    match tera.render("public/not_found.html", &Context::new()) {
        Ok(rendered) => HttpResponse::NotFound().content_type("text/html; charset=utf-8").body(rendered),
        Err(err) => {
            log::error!("Template rendering error in public/not_found.html: {:?}", err);
            HttpResponse::NotFound().body("Page not found")
        }
    }
}

pub async fn default_not_found(tera: web::Data<Tera>) -> HttpResponse {
    not_found_page(&tera)
}

async fn show_home(req: HttpRequest, state: web::Data<AppState>, tera: web::Data<Tera>) -> HttpResponse {
    let mut ctx = Context::new();
    let query = PageQuery::parse(req.query_string());
    let posts = load_sorted_posts(&state, &mut ctx).await;

    let featured = public_helpers::featured(&posts).len();
    let newsflash = synced(&state.newsflash, "newsflash", featured).offset_by(newsflash_offset(&req));
    let carousel = synced(&state.carousel, "carousel", featured);

    let mut view =
        public_helpers::build_home(&posts, &state.home_sections, &query, &state.resolver, newsflash, carousel);
    if state.probe_images {
        public_helpers::probe_cards(&state.http, &state.resolver, view.cards_mut()).await;
    }
    ctx.insert("page", &view);
    render(&tera, "public/home.html", &ctx)
}

async fn show_category(
    req: HttpRequest,
    category: web::Path<String>,
    state: web::Data<AppState>,
    tera: web::Data<Tera>,
) -> HttpResponse {
    let mut ctx = Context::new();
    let label = category.into_inner().to_lowercase();
    let query = PageQuery::parse(req.query_string());
    let posts = load_sorted_posts(&state, &mut ctx).await;

    let mut view = public_helpers::build_category_page(&posts, &label, &query, &state.resolver);
    if state.probe_images {
        public_helpers::probe_cards(&state.http, &state.resolver, view.cards_mut()).await;
    }
    ctx.insert("page", &view);
    render(&tera, "public/category.html", &ctx)
}

async fn show_archive(req: HttpRequest, state: web::Data<AppState>, tera: web::Data<Tera>) -> HttpResponse {
    let mut ctx = Context::new();
    let query = PageQuery::parse(req.query_string());
    let posts = load_sorted_posts(&state, &mut ctx).await;
    let sections = public_helpers::build_archive(&posts, &state.home_sections, &query, &state.resolver);
    ctx.insert("sections", &sections);
    render(&tera, "public/archive.html", &ctx)
}

async fn show_about(tera: web::Data<Tera>) -> HttpResponse {
    render(&tera, "public/about.html", &Context::new())
}

async fn show_article_by_slug(
    req: HttpRequest,
    slug: web::Path<String>,
    state: web::Data<AppState>,
    tera: web::Data<Tera>,
) -> HttpResponse {
    let mut ctx = Context::new();
    let key = slug.into_inner();
    let posts = load_sorted_posts(&state, &mut ctx).await;

    let post = match find_by_id_or_slug(&posts, &key) {
        Some(post) => Some(post.clone()),
        // Not among the published list: ask the source directly by id.
        None => state.content.find_post(&key).await.unwrap_or_else(|e| {
            log::error!("Failed to load post '{}': {}", key, e);
            None
        }),
    };
    render_article(&req, &state, &tera, ctx, post, &posts).await
}

async fn show_article_by_id(
    req: HttpRequest,
    post_id: web::Path<String>,
    state: web::Data<AppState>,
    tera: web::Data<Tera>,
) -> HttpResponse {
    let mut ctx = Context::new();
    let post_id = post_id.into_inner();
    let post = match state.content.find_post(&post_id).await {
        Ok(post) => post,
        Err(e) => {
            log::error!("Failed to load post '{}': {}", post_id, e);
            ctx.insert("error", &e.user_message("Failed to load this post. Please try again later."));
            return render(&tera, "public/error.html", &ctx);
        }
    };
    let posts = load_sorted_posts(&state, &mut ctx).await;
    render_article(&req, &state, &tera, ctx, post, &posts).await
}

async fn render_article(
    req: &HttpRequest,
    state: &AppState,
    tera: &Tera,
    mut ctx: Context,
    post: Option<Post>,
    sorted: &[Post],
) -> HttpResponse {
    let Some(post) = post else {
        return not_found_page(tera);
    };
    let page_url = {
        let info = req.connection_info();
        format!("{}://{}{}", info.scheme(), info.host(), req.path())
    };

    let mut view = public_helpers::build_article(&post, sorted, &page_url, &state.resolver);
    if state.probe_images {
        public_helpers::probe_cards(&state.http, &state.resolver, view.cards_mut()).await;
    }
    ctx.insert("article", &view);
    render(tera, "public/article.html", &ctx)
}

/// Redirects to the path of the referring page on this site, or home.
fn back_to_referer(req: &HttpRequest) -> HttpResponse {
    let target = req
        .headers()
        .get(REFERER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Url::parse(v).ok())
        .map(|url| match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        })
        .unwrap_or_else(|| "/".to_string());
    redirect(&target)
}

fn newsflash_offset(req: &HttpRequest) -> i64 {
    req.cookie(NEWSFLASH_OFFSET_COOKIE)
        .and_then(|c| c.value().parse().ok())
        .unwrap_or(0)
}

/// Moves only this visitor's newsflash; the timer-driven position is shared.
fn step_newsflash(req: &HttpRequest, step: i64) -> HttpResponse {
    let offset = newsflash_offset(req).saturating_add(step);
    let cookie = Cookie::build(NEWSFLASH_OFFSET_COOKIE, offset.to_string())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish();

    let mut response = back_to_referer(req);
    if let Err(e) = response.add_cookie(&cookie) {
        log::error!("Could not set newsflash cookie: {}", e);
    }
    response
}

async fn newsflash_next(req: HttpRequest) -> HttpResponse {
    step_newsflash(&req, 1)
}

async fn newsflash_prev(req: HttpRequest) -> HttpResponse {
    step_newsflash(&req, -1)
}
