use clap::{Parser, Subcommand};
use publication_site::config::Config;
use publication_site::helper::image_helpers::validate_images;
use publication_site::helper::listing_helpers::{self, CategoryMatch};
use publication_site::helper::pagination_helpers::Paginator;
use publication_site::models::content_source::ContentSource;
use publication_site::models::Post;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "site_cli", author, version, about = "Inspect the content the publication site would serve.", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the .env configuration file.
    #[arg(long, required = true, value_name = "FILE")]
    env_file: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Posts {
        #[command(subcommand)]
        action: PostsAction,
    },
    Images {
        #[command(subcommand)]
        action: ImagesAction,
    },
}

#[derive(Subcommand, Debug)]
enum PostsAction {
    /// Published posts newest first, optionally narrowed to one category.
    List {
        #[arg(long)]
        category: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long, default_value_t = 10)]
        page_size: usize,
        /// Treat hyphens in categories as spaces when matching.
        #[arg(long)]
        ignore_hyphens: bool,
    },
    /// Most viewed published posts.
    Trending {
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
}

#[derive(Subcommand, Debug)]
enum ImagesAction {
    /// Show the URL each stored image path resolves to.
    Resolve {
        #[arg(required = true)]
        paths: Vec<String>,
        /// Also check that each resolved URL answers a HEAD request.
        #[arg(long)]
        probe: bool,
    },
}

#[actix_web::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = Config::from_env(&cli.env_file).expect("FATAL: Failed to load or parse configuration.");
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(&config.log_level));

    let result = match &cli.command {
        Commands::Posts { action } => match action {
            PostsAction::List { category, page, page_size, ignore_hyphens } => {
                let mode = if *ignore_hyphens { CategoryMatch::IgnoreHyphens } else { CategoryMatch::Exact };
                list_posts(&config, category.as_deref(), *page, *page_size, mode).await
            }
            PostsAction::Trending { limit } => list_trending(&config, *limit).await,
        },
        Commands::Images { action } => match action {
            ImagesAction::Resolve { paths, probe } => resolve_images(&config, paths, *probe).await,
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("❌ Error: {}", message);
            ExitCode::FAILURE
        }
    }
}

fn content_source(config: &Config) -> Result<ContentSource, String> {
    if let Some(path) = &config.content_file {
        return ContentSource::from_bundle_file(Path::new(path)).map_err(|e| e.to_string());
    }
    match config.api_client() {
        Ok(Some(client)) => Ok(ContentSource::Api(client)),
        Ok(None) => Err("Neither BACKEND_URL nor CONTENT_FILE is configured.".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

async fn load_sorted(config: &Config) -> Result<Vec<Post>, String> {
    let source = content_source(config)?;
    let posts = source.published_posts().await.map_err(|e| e.to_string())?;
    Ok(listing_helpers::sort_by_date_desc(&posts))
}

fn print_post(post: &Post) {
    println!(
        "{:<12} {:<10} {:<20} {:>6}  {}",
        listing_helpers::post_key(post),
        listing_helpers::format_short_date(&post.upload_date),
        post.category,
        post.view_count,
        post.title
    );
}

async fn list_posts(
    config: &Config,
    category: Option<&str>,
    page: usize,
    page_size: usize,
    mode: CategoryMatch,
) -> Result<(), String> {
    let sorted = load_sorted(config).await?;
    let selected: Vec<&Post> = match category {
        Some(label) => listing_helpers::filter_by_category(&sorted, label, mode),
        None => sorted.iter().collect(),
    };

    let paginator = Paginator::at_page(selected.len(), page_size, page);
    if paginator.total_pages() == 0 {
        println!("ℹ️ No published posts found.");
        return Ok(());
    }
    for post in paginator.window(&selected) {
        print_post(post);
    }
    println!(
        "\nPage {} of {} ({} posts)",
        paginator.page(),
        paginator.total_pages(),
        paginator.total()
    );
    Ok(())
}

async fn list_trending(config: &Config, limit: usize) -> Result<(), String> {
    let sorted = load_sorted(config).await?;
    let top = listing_helpers::trending(&sorted, limit);
    if top.is_empty() {
        println!("ℹ️ No published posts found.");
    }
    for post in top {
        print_post(post);
    }
    Ok(())
}

async fn resolve_images(config: &Config, paths: &[String], probe: bool) -> Result<(), String> {
    let resolver = config.image_resolver();
    if !probe {
        for path in paths {
            println!("{} -> {}", path, resolver.resolve(path));
        }
        return Ok(());
    }

    let http = reqwest::Client::builder()
        .timeout(config.request_timeout())
        .build()
        .map_err(|e| e.to_string())?;
    let checked = validate_images(&http, &resolver, paths).await;
    for path in paths {
        let url = checked.get(path).cloned().unwrap_or_else(|| resolver.resolve(path));
        let fell_back = url == resolver.default_image() && resolver.resolve(path) != url;
        let marker = if fell_back { "⚠️ fallback" } else { "✅" };
        println!("{} -> {} {}", path, url, marker);
    }
    Ok(())
}
