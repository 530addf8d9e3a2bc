use actix_cors::Cors;
use actix_web::{
    cookie::Key,
    http::header,
    middleware::{DefaultHeaders, Logger},
    web, App, HttpServer,
};
use clap::Parser;
use publication_site::{
    config::Config,
    helper::ticker_helpers::spawn_rotation_timer,
    models::content_source::ContentSource,
    routes,
    AppState,
};
use std::convert::TryFrom;
use std::path::{Path, PathBuf};
use tera::Tera;

#[derive(Parser, Debug)]
#[command(name = "publication_server", author, version, about = "Starts the publication website.")]
struct Cli {
    /// Path to the .env configuration file.
    #[arg(long, required = true, value_name = "FILE")]
    env_file: PathBuf,
}

fn build_cors(allowed_origins: &str) -> Cors {
    let cors = if allowed_origins.trim() == "*" {
        Cors::default().allow_any_origin()
    } else {
        allowed_origins
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
    };
    cors.allowed_methods(vec!["GET", "POST"])
        .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
        .supports_credentials()
        .max_age(3600)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let cli = Cli::parse();

    // Load configuration first
    let config = Config::from_env(&cli.env_file).expect("FATAL: Failed to load or parse configuration.");

    // Initialize logger using the value from config
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(&config.log_level));

    let tera = Tera::new("templates/**/*.html").expect("Tera initialization failed");

    let backend = config
        .api_client()
        .expect("FATAL: BACKEND_URL could not be turned into an API client.");
    let content = match (&config.content_file, &backend) {
        (Some(path), _) => {
            log::info!("Serving public pages from content file {}", path);
            ContentSource::from_bundle_file(Path::new(path)).expect("FATAL: Failed to load CONTENT_FILE.")
        }
        (None, Some(client)) => ContentSource::Api(client.clone()),
        (None, None) => unreachable!("configuration requires BACKEND_URL or CONTENT_FILE"),
    };
    if backend.is_none() {
        log::warn!("BACKEND_URL is not set; the admin and writer panels are unavailable.");
    }

    let app_state = web::Data::new(
        AppState::new(content, backend, config.image_resolver(), config.home_sections.clone())
            .with_image_probes(config.probe_images),
    );

    // Newsflash ticker and hero carousel advance on independent timers.
    spawn_rotation_timer(app_state.newsflash.clone(), "newsflash", config.ticker_interval());
    spawn_rotation_timer(app_state.carousel.clone(), "carousel", config.ticker_interval());

    let session_key_bytes = hex::decode(&config.session_secret_key)
        .expect("FATAL: SESSION_SECRET_KEY in .env is not a valid hex string.");
    let session_key = Key::try_from(session_key_bytes.as_slice())
        .expect("FATAL: The decoded SESSION_SECRET_KEY is not long enough (minimum 64 bytes required).");

    let server_address = format!("{}:{}", config.web.host, config.web.port);
    log::info!("Server starting at http://{}", server_address);

    HttpServer::new(move || {
        App::new()
            .wrap(build_cors(&config.allowed_origins))
            .wrap(Logger::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("X-Frame-Options", "DENY"))
                    .add(("X-XSS-Protection", "1; mode=block")),
            )
            .app_data(web::Data::new(config.clone()))
            .app_data(web::Data::new(tera.clone()))
            .app_data(app_state.clone())
            .configure(|cfg| routes::config_site(cfg, session_key.clone(), config.use_secure_cookies))
    })
    .bind(server_address)?
    .run()
    .await
}
