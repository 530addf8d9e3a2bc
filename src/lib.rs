use helper::image_helpers::ImageResolver;
use helper::section_helpers::CategorySection;
use helper::ticker_helpers::{shared_rotation, SharedRotation};
use models::api_operations::ApiClient;
use models::content_source::ContentSource;

/// Shared, per-process state handed to every handler.
pub struct AppState {
    pub content: ContentSource,
    /// Absent when the site runs from a content file only.
    pub backend: Option<ApiClient>,
    pub http: reqwest::Client,
    pub resolver: ImageResolver,
    pub home_sections: Vec<CategorySection>,
    pub probe_images: bool,
    pub newsflash: SharedRotation,
    pub carousel: SharedRotation,
}

impl AppState {
    pub fn new(
        content: ContentSource,
        backend: Option<ApiClient>,
        resolver: ImageResolver,
        home_sections: Vec<CategorySection>,
    ) -> Self {
        let http = match &backend {
            Some(client) => client.http().clone(),
            None => reqwest::Client::new(),
        };
        AppState {
            content,
            backend,
            http,
            resolver,
            home_sections,
            probe_images: false,
            newsflash: shared_rotation(),
            carousel: shared_rotation(),
        }
    }

    pub fn with_image_probes(mut self, enabled: bool) -> Self {
        self.probe_images = enabled;
        self
    }
}

pub mod config;
pub mod helper;
pub mod middleware;
pub mod models;
pub mod routes;
