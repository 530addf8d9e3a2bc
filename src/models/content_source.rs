use crate::models::api_operations::{posts_api_operations, ApiClient, ApiError};
use crate::models::{ModerationStatus, Post};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BundleError {
    #[error("Could not read content file '{path}': {source}")]
    Io { path: String, source: std::io::Error },
    #[error("Content file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Deserialize)]
struct Bundle {
    #[serde(default)]
    categories: Vec<BundleCategory>,
}

#[derive(Deserialize)]
struct BundleCategory {
    name: String,
    #[serde(default)]
    items: Vec<Post>,
}

/// Where the public site reads its posts from.
#[derive(Debug, Clone)]
pub enum ContentSource {
    /// Approved posts from the backend API.
    Api(ApiClient),
    /// A static content file bundled with the deployment.
    Bundled(Vec<Post>),
}

impl ContentSource {
    pub fn from_bundle_file(path: &Path) -> Result<Self, BundleError> {
        let raw = fs::read_to_string(path).map_err(|source| BundleError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_bundle_str(&raw)
    }

    /// Flattens `{ "categories": [{ "name", "items": [...] }] }`. Items without
    /// their own category take the name of the section they are listed under.
    pub fn from_bundle_str(raw: &str) -> Result<Self, BundleError> {
        let bundle: Bundle = serde_json::from_str(raw)?;
        let posts = bundle
            .categories
            .into_iter()
            .flat_map(|category| {
                let name = category.name;
                category.items.into_iter().map(move |mut post| {
                    if post.category.trim().is_empty() {
                        post.category = name.clone();
                    }
                    post
                })
            })
            .collect();
        Ok(ContentSource::Bundled(posts))
    }

    pub async fn published_posts(&self) -> Result<Vec<Post>, ApiError> {
        match self {
            ContentSource::Api(client) => {
                posts_api_operations::read_posts_by_status(client, ModerationStatus::Approved).await
            }
            ContentSource::Bundled(posts) => Ok(posts.clone()),
        }
    }

    /// Looks a post up by identifier. The API variant re-fetches it; the
    /// bundle matches on `postId`.
    /// A single published post by id. Posts still open or rejected are
    /// reported as missing.
    pub async fn find_post(&self, post_id: &str) -> Result<Option<Post>, ApiError> {
        let post = match self {
            ContentSource::Api(client) => posts_api_operations::read_post(client, post_id, None).await?,
            ContentSource::Bundled(posts) => posts.iter().find(|p| p.post_id == post_id).cloned(),
        };
        Ok(post.filter(Post::is_published))
    }
}
