use crate::helper::admin_helpers::PanelError;
use crate::helper::form_helpers::{MultipartForm, UploadError, UploadedFile};
use crate::helper::image_helpers::ImageResolver;
use crate::helper::listing_helpers::{format_short_date, sort_by_date_desc};
use crate::models::api_operations::{posts_api_operations, uploads_api_operations, ApiClient};
use crate::models::{Post, PostPayload, PostUpdatePayload};
use chrono::Utc;
use serde::Serialize;

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
pub const ALLOWED_IMAGE_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/gif"];

pub const REQUIRED_FIELDS_MESSAGE: &str = "Please fill all required fields";
pub const MISSING_IMAGE_MESSAGE: &str = "Please upload a post image";

pub fn validate_image(file: &UploadedFile) -> Result<(), UploadError> {
    if !ALLOWED_IMAGE_TYPES.contains(&file.content_type.as_str()) {
        return Err(UploadError::InvalidType);
    }
    if file.bytes.len() > MAX_IMAGE_BYTES {
        return Err(UploadError::TooLarge { limit_mb: MAX_IMAGE_BYTES / (1024 * 1024) });
    }
    Ok(())
}

/// Object key for an upload: a millisecond timestamp plus the client file
/// name reduced to `[A-Za-z0-9._-]`.
pub fn storage_file_name(original: &str) -> String {
    let cleaned: String = original
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '-' })
        .collect();
    let cleaned = cleaned.trim_matches('-');
    let cleaned = if cleaned.is_empty() { "image" } else { cleaned };
    format!("{}-{}", Utc::now().timestamp_millis(), cleaned)
}

pub fn today_upload_date() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

/// The text part of the create/edit post form.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PostDraft {
    pub title: String,
    pub content: String,
    pub category: String,
    pub author_name: String,
}

impl PostDraft {
    pub fn from_form(form: &MultipartForm) -> Self {
        PostDraft {
            title: form.text("title"),
            content: form.text("content"),
            category: form.text("category"),
            author_name: form.text("author_name"),
        }
    }

    pub fn from_post(post: &Post) -> Self {
        PostDraft {
            title: post.title.clone(),
            content: post.content.clone(),
            category: post.category.clone(),
            author_name: post.author_name.clone().unwrap_or_default(),
        }
    }

    /// Title, content and category are required. When the writer has a
    /// category list, the category must be one of them.
    pub fn validate(&self, permitted: &[String]) -> Result<(), PanelError> {
        if self.title.is_empty() || self.content.is_empty() || self.category.is_empty() {
            return Err(PanelError::Validation(REQUIRED_FIELDS_MESSAGE.to_string()));
        }
        if !permitted.is_empty() && !permitted.iter().any(|c| c.eq_ignore_ascii_case(&self.category)) {
            return Err(PanelError::Validation(format!(
                "You are not permitted to publish in '{}'",
                self.category
            )));
        }
        Ok(())
    }
}

async fn upload_checked(client: &ApiClient, token: &str, file: UploadedFile) -> Result<String, PanelError> {
    let object_name = storage_file_name(&file.file_name);
    let public_url =
        uploads_api_operations::upload_image(client, token, &object_name, &file.content_type, file.bytes).await?;
    log::info!("Uploaded image {} -> {}", object_name, public_url);
    Ok(public_url)
}

/// Create flow: validate, upload images (post image required, author image
/// optional), then create the post. Nothing is uploaded when validation fails.
pub async fn submit_new_post(
    client: &ApiClient,
    token: &str,
    writer_name: &str,
    permitted: &[String],
    mut form: MultipartForm,
) -> Result<(), PanelError> {
    let draft = PostDraft::from_form(&form);
    draft.validate(permitted)?;

    let post_image = form
        .take_file("post_image")
        .ok_or_else(|| PanelError::Validation(MISSING_IMAGE_MESSAGE.to_string()))?;
    validate_image(&post_image)?;
    let author_image = form.take_file("author_image");
    if let Some(file) = &author_image {
        validate_image(file)?;
    }

    let image_url = upload_checked(client, token, post_image).await?;
    let author_image = match author_image {
        Some(file) => upload_checked(client, token, file).await?,
        None => String::new(),
    };

    let author_name = if draft.author_name.is_empty() { writer_name.to_string() } else { draft.author_name };
    let payload = PostPayload {
        title: draft.title,
        content: draft.content,
        image_url,
        author_name,
        author_image,
        category: draft.category,
    };
    posts_api_operations::create_post(client, token, &payload).await?;
    Ok(())
}

/// Edit flow: only the writer's own posts; images are replaced only when a
/// new file was chosen. The upload date is reset to today.
pub async fn submit_post_edit(
    client: &ApiClient,
    token: &str,
    writer_name: &str,
    permitted: &[String],
    existing: &Post,
    mut form: MultipartForm,
) -> Result<(), PanelError> {
    if !owns_post(existing, writer_name) {
        return Err(PanelError::Validation("You can only edit your own posts".to_string()));
    }
    let draft = PostDraft::from_form(&form);
    draft.validate(permitted)?;

    let new_image = form.take_file("post_image");
    let new_author_image = form.take_file("author_image");
    for file in new_image.iter().chain(new_author_image.iter()) {
        validate_image(file)?;
    }

    let image_url = match new_image {
        Some(file) => upload_checked(client, token, file).await?,
        None => existing.image_url.clone().unwrap_or_default(),
    };
    let author_image = match new_author_image {
        Some(file) => upload_checked(client, token, file).await?,
        None => existing.author_image.clone().unwrap_or_default(),
    };

    let payload = PostUpdatePayload {
        title: draft.title,
        content: draft.content,
        category: draft.category,
        author_name: draft.author_name,
        author_image,
        image_url,
        upload_date: today_upload_date(),
    };
    posts_api_operations::update_post(client, token, &existing.post_id, &payload).await?;
    Ok(())
}

pub fn owns_post(post: &Post, writer_name: &str) -> bool {
    post.writer_name.as_deref() == Some(writer_name)
}

#[derive(Debug, Serialize)]
pub struct MyPostView {
    pub post_id: String,
    pub title: String,
    pub category: String,
    pub status: String,
    pub date: String,
    pub image: String,
}

/// The writer's own posts, newest first.
pub fn my_posts(posts: &[Post], writer_name: &str, resolver: &ImageResolver) -> Vec<MyPostView> {
    let mine: Vec<Post> = posts.iter().filter(|p| owns_post(p, writer_name)).cloned().collect();
    sort_by_date_desc(&mine)
        .into_iter()
        .map(|post| MyPostView {
            status: post.post_status.map(|s| s.to_string()).unwrap_or_else(|| "unknown".to_string()),
            date: format_short_date(&post.upload_date),
            image: resolver.resolve_opt(post.image_url.as_deref()),
            post_id: post.post_id,
            title: post.title,
            category: post.category,
        })
        .collect()
}
