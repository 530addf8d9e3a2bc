use crate::helper::form_helpers::UploadError;
use crate::helper::image_helpers::ImageResolver;
use crate::helper::listing_helpers::{format_short_date, sort_by_date_desc};
use crate::helper::sanitization_helpers::preview_text;
use crate::models::api_operations::{posts_api_operations, writers_api_operations, ApiClient, ApiError};
use crate::models::{ModerationStatus, NewWriter, OTHER_PUBLICATION_TYPE};
use serde::Serialize;
use thiserror::Error;

pub const MISSING_FIELDS_MESSAGE: &str = "Please fill in all fields for every writer";
pub const MISSING_CATEGORY_MESSAGE: &str = "Please select at least one publication type";
pub const MISSING_OTHER_MESSAGE: &str = "Please specify the other publication type";

const MAX_DRAFT_ROWS: usize = 50;
const PREVIEW_CHARS: usize = 200;

/// Failure of an admin or writer panel action.
#[derive(Error, Debug)]
pub enum PanelError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl PanelError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, PanelError::Api(e) if e.is_unauthorized())
    }

    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            PanelError::Validation(message) => message.clone(),
            PanelError::Upload(e) => e.to_string(),
            PanelError::Api(e) => e.user_message(fallback),
        }
    }
}

/// One row of the bulk writer-creation form. Lives only in the request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WriterDraft {
    pub writer_name: String,
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub categories: Vec<String>,
    pub other_category: String,
}

impl WriterDraft {
    pub fn has_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }

    /// Selects or deselects a publication type. Deselecting "Other" also
    /// clears its free-text value.
    pub fn toggle_category(&mut self, category: &str) {
        if let Some(pos) = self.categories.iter().position(|c| c == category) {
            self.categories.remove(pos);
            if category == OTHER_PUBLICATION_TYPE {
                self.other_category.clear();
            }
        } else {
            self.categories.push(category.to_string());
        }
    }

    pub fn validate(&self) -> Result<NewWriter, String> {
        let fields = [&self.writer_name, &self.full_name, &self.email, &self.password];
        if fields.iter().any(|f| f.trim().is_empty()) {
            return Err(MISSING_FIELDS_MESSAGE.to_string());
        }
        if self.categories.is_empty() {
            return Err(MISSING_CATEGORY_MESSAGE.to_string());
        }

        let mut categories = Vec::with_capacity(self.categories.len());
        for category in &self.categories {
            if category == OTHER_PUBLICATION_TYPE {
                let other = self.other_category.trim();
                if other.is_empty() {
                    return Err(MISSING_OTHER_MESSAGE.to_string());
                }
                categories.push(other.to_string());
            } else {
                categories.push(category.clone());
            }
        }

        Ok(NewWriter {
            writer_name: self.writer_name.trim().to_string(),
            full_name: self.full_name.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            categories,
        })
    }
}

/// What the bulk form asked for: the buttons share one `action` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftAction {
    Submit,
    AddRow,
    RemoveRow(usize),
}

impl DraftAction {
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let action = pairs.iter().find(|(k, _)| k == "action").map(|(_, v)| v.as_str()).unwrap_or("");
        if action == "add_row" {
            return DraftAction::AddRow;
        }
        match action.strip_prefix("remove_row:").and_then(|i| i.parse().ok()) {
            Some(index) => DraftAction::RemoveRow(index),
            None => DraftAction::Submit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WriterDraftForm {
    pub drafts: Vec<WriterDraft>,
}

impl Default for WriterDraftForm {
    fn default() -> Self {
        WriterDraftForm { drafts: vec![WriterDraft::default()] }
    }
}

impl WriterDraftForm {
    /// Rebuilds the rows from a submitted form. Row `i` uses the fields
    /// `writer_name_i`, `full_name_i`, `email_i`, `password_i`,
    /// `other_category_i` and the repeated checkbox `category_i`.
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let rows = pairs
            .iter()
            .find(|(k, _)| k == "rows")
            .and_then(|(_, v)| v.parse::<usize>().ok())
            .unwrap_or(1)
            .clamp(1, MAX_DRAFT_ROWS);

        let mut drafts = vec![WriterDraft::default(); rows];
        for (key, value) in pairs {
            let Some((name, index)) = key.rsplit_once('_') else { continue };
            let Some(draft) = index.parse::<usize>().ok().and_then(|i| drafts.get_mut(i)) else { continue };
            match name {
                "writer_name" => draft.writer_name = value.clone(),
                "full_name" => draft.full_name = value.clone(),
                "email" => draft.email = value.clone(),
                "password" => draft.password = value.clone(),
                "other_category" => draft.other_category = value.clone(),
                "category" => draft.toggle_category(value),
                _ => {}
            }
        }
        WriterDraftForm { drafts }
    }

    pub fn add_row(&mut self) {
        if self.drafts.len() < MAX_DRAFT_ROWS {
            self.drafts.push(WriterDraft::default());
        }
    }

    /// Removes a row. The last remaining row cannot be removed.
    pub fn remove_row(&mut self, index: usize) -> bool {
        if self.drafts.len() <= 1 || index >= self.drafts.len() {
            return false;
        }
        self.drafts.remove(index);
        true
    }

    /// All rows or nothing: the first invalid row's message is returned.
    pub fn validate(&self) -> Result<Vec<NewWriter>, String> {
        self.drafts.iter().map(WriterDraft::validate).collect()
    }
}

/// Validates every draft, then creates them one by one. Nothing is sent when
/// any row is invalid.
pub async fn create_writers(client: &ApiClient, token: &str, form: &WriterDraftForm) -> Result<usize, PanelError> {
    let writers = form.validate().map_err(PanelError::Validation)?;
    for writer in &writers {
        writers_api_operations::create_writer(client, token, writer).await?;
        log::info!("Created writer '{}'", writer.writer_name);
    }
    Ok(writers.len())
}

pub async fn change_password(
    client: &ApiClient,
    token: &str,
    writer_name: &str,
    new_password: &str,
) -> Result<(), PanelError> {
    if new_password.trim().is_empty() {
        return Err(PanelError::Validation("Please enter a new password".to_string()));
    }
    writers_api_operations::change_writer_password(client, token, writer_name, new_password).await?;
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct OpenPostView {
    pub post_id: String,
    pub title: String,
    pub category: String,
    pub author: String,
    pub writer_name: String,
    pub date: String,
    pub image: String,
    pub preview: String,
}

/// The moderation queue, newest first, with plain-text previews.
pub async fn open_post_previews(client: &ApiClient, resolver: &ImageResolver) -> Result<Vec<OpenPostView>, PanelError> {
    let posts = posts_api_operations::read_posts_by_status(client, ModerationStatus::Open).await?;
    Ok(sort_by_date_desc(&posts)
        .into_iter()
        .map(|post| OpenPostView {
            image: resolver.resolve_opt(post.image_url.as_deref()),
            preview: preview_text(&post.content, PREVIEW_CHARS),
            date: format_short_date(&post.upload_date),
            author: post.author_name.unwrap_or_default(),
            writer_name: post.writer_name.unwrap_or_default(),
            post_id: post.post_id,
            title: post.title,
            category: post.category,
        })
        .collect())
}

/// Approves or rejects an open post. Other targets are refused locally.
pub async fn moderate_post(
    client: &ApiClient,
    token: &str,
    post_id: &str,
    decision: ModerationStatus,
) -> Result<(), PanelError> {
    if !ModerationStatus::Open.can_transition_to(decision) {
        return Err(PanelError::Validation("Posts can only be approved or rejected".to_string()));
    }
    posts_api_operations::update_post_status(client, token, post_id, decision).await?;
    log::info!("Post {} marked {}", post_id, decision);
    Ok(())
}
