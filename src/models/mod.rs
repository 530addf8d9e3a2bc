use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single article as served by the backend API or the bundled content file.
///
/// Every field is lenient: missing, `null` or mistyped values fall back to a
/// blank default instead of rejecting the whole post list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Post {
    #[serde(deserialize_with = "lenient_string")]
    pub post_id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(deserialize_with = "lenient_string")]
    pub content: String,
    #[serde(deserialize_with = "lenient_string")]
    pub category: String,
    #[serde(deserialize_with = "lenient_string", alias = "postDate")]
    pub upload_date: String,
    #[serde(deserialize_with = "author_names", alias = "author")]
    pub author_name: Option<String>,
    #[serde(deserialize_with = "optional_string")]
    pub author_image: Option<String>,
    #[serde(deserialize_with = "optional_string", alias = "image")]
    pub image_url: Option<String>,
    #[serde(deserialize_with = "lenient_count", alias = "postViews")]
    pub view_count: u64,
    #[serde(deserialize_with = "optional_string")]
    pub writer_name: Option<String>,
    #[serde(rename = "abstract", deserialize_with = "optional_string")]
    pub excerpt: Option<String>,
    #[serde(rename = "post_status", alias = "postStatus", deserialize_with = "lenient_status")]
    pub post_status: Option<ModerationStatus>,
}

impl Post {
    /// Bundled posts carry no status and count as published.
    pub fn is_published(&self) -> bool {
        !matches!(self.post_status, Some(ModerationStatus::Open | ModerationStatus::Rejected))
    }
}

/// Approval state of a post. `Open` is the only state with outgoing transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationStatus {
    Open,
    Approved,
    Rejected,
}

impl ModerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationStatus::Open => "open",
            ModerationStatus::Approved => "approved",
            ModerationStatus::Rejected => "rejected",
        }
    }

    pub fn can_transition_to(&self, next: ModerationStatus) -> bool {
        matches!(
            (self, next),
            (ModerationStatus::Open, ModerationStatus::Approved)
                | (ModerationStatus::Open, ModerationStatus::Rejected)
        )
    }
}

impl fmt::Display for ModerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModerationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "open" => Ok(ModerationStatus::Open),
            "approved" => Ok(ModerationStatus::Approved),
            "rejected" => Ok(ModerationStatus::Rejected),
            other => Err(format!("Unknown moderation status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Writer {
    #[serde(deserialize_with = "lenient_string")]
    pub writer_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub full_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(deserialize_with = "optional_string")]
    pub created_at: Option<String>,
    #[serde(deserialize_with = "nullable_list")]
    pub categories: Vec<String>,
    pub is_active: bool,
}

// --- Request payloads sent to the backend ---

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWriter {
    pub writer_name: String,
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPayload {
    pub title: String,
    pub content: String,
    pub image_url: String,
    pub author_name: String,
    pub author_image: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostUpdatePayload {
    pub title: String,
    pub content: String,
    pub category: String,
    pub author_name: String,
    pub author_image: String,
    pub image_url: String,
    pub upload_date: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusPayload {
    pub post_status: ModerationStatus,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordPayload {
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriterCredentials {
    pub writer_name: String,
    pub password: String,
}

// --- Response bodies read from the backend ---

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadTicket {
    #[serde(rename = "uploadURL", alias = "uploadUrl", default)]
    pub upload_url: String,
    #[serde(default)]
    pub public_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminLoginResponse {
    pub token: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriterLoginResponse {
    pub token: String,
    #[serde(default)]
    pub writer_name: String,
    #[serde(default, deserialize_with = "nullable_list")]
    pub categories: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
pub enum PostList {
    Wrapped {
        #[serde(deserialize_with = "nullable_list")]
        posts: Vec<Post>,
    },
    Bare(Vec<Post>),
}

impl PostList {
    pub fn into_posts(self) -> Vec<Post> {
        match self {
            PostList::Wrapped { posts } => posts,
            PostList::Bare(posts) => posts,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
pub enum SinglePost {
    Wrapped { post: Post },
    Bare(Post),
}

impl SinglePost {
    pub fn into_post(self) -> Post {
        match self {
            SinglePost::Wrapped { post } => post,
            SinglePost::Bare(post) => post,
        }
    }
}

#[derive(Deserialize)]
pub struct WriterList {
    #[serde(default, deserialize_with = "nullable_list")]
    pub writers: Vec<Writer>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ErrorBody {
    pub error: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Notification {
    pub message: String,
    pub r#type: String, // 'success' or 'error'
}

/// Publication types a writer may be granted. "Other" carries a free-text value.
pub const PUBLICATION_TYPES: [&str; 8] = [
    "Web Articles",
    "Issue Briefs",
    "Research Reports",
    "Newsletters",
    "WCRT Journal",
    "Scholar Warrior",
    "Books",
    "Essays",
];

pub const OTHER_PUBLICATION_TYPE: &str = "Other";

// --- Lenient field deserializers ---

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseScalar {
    Text(String),
    Integer(i64),
    Float(f64),
    Flag(bool),
    Other(IgnoredAny),
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<LooseScalar>::deserialize(deserializer)? {
        Some(LooseScalar::Text(s)) => s,
        Some(LooseScalar::Integer(i)) => i.to_string(),
        Some(LooseScalar::Float(f)) => f.to_string(),
        Some(LooseScalar::Flag(b)) => b.to_string(),
        Some(LooseScalar::Other(_)) | None => String::new(),
    })
}

fn optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = lenient_string(deserializer)?;
    Ok(Some(value).filter(|s| !s.trim().is_empty()))
}

fn author_names<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NameOrNames {
        One(String),
        Many(Vec<String>),
        Other(IgnoredAny),
    }

    let joined = match Option::<NameOrNames>::deserialize(deserializer)? {
        Some(NameOrNames::One(name)) => name,
        Some(NameOrNames::Many(names)) => names
            .iter()
            .map(|n| n.trim())
            .filter(|n| !n.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Some(NameOrNames::Other(_)) | None => String::new(),
    };
    Ok(Some(joined).filter(|s| !s.trim().is_empty()))
}

fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<LooseScalar>::deserialize(deserializer)? {
        Some(LooseScalar::Integer(i)) => i.max(0) as u64,
        Some(LooseScalar::Float(f)) if f.is_finite() && f > 0.0 => f as u64,
        Some(LooseScalar::Text(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

fn lenient_status<'de, D>(deserializer: D) -> Result<Option<ModerationStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = lenient_string(deserializer)?;
    Ok(raw.parse().ok())
}

fn nullable_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

pub mod api_operations;
pub mod content_source;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn post_tolerates_missing_and_mistyped_fields() {
        let post: Post = serde_json::from_value(json!({
            "postId": 42,
            "title": null,
            "category": "Newsletter",
            "viewCount": "17",
            "imageUrl": "",
            "post_status": "archived"
        }))
        .unwrap();

        assert_eq!(post.post_id, "42");
        assert_eq!(post.title, "");
        assert_eq!(post.view_count, 17);
        assert_eq!(post.image_url, None);
        assert_eq!(post.post_status, None);
    }

    #[test]
    fn post_accepts_bundled_field_names() {
        let post: Post = serde_json::from_value(json!({
            "title": "Weekly Tech Digest",
            "author": ["Jane Smith", "John Doe"],
            "postDate": "2023-10-15",
            "abstract": "A roundup.",
            "image": "/article.jpg",
            "postViews": 12
        }))
        .unwrap();

        assert_eq!(post.author_name.as_deref(), Some("Jane Smith, John Doe"));
        assert_eq!(post.upload_date, "2023-10-15");
        assert_eq!(post.excerpt.as_deref(), Some("A roundup."));
        assert_eq!(post.image_url.as_deref(), Some("/article.jpg"));
        assert_eq!(post.view_count, 12);
    }

    #[test]
    fn moderation_only_leaves_open() {
        use ModerationStatus::*;
        assert!(Open.can_transition_to(Approved));
        assert!(Open.can_transition_to(Rejected));
        assert!(!Approved.can_transition_to(Rejected));
        assert!(!Rejected.can_transition_to(Open));
        assert!(!Open.can_transition_to(Open));
    }

    #[test]
    fn only_approved_or_unmarked_posts_are_published() {
        let mut post = Post::default();
        assert!(post.is_published());
        post.post_status = Some(ModerationStatus::Approved);
        assert!(post.is_published());
        post.post_status = Some(ModerationStatus::Open);
        assert!(!post.is_published());
        post.post_status = Some(ModerationStatus::Rejected);
        assert!(!post.is_published());
    }

    #[test]
    fn status_payload_uses_wire_names() {
        let body = serde_json::to_value(StatusPayload { post_status: ModerationStatus::Approved }).unwrap();
        assert_eq!(body, json!({ "post_status": "approved" }));
    }

    #[test]
    fn post_list_accepts_envelope_or_bare_array() {
        let wrapped: PostList = serde_json::from_value(json!({ "status": "ok", "posts": [{ "title": "a" }] })).unwrap();
        let bare: PostList = serde_json::from_value(json!([{ "title": "b" }])).unwrap();
        assert_eq!(wrapped.into_posts()[0].title, "a");
        assert_eq!(bare.into_posts()[0].title, "b");
    }
}
