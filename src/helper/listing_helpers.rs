use crate::models::Post;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

/// How a post's free-text `category` is compared against a section label.
///
/// Both modes lower-case the two sides. `IgnoreHyphens` additionally reads
/// `-` as a space, so "issue-briefs" and "Issue Briefs" are the same label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryMatch {
    #[default]
    Exact,
    IgnoreHyphens,
}

impl CategoryMatch {
    pub fn normalize(&self, raw: &str) -> String {
        let lower = raw.to_lowercase();
        match self {
            CategoryMatch::Exact => lower,
            CategoryMatch::IgnoreHyphens => lower.replace('-', " "),
        }
    }

    pub fn matches(&self, category: &str, label: &str) -> bool {
        self.normalize(category) == self.normalize(label)
    }
}

/// Parses the loosely formatted dates the backend and bundle carry.
pub fn parse_post_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// `10/15/2023`, or an empty string when the date is unusable.
pub fn format_short_date(raw: &str) -> String {
    parse_post_date(raw)
        .map(|d| d.format("%m/%d/%Y").to_string())
        .unwrap_or_default()
}

/// `October 15, 2023`, or an empty string when the date is unusable.
pub fn format_long_date(raw: &str) -> String {
    parse_post_date(raw)
        .map(|d| d.format("%B %-d, %Y").to_string())
        .unwrap_or_default()
}

/// Newest first. Undated posts go after every dated one; equal dates keep
/// their input order.
pub fn sort_by_date_desc(posts: &[Post]) -> Vec<Post> {
    let mut sorted = posts.to_vec();
    sorted.sort_by_cached_key(|p| Reverse(parse_post_date(&p.upload_date)));
    sorted
}

/// The order-preserving subsequence of `posts` whose category matches `label`.
/// Posts that match no label are simply never selected.
pub fn filter_by_category<'a>(posts: &'a [Post], label: &str, mode: CategoryMatch) -> Vec<&'a Post> {
    posts.iter().filter(|p| mode.matches(&p.category, label)).collect()
}

/// Most viewed first, independent of the date order.
pub fn trending(posts: &[Post], limit: usize) -> Vec<&Post> {
    let mut ranked: Vec<&Post> = posts.iter().collect();
    ranked.sort_by_key(|p| Reverse(p.view_count));
    ranked.truncate(limit);
    ranked
}

pub fn latest(sorted: &[Post], limit: usize) -> &[Post] {
    &sorted[..limit.min(sorted.len())]
}

/// URL slug of a title: lower-case, only `[a-z0-9]`, runs of whitespace or
/// hyphens collapsed to a single `-`.
pub fn create_slug(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for c in title.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash {
                slug.push('-');
                pending_dash = false;
            }
            slug.push(c);
        } else if c.is_whitespace() || c == '-' {
            if !pending_dash {
                pending_dash = true;
            }
        }
    }
    if pending_dash {
        slug.push('-');
    }
    slug
}

/// Link target of a post's detail page: its id, or the title slug for
/// bundled posts that have none.
pub fn post_key(post: &Post) -> String {
    if post.post_id.trim().is_empty() {
        create_slug(&post.title)
    } else {
        post.post_id.clone()
    }
}

pub fn find_by_id_or_slug<'a>(posts: &'a [Post], key: &str) -> Option<&'a Post> {
    posts
        .iter()
        .find(|p| !p.post_id.is_empty() && p.post_id == key)
        .or_else(|| posts.iter().find(|p| create_slug(&p.title) == key))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(id: &str, category: &str, date: &str) -> Post {
        Post {
            post_id: id.to_string(),
            title: format!("Post {}", id),
            category: category.to_string(),
            upload_date: date.to_string(),
            ..Default::default()
        }
    }

    fn ids(posts: &[Post]) -> Vec<&str> {
        posts.iter().map(|p| p.post_id.as_str()).collect()
    }

    #[test]
    fn sorts_newest_first_with_undated_last() {
        let posts = vec![
            post("a", "x", "2024-01-02"),
            post("b", "x", "garbage"),
            post("c", "x", "2024-03-01T10:00:00Z"),
            post("d", "x", "2024-01-02T00:00:00"),
        ];
        assert_eq!(ids(&sort_by_date_desc(&posts)), vec!["c", "a", "d", "b"]);
    }

    #[test]
    fn sorting_twice_changes_nothing() {
        let posts: Vec<Post> = (1..=9).rev().map(|d| post(&d.to_string(), "x", &format!("2024-01-0{}", d))).collect();
        let once = sort_by_date_desc(&posts);
        assert_eq!(sort_by_date_desc(&once), once);
    }

    #[test]
    fn category_filter_is_an_ordered_subsequence() {
        let posts = vec![
            post("1", "Newsletters", "2024-01-01"),
            post("2", "Books", "2024-01-02"),
            post("3", "newsletters", "2024-01-03"),
            post("4", "unknown", "2024-01-04"),
        ];
        let selected = filter_by_category(&posts, "NEWSLETTERS", CategoryMatch::Exact);
        let picked: Vec<&str> = selected.iter().map(|p| p.post_id.as_str()).collect();
        assert_eq!(picked, vec!["1", "3"]);
        assert!(selected.iter().all(|p| p.category.to_lowercase() == "newsletters"));
    }

    #[test]
    fn hyphen_handling_depends_on_mode() {
        let posts = vec![post("1", "Issue Briefs", "2024-01-01"), post("2", "issue-briefs", "2024-01-02")];
        assert_eq!(filter_by_category(&posts, "issue-briefs", CategoryMatch::Exact).len(), 1);
        assert_eq!(filter_by_category(&posts, "issue-briefs", CategoryMatch::IgnoreHyphens).len(), 2);
    }

    #[test]
    fn trending_orders_by_views() {
        let mut posts = vec![post("a", "x", ""), post("b", "x", ""), post("c", "x", "")];
        posts[0].view_count = 5;
        posts[1].view_count = 50;
        posts[2].view_count = 7;
        let top: Vec<&str> = trending(&posts, 2).iter().map(|p| p.post_id.as_str()).collect();
        assert_eq!(top, vec!["b", "c"]);
    }

    #[test]
    fn slugs_match_title_links() {
        assert_eq!(create_slug("The Future of Remote Work"), "the-future-of-remote-work");
        assert_eq!(create_slug("AI & Ethics -- 2024!"), "ai-ethics-2024");
        assert_eq!(create_slug("Mental Health in the Digital Age"), "mental-health-in-the-digital-age");
    }

    #[test]
    fn lookup_prefers_id_then_slug() {
        let mut posts = vec![post("p-1", "x", ""), post("", "x", "")];
        posts[1].title = "Understanding Blockchain".into();
        assert_eq!(find_by_id_or_slug(&posts, "p-1").map(|p| p.post_id.as_str()), Some("p-1"));
        assert_eq!(
            find_by_id_or_slug(&posts, "understanding-blockchain").map(|p| p.title.as_str()),
            Some("Understanding Blockchain")
        );
        assert!(find_by_id_or_slug(&posts, "missing").is_none());
    }

    #[test]
    fn dates_format_for_display() {
        assert_eq!(format_short_date("2023-10-05"), "10/05/2023");
        assert_eq!(format_long_date("2023-10-05T12:00:00Z"), "October 5, 2023");
        assert_eq!(format_long_date(""), "");
    }
}
