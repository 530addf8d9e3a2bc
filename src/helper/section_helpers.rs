use crate::helper::image_helpers::ImageResolver;
use crate::helper::listing_helpers::{filter_by_category, format_short_date, post_key, CategoryMatch};
use crate::helper::pagination_helpers::{PageQuery, Paginator};
use crate::helper::sanitization_helpers::preview_text;
use crate::models::Post;
use serde::{Deserialize, Serialize};

const CARD_EXCERPT_CHARS: usize = 160;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardLayout {
    #[default]
    Grid,
    List,
    Featured,
}

fn default_page_size() -> usize {
    6
}

/// A homepage block: posts of one category, paged independently of the others.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySection {
    pub label: String,
    pub title: String,
    #[serde(default)]
    pub matcher: CategoryMatch,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default)]
    pub layout: CardLayout,
}

impl CategorySection {
    pub fn new(label: &str) -> Self {
        CategorySection {
            label: label.to_string(),
            title: label.to_string(),
            matcher: CategoryMatch::Exact,
            page_size: default_page_size(),
            layout: CardLayout::Grid,
        }
    }

    pub fn titled(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn matching(mut self, matcher: CategoryMatch) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn layout(mut self, layout: CardLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Query-string key carrying this section's page number.
    pub fn query_key(&self) -> String {
        format!("{}_page", self.label)
    }

    pub fn select<'a>(&self, sorted: &'a [Post]) -> Vec<&'a Post> {
        filter_by_category(sorted, &self.label, self.matcher)
    }
}

/// Homepage sections in display order.
///
/// Writers pick categories from display names ("Web Articles") while links use
/// hyphenated labels ("web-articles"), so these match with hyphens ignored.
pub fn default_home_sections() -> Vec<CategorySection> {
    let hyphen_blind = CategoryMatch::IgnoreHyphens;
    vec![
        CategorySection::new("web-articles").titled("Web Articles").matching(hyphen_blind).page_size(6),
        CategorySection::new("newsletters")
            .titled("Newsletters")
            .matching(hyphen_blind)
            .page_size(4)
            .layout(CardLayout::List),
        CategorySection::new("issue-briefs").titled("Issue Briefs").matching(hyphen_blind).page_size(3),
        CategorySection::new("research-reports")
            .titled("Research Reports")
            .matching(hyphen_blind)
            .page_size(5)
            .layout(CardLayout::List),
        CategorySection::new("wcrt-journal")
            .titled("WCRT Journal")
            .matching(hyphen_blind)
            .page_size(3)
            .layout(CardLayout::Featured),
        CategorySection::new("scholar-warrior")
            .titled("Scholar Warrior")
            .matching(hyphen_blind)
            .page_size(3)
            .layout(CardLayout::Featured),
        CategorySection::new("books").titled("Books").matching(hyphen_blind).page_size(8),
        CategorySection::new("essays")
            .titled("Essays")
            .matching(hyphen_blind)
            .page_size(10)
            .layout(CardLayout::List),
    ]
}

/// What a template needs to draw one post teaser.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostCard {
    pub post_id: String,
    pub title: String,
    pub href: String,
    pub category: String,
    pub author: String,
    pub date: String,
    pub image: String,
    pub excerpt: String,
    pub view_count: u64,
}

impl PostCard {
    pub fn from_post(post: &Post, resolver: &ImageResolver) -> Self {
        let excerpt = match &post.excerpt {
            Some(text) => text.clone(),
            None => preview_text(&post.content, CARD_EXCERPT_CHARS),
        };
        PostCard {
            post_id: post.post_id.clone(),
            title: post.title.clone(),
            href: format!("/publication/web-articles/{}", post_key(post)),
            category: post.category.clone(),
            author: post.author_name.clone().unwrap_or_default(),
            date: format_short_date(&post.upload_date),
            image: resolver.resolve_opt(post.image_url.as_deref()),
            excerpt,
            view_count: post.view_count,
        }
    }
}

pub fn cards<'a, I>(posts: I, resolver: &ImageResolver) -> Vec<PostCard>
where
    I: IntoIterator<Item = &'a Post>,
{
    posts.into_iter().map(|p| PostCard::from_post(p, resolver)).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageLink {
    pub number: usize,
    pub href: String,
    pub current: bool,
}

/// Paged view of one category section.
#[derive(Debug, Clone, Serialize)]
pub struct SectionView {
    pub label: String,
    pub title: String,
    pub layout: CardLayout,
    pub cards: Vec<PostCard>,
    pub page: usize,
    pub total_pages: usize,
    pub has_prev: bool,
    pub has_next: bool,
    pub prev_href: String,
    pub next_href: String,
    pub pages: Vec<PageLink>,
}

impl SectionView {
    pub fn build(section: &CategorySection, sorted: &[Post], query: &PageQuery, resolver: &ImageResolver) -> Self {
        let key = section.query_key();
        let selected = section.select(sorted);
        let pager = Paginator::at_page(selected.len(), section.page_size, query.number(&key));
        let pages = pager
            .page_numbers()
            .into_iter()
            .map(|n| PageLink { number: n, href: query.href_with(&key, n), current: n == pager.page() })
            .collect();

        SectionView {
            label: section.label.clone(),
            title: section.title.clone(),
            layout: section.layout,
            cards: cards(pager.window(&selected).iter().copied(), resolver),
            page: pager.page(),
            total_pages: pager.total_pages(),
            has_prev: pager.has_prev(),
            has_next: pager.has_next(),
            prev_href: query.href_with(&key, pager.page().saturating_sub(1).max(1)),
            next_href: query.href_with(&key, pager.page() + 1),
            pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(n: u32, category: &str) -> Post {
        Post {
            post_id: format!("p{}", n),
            title: format!("Post {}", n),
            category: category.to_string(),
            upload_date: format!("2024-01-{:02}", n),
            ..Default::default()
        }
    }

    fn resolver() -> ImageResolver {
        ImageResolver::new("bucket", None, "/static/article.jpg")
    }

    #[test]
    fn builder_sets_every_field() {
        let section = CategorySection::new("books")
            .titled("Books")
            .matching(CategoryMatch::IgnoreHyphens)
            .page_size(0)
            .layout(CardLayout::List);
        assert_eq!(section.page_size, 1);
        assert_eq!(section.matcher, CategoryMatch::IgnoreHyphens);
        assert_eq!(section.query_key(), "books_page");
    }

    #[test]
    fn section_pages_independently() {
        let posts: Vec<Post> = (1..=9).rev().map(|n| post(n, "Books")).collect();
        let section = CategorySection::new("books").page_size(3);

        let query = PageQuery::parse("books_page=2&essays_page=4");
        let view = SectionView::build(&section, &posts, &query, &resolver());
        let titles: Vec<&str> = view.cards.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Post 6", "Post 5", "Post 4"]);
        assert!(view.has_prev && view.has_next);
        assert_eq!(view.total_pages, 3);
        assert_eq!(view.next_href, "?books_page=3&essays_page=4");
        assert!(view.pages[1].current);
    }

    #[test]
    fn empty_section_renders_no_cards() {
        let view = SectionView::build(&CategorySection::new("essays"), &[], &PageQuery::default(), &resolver());
        assert!(view.cards.is_empty());
        assert_eq!(view.page, 1);
        assert_eq!(view.total_pages, 0);
        assert!(!view.has_prev && !view.has_next);
    }

    #[test]
    fn default_sections_accept_display_names() {
        let posts = vec![post(1, "Web Articles"), post(2, "web-articles")];
        let sections = default_home_sections();
        assert_eq!(sections.len(), 8);
        assert_eq!(sections[0].select(&posts).len(), 2);
    }

    #[test]
    fn cards_link_by_id_or_slug() {
        let mut bundled = post(1, "Books");
        bundled.post_id.clear();
        bundled.title = "The Future of Remote Work".into();
        let card = PostCard::from_post(&bundled, &resolver());
        assert_eq!(card.href, "/publication/web-articles/the-future-of-remote-work");
        assert_eq!(card.date, "01/01/2024");
    }
}
