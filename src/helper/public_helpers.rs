use crate::helper::image_helpers::{validate_images, ImageResolver};
use crate::helper::listing_helpers::{
    filter_by_category, format_long_date, latest, trending, CategoryMatch,
};
use crate::helper::pagination_helpers::{LoadMore, PageQuery, Paginator, LOAD_MORE_STEP};
use crate::helper::sanitization_helpers::render_body;
use crate::helper::section_helpers::{cards, CategorySection, PageLink, PostCard, SectionView};
use crate::helper::ticker_helpers::Rotation;
use crate::models::Post;
use reqwest::Client;
use serde::Serialize;
use url::form_urlencoded;

pub const FEATURED_COUNT: usize = 5;
pub const RECENT_COUNT: usize = 4;
pub const HOME_TRENDING_COUNT: usize = 5;
pub const CATEGORY_SIDE_COUNT: usize = 3;
pub const CATEGORY_PAGE_SIZE: usize = 10;
pub const SIDEBAR_WEB_UPDATES: usize = 5;
pub const SIDEBAR_LATEST: usize = 4;
pub const SIDEBAR_TRENDING: usize = 3;

const WEB_ARTICLES: &str = "web-articles";

/// "web-articles" -> "Web Articles"
pub fn label_title(label: &str) -> String {
    label
        .split(|c| c == '-' || c == ' ')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// The posts the newsflash ticker and hero carousel rotate over.
pub fn featured(sorted: &[Post]) -> &[Post] {
    latest(sorted, FEATURED_COUNT)
}

#[derive(Debug, Serialize)]
pub struct HomeView {
    pub newsflash: Option<PostCard>,
    pub newsflash_position: usize,
    pub hero: Option<PostCard>,
    pub hero_position: usize,
    pub featured_count: usize,
    pub recent: Vec<PostCard>,
    pub sections: Vec<SectionView>,
    pub trending: Vec<PostCard>,
}

impl HomeView {
    pub fn cards_mut(&mut self) -> Vec<&mut PostCard> {
        let mut all: Vec<&mut PostCard> = Vec::new();
        all.extend(self.newsflash.iter_mut());
        all.extend(self.hero.iter_mut());
        all.extend(self.recent.iter_mut());
        for section in self.sections.iter_mut() {
            all.extend(section.cards.iter_mut());
        }
        all.extend(self.trending.iter_mut());
        all
    }
}

pub fn build_home(
    sorted: &[Post],
    sections: &[CategorySection],
    query: &PageQuery,
    resolver: &ImageResolver,
    newsflash: Rotation,
    carousel: Rotation,
) -> HomeView {
    let featured = featured(sorted);
    HomeView {
        newsflash: newsflash.current(featured).map(|p| PostCard::from_post(p, resolver)),
        newsflash_position: newsflash.index() + 1,
        hero: carousel.current(featured).map(|p| PostCard::from_post(p, resolver)),
        hero_position: carousel.index() + 1,
        featured_count: featured.len(),
        recent: cards(latest(sorted, RECENT_COUNT), resolver),
        sections: sections
            .iter()
            .map(|section| SectionView::build(section, sorted, query, resolver))
            .collect(),
        trending: cards(trending(sorted, HOME_TRENDING_COUNT), resolver),
    }
}

/// Category landing page: newest post as the main article, the next three
/// beside it, everything else paged ten at a time.
#[derive(Debug, Serialize)]
pub struct CategoryPageView {
    pub label: String,
    pub title: String,
    pub main: Option<PostCard>,
    pub side: Vec<PostCard>,
    pub rest: Vec<PostCard>,
    pub page: usize,
    pub total_pages: usize,
    pub has_prev: bool,
    pub has_next: bool,
    pub prev_href: String,
    pub next_href: String,
    pub pages: Vec<PageLink>,
}

impl CategoryPageView {
    pub fn cards_mut(&mut self) -> Vec<&mut PostCard> {
        let mut all: Vec<&mut PostCard> = self.main.iter_mut().collect();
        all.extend(self.side.iter_mut());
        all.extend(self.rest.iter_mut());
        all
    }
}

pub fn build_category_page(
    sorted: &[Post],
    label: &str,
    query: &PageQuery,
    resolver: &ImageResolver,
) -> CategoryPageView {
    let selected = filter_by_category(sorted, label, CategoryMatch::IgnoreHyphens);
    let (head, remainder) = selected.split_at(selected.len().min(1 + CATEGORY_SIDE_COUNT));
    let pager = Paginator::at_page(remainder.len(), CATEGORY_PAGE_SIZE, query.number("page"));

    CategoryPageView {
        label: label.to_string(),
        title: label_title(label),
        main: head.first().map(|p| PostCard::from_post(p, resolver)),
        side: cards(head.iter().skip(1).copied(), resolver),
        rest: cards(pager.window(remainder).iter().copied(), resolver),
        page: pager.page(),
        total_pages: pager.total_pages(),
        has_prev: pager.has_prev(),
        has_next: pager.has_next(),
        prev_href: query.href_with("page", pager.page().saturating_sub(1).max(1)),
        next_href: query.href_with("page", pager.page() + 1),
        pages: pager
            .page_numbers()
            .into_iter()
            .map(|n| PageLink { number: n, href: query.href_with("page", n), current: n == pager.page() })
            .collect(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShareLinks {
    pub facebook: String,
    pub twitter: String,
    pub linkedin: String,
    pub whatsapp: String,
    pub email: String,
}

fn encode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

pub fn share_links(page_url: &str, title: &str) -> ShareLinks {
    let url = encode(page_url);
    let text = encode(title);
    ShareLinks {
        facebook: format!("https://www.facebook.com/sharer/sharer.php?u={}", url),
        twitter: format!("https://twitter.com/intent/tweet?url={}&text={}", url, text),
        linkedin: format!("https://www.linkedin.com/sharing/share-offsite/?url={}", url),
        whatsapp: format!("https://wa.me/?text={}%20{}", text, url),
        email: format!("mailto:?subject={}&body={}", text, url),
    }
}

#[derive(Debug, Serialize)]
pub struct ArticleView {
    pub post_id: String,
    pub title: String,
    pub category: String,
    pub author: String,
    pub author_image: Option<String>,
    pub date: String,
    pub image: String,
    pub body_html: String,
    pub view_count: u64,
    pub share: ShareLinks,
    pub web_updates: Vec<PostCard>,
    pub latest: Vec<PostCard>,
    pub trending: Vec<PostCard>,
}

impl ArticleView {
    pub fn cards_mut(&mut self) -> Vec<&mut PostCard> {
        let mut all: Vec<&mut PostCard> = self.web_updates.iter_mut().collect();
        all.extend(self.latest.iter_mut());
        all.extend(self.trending.iter_mut());
        all
    }
}

/// Detail page of `post`; the sidebar lists come from `sorted` with the
/// post itself left out.
pub fn build_article(post: &Post, sorted: &[Post], page_url: &str, resolver: &ImageResolver) -> ArticleView {
    let others: Vec<Post> = sorted
        .iter()
        .filter(|p| !(p.post_id == post.post_id && p.title == post.title))
        .cloned()
        .collect();
    let web_updates = filter_by_category(&others, WEB_ARTICLES, CategoryMatch::IgnoreHyphens);

    ArticleView {
        post_id: post.post_id.clone(),
        title: post.title.clone(),
        category: post.category.clone(),
        author: post.author_name.clone().unwrap_or_default(),
        author_image: post.author_image.as_deref().map(|a| resolver.resolve(a)),
        date: format_long_date(&post.upload_date),
        image: resolver.resolve_opt(post.image_url.as_deref()),
        body_html: render_body(&post.content),
        view_count: post.view_count,
        share: share_links(page_url, &post.title),
        web_updates: cards(web_updates.into_iter().take(SIDEBAR_WEB_UPDATES), resolver),
        latest: cards(latest(&others, SIDEBAR_LATEST), resolver),
        trending: cards(trending(&others, SIDEBAR_TRENDING), resolver),
    }
}

#[derive(Debug, Serialize)]
pub struct ArchiveSectionView {
    pub label: String,
    pub title: String,
    pub cards: Vec<PostCard>,
    pub shown: usize,
    pub total: usize,
    pub has_more: bool,
    pub more_href: String,
}

/// Archive listing: every section matched hyphen-insensitively and revealed
/// six posts at a time through `<label>_shown`.
pub fn build_archive(
    sorted: &[Post],
    sections: &[CategorySection],
    query: &PageQuery,
    resolver: &ImageResolver,
) -> Vec<ArchiveSectionView> {
    sections
        .iter()
        .map(|section| {
            let key = format!("{}_shown", section.label);
            let selected = filter_by_category(sorted, &section.label, CategoryMatch::IgnoreHyphens);
            let state = LoadMore::with_shown(selected.len(), LOAD_MORE_STEP, query.number(&key));
            ArchiveSectionView {
                label: section.label.clone(),
                title: section.title.clone(),
                cards: cards(state.visible(&selected).iter().copied(), resolver),
                shown: state.shown().min(selected.len()),
                total: selected.len(),
                has_more: state.has_more(),
                more_href: format!("{}#{}", query.href_with(&key, state.next_shown()), section.label),
            }
        })
        .collect()
}

/// Replaces card images whose remote URL does not answer with the default image.
pub async fn probe_cards(http: &Client, resolver: &ImageResolver, cards: Vec<&mut PostCard>) {
    let paths: Vec<String> = cards.iter().map(|c| c.image.clone()).collect();
    let usable = validate_images(http, resolver, &paths).await;
    for card in cards {
        if let Some(url) = usable.get(&card.image) {
            card.image = url.clone();
        }
    }
}
