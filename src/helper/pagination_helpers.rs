use serde::Serialize;
use std::collections::BTreeMap;
use std::ops::Range;
use url::form_urlencoded;

/// Page state over a list of `total` items. Pages are 1-based and the current
/// page always stays within `[1, max(1, total_pages)]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Paginator {
    page: usize,
    page_size: usize,
    total: usize,
}

impl Paginator {
    pub fn new(total: usize, page_size: usize) -> Self {
        Paginator {
            page: 1,
            page_size: page_size.max(1),
            total,
        }
    }

    /// Starts on `page`, clamped into range.
    pub fn at_page(total: usize, page_size: usize, page: usize) -> Self {
        let mut paginator = Self::new(total, page_size);
        paginator.go_to(page);
        paginator
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn total_pages(&self) -> usize {
        (self.total + self.page_size - 1) / self.page_size
    }

    fn last_page(&self) -> usize {
        self.total_pages().max(1)
    }

    pub fn go_to(&mut self, page: usize) {
        self.page = page.clamp(1, self.last_page());
    }

    /// Moves forward one page. Returns false (and stays put) on the last page.
    pub fn next(&mut self) -> bool {
        if !self.has_next() {
            return false;
        }
        self.page += 1;
        true
    }

    pub fn prev(&mut self) -> bool {
        if !self.has_prev() {
            return false;
        }
        self.page -= 1;
        true
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    /// Index range of the current page within the full list.
    pub fn range(&self) -> Range<usize> {
        let start = ((self.page - 1) * self.page_size).min(self.total);
        let end = (self.page * self.page_size).min(self.total);
        start..end
    }

    pub fn window<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let Range { start, end } = self.range();
        &items[start.min(items.len())..end.min(items.len())]
    }

    pub fn page_numbers(&self) -> Vec<usize> {
        (1..=self.total_pages()).collect()
    }
}

/// Incremental "Load more" reveal: starts at `step` items and grows by `step`
/// until everything is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoadMore {
    shown: usize,
    step: usize,
    total: usize,
}

pub const LOAD_MORE_STEP: usize = 6;

impl LoadMore {
    pub fn new(total: usize, step: usize) -> Self {
        let step = step.max(1);
        LoadMore { shown: step, step, total }
    }

    /// Restores a reveal count carried in the query string. Never below one step.
    pub fn with_shown(total: usize, step: usize, shown: usize) -> Self {
        let mut state = Self::new(total, step);
        state.shown = shown.clamp(state.step, total.max(state.step));
        state
    }

    pub fn shown(&self) -> usize {
        self.shown
    }

    pub fn has_more(&self) -> bool {
        self.total > self.shown
    }

    pub fn load_more(&mut self) {
        if self.has_more() {
            self.shown = (self.shown + self.step).min(self.total);
        }
    }

    /// The count after one more click, for building the "Load more" link.
    pub fn next_shown(&self) -> usize {
        let mut next = *self;
        next.load_more();
        next.shown
    }

    pub fn visible<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        &items[..self.shown.min(items.len())]
    }
}

/// The current request's query string, used to read per-section page numbers
/// and to build links that change one of them while keeping the rest.
#[derive(Debug, Clone, Default)]
pub struct PageQuery {
    params: BTreeMap<String, String>,
}

impl PageQuery {
    pub fn parse(query_string: &str) -> Self {
        let params = form_urlencoded::parse(query_string.as_bytes())
            .into_owned()
            .collect();
        PageQuery { params }
    }

    /// Positive integer under `key`, or 1 when absent or malformed.
    pub fn number(&self, key: &str) -> usize {
        self.params
            .get(key)
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|n| *n >= 1)
            .unwrap_or(1)
    }

    pub fn href_with(&self, key: &str, value: usize) -> String {
        let mut params = self.params.clone();
        params.insert(key.to_string(), value.to_string());
        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params.iter())
            .finish();
        format!("?{}", encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nine_items_in_pages_of_three() {
        let items: Vec<u32> = (1..=9).collect();
        let mut pager = Paginator::new(items.len(), 3);
        assert_eq!(pager.total_pages(), 3);
        assert_eq!(pager.window(&items), &[1, 2, 3]);
        assert!(!pager.has_prev());

        assert!(pager.next());
        assert_eq!(pager.window(&items), &[4, 5, 6]);
        assert!(pager.next());
        assert_eq!(pager.window(&items), &[7, 8, 9]);
        assert!(!pager.has_next());
        assert!(!pager.next());
        assert_eq!(pager.page(), 3);
    }

    #[test]
    fn pages_concatenate_to_the_whole_list() {
        let items: Vec<u32> = (0..23).collect();
        let mut pager = Paginator::new(items.len(), 5);
        let mut seen = pager.window(&items).to_vec();
        while pager.next() {
            seen.extend_from_slice(pager.window(&items));
        }
        assert_eq!(seen, items);
        assert_eq!(pager.window(&items).len(), 3);
    }

    #[test]
    fn go_to_clamps_into_range() {
        let mut pager = Paginator::new(10, 4);
        pager.go_to(0);
        assert_eq!(pager.page(), 1);
        pager.go_to(99);
        assert_eq!(pager.page(), 3);
        assert_eq!(Paginator::at_page(10, 4, 2).range(), 4..8);
    }

    #[test]
    fn empty_list_has_no_pages() {
        let items: Vec<u32> = Vec::new();
        let mut pager = Paginator::new(0, 6);
        assert_eq!(pager.total_pages(), 0);
        assert_eq!(pager.page(), 1);
        assert!(pager.window(&items).is_empty());
        assert!(!pager.has_next() && !pager.has_prev());
        assert!(!pager.next() && !pager.prev());
        assert!(pager.page_numbers().is_empty());
    }

    #[test]
    fn zero_page_size_is_one() {
        let pager = Paginator::new(3, 0);
        assert_eq!(pager.page_size(), 1);
        assert_eq!(pager.total_pages(), 3);
    }

    #[test]
    fn load_more_grows_until_total() {
        let items: Vec<u32> = (0..14).collect();
        let mut more = LoadMore::new(items.len(), LOAD_MORE_STEP);
        assert_eq!(more.visible(&items).len(), 6);
        more.load_more();
        assert_eq!(more.shown(), 12);
        more.load_more();
        assert_eq!(more.shown(), 14);
        assert!(!more.has_more());
        more.load_more();
        assert_eq!(more.visible(&items).len(), 14);
    }

    #[test]
    fn load_more_restored_from_query_is_clamped() {
        assert_eq!(LoadMore::with_shown(20, 6, 0).shown(), 6);
        assert_eq!(LoadMore::with_shown(20, 6, 500).shown(), 20);
        assert_eq!(LoadMore::with_shown(3, 6, 12).shown(), 6);
    }

    #[test]
    fn page_query_keeps_other_sections() {
        let query = PageQuery::parse("books_page=2&essays_page=abc");
        assert_eq!(query.number("books_page"), 2);
        assert_eq!(query.number("essays_page"), 1);
        assert_eq!(query.number("missing"), 1);
        assert_eq!(query.href_with("essays_page", 3), "?books_page=2&essays_page=3");
    }
}
