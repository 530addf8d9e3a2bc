use ammonia::Builder;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

fn tag_regex() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r"<[^>]+>").unwrap())
}

fn markup_regex() -> &'static Regex {
    static MARKUP: OnceLock<Regex> = OnceLock::new();
    MARKUP.get_or_init(|| Regex::new(r"</?[a-zA-Z][a-zA-Z0-9]*(\s[^>]*)?/?>").unwrap())
}

/// Cleans post HTML coming from the writer editor down to a safe subset.
/// All scripting (`<script>`, `on*` handlers, `javascript:` links) is removed.
pub fn sanitize_post_html(unsafe_html: &str) -> String {
    let tags_to_allow = [
        "h1", "h2", "h3", "h4", "h5", "h6", "b", "strong", "i", "em", "u", "p", "br", "span", "a", "ul",
        "ol", "li", "blockquote", "code", "pre", "hr", "img", "figure", "figcaption", "table", "thead",
        "tbody", "tr", "th", "td", "s", "del", "div",
    ];
    let safe_tags = tags_to_allow.iter().cloned().collect::<HashSet<_>>();

    let safe_attributes = ["src", "href", "alt", "title", "class", "width", "height", "align"];
    let generic_attributes = safe_attributes.iter().cloned().collect::<HashSet<_>>();

    Builder::new()
        .tags(safe_tags)
        .generic_attributes(generic_attributes)
        .link_rel(Some("nofollow ugc noopener"))
        .clean(unsafe_html)
        .to_string()
}

/// Plain-text preview of post content: tags removed, entities decoded, then
/// cut to `max_chars` characters with `...` appended when anything was cut.
pub fn preview_text(content: &str, max_chars: usize) -> String {
    let without_tags = tag_regex().replace_all(content, "");
    let text = html_escape::decode_html_entities(&without_tags);
    let text = text.trim();
    if text.chars().count() > max_chars {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}

/// HTML for the article body. Content that already carries markup is
/// sanitized; plain text becomes one escaped `<p>` per non-blank line.
pub fn render_body(content: &str) -> String {
    if markup_regex().is_match(content) {
        return sanitize_post_html(content);
    }
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| format!("<p>{}</p>", html_escape::encode_text(line)))
        .collect::<Vec<_>>()
        .join("\n")
}
