//! Headline feed normalisation and rendering.
//!
//! The feed is a JSON document that is either a bare array of entries or an
//! object holding the array under one of `LIST_KEYS`.  Entry fields drift
//! between feed generators, so each canonical field is looked up through the
//! `FIELD_ALIASES` table and the first non-empty value wins.

use html_escaper::Escape;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::FeedError;

pub const MAX_HEADLINES: usize = 10;
pub const UNTITLED: &str = "Untitled";

pub const LOADING_TEXT: &str = "Loading headlines…";
pub const NO_NEWS_TEXT: &str = "No news right now.";
pub const NOT_FOUND_TEXT: &str = "News data not found.";

/// Keys that may hold the entry array when the document is an object.
pub const LIST_KEYS: &[&str] = &["articles", "items", "results", "news", "data"];

const SUMMARY_KEYS: &[&str] = &["summary", "description"];
const GENERATED_KEYS: &[&str] = &["generated_at_utc", "generated_at", "updated_at"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Source,
    Link,
    Published,
}

/// Canonical field → accepted aliases, in priority order.
pub const FIELD_ALIASES: &[(Field, &[&str])] = &[
    (Field::Title, &["title", "headline", "name"]),
    (Field::Source, &["source", "source_name", "source_id", "publisher"]),
    (Field::Link, &["link", "url", "href"]),
    (
        Field::Published,
        &["pubDate", "published_at", "publishedAt", "published", "date"],
    ),
];

pub fn aliases(field: Field) -> &'static [&'static str] {
    FIELD_ALIASES
        .iter()
        .find(|(f, _)| *f == field)
        .map(|(_, keys)| *keys)
        .unwrap_or(&[])
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headline {
    pub title: String,
    pub source: Option<String>,
    pub link: Option<String>,
    pub published: Option<String>,
}

impl Headline {
    /// Publication time as `YYYY-MM-DD HH:MM` (UTC) when it parses, the raw
    /// value otherwise.
    pub fn display_date(&self) -> Option<String> {
        self.published.as_deref().map(format_date)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeedView {
    /// Nothing fetched yet.
    #[default]
    Loading,
    Articles {
        headlines: Vec<Headline>,
        summary: Option<String>,
        generated_at: Option<String>,
    },
    /// The document parsed but listed no entries.
    Empty,
    /// Fetch or parse failure.
    NotFound { reason: String },
}

impl FeedView {
    pub fn headlines(&self) -> &[Headline] {
        match self {
            FeedView::Articles { headlines, .. } => headlines,
            _ => &[],
        }
    }

    /// Placeholder text for every state that has no headlines to show.
    pub fn placeholder(&self) -> Option<&'static str> {
        match self {
            FeedView::Loading => Some(LOADING_TEXT),
            FeedView::Articles { .. } => None,
            FeedView::Empty => Some(NO_NEWS_TEXT),
            FeedView::NotFound { .. } => Some(NOT_FOUND_TEXT),
        }
    }
}

// ── Normalisation ─────────────────────────────────────────────────────────────

fn string_value(value: &Value) -> Option<String> {
    let s = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        // NewsAPI-style `"source": {"id": .., "name": ..}`
        Value::Object(obj) => return obj.get("name").and_then(string_value),
        _ => return None,
    };
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

fn pick(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| obj.get(*k).and_then(string_value))
}

fn is_web_link(link: &str) -> bool {
    let lower = link.to_ascii_lowercase();
    lower.starts_with("https://") || lower.starts_with("http://")
}

/// Canonical headline for one feed entry.  Non-object entries are skipped.
pub fn normalize_entry(entry: &Value) -> Option<Headline> {
    let obj = entry.as_object()?;
    Some(Headline {
        title: pick(obj, aliases(Field::Title)).unwrap_or_else(|| UNTITLED.to_string()),
        source: pick(obj, aliases(Field::Source)),
        link: pick(obj, aliases(Field::Link)).filter(|l| is_web_link(l)),
        published: pick(obj, aliases(Field::Published)),
    })
}

/// Parse a headline document into a view holding at most `MAX_HEADLINES`.
pub fn parse_document(text: &str) -> Result<FeedView, FeedError> {
    let doc: Value = serde_json::from_str(text)?;

    let (list, meta) = match &doc {
        Value::Array(list) => (list, None),
        Value::Object(obj) => {
            let list = LIST_KEYS
                .iter()
                .find_map(|k| obj.get(*k).and_then(Value::as_array))
                .ok_or(FeedError::NoList)?;
            (list, Some(obj))
        }
        _ => return Err(FeedError::NoList),
    };

    let headlines: Vec<Headline> = list
        .iter()
        .filter_map(normalize_entry)
        .take(MAX_HEADLINES)
        .collect();

    if headlines.is_empty() {
        return Ok(FeedView::Empty);
    }

    Ok(FeedView::Articles {
        headlines,
        summary: meta.and_then(|m| pick(m, SUMMARY_KEYS)),
        generated_at: meta.and_then(|m| pick(m, GENERATED_KEYS)),
    })
}

pub fn format_date(raw: &str) -> String {
    use chrono::{DateTime, NaiveDateTime, Utc};

    const OUT: &str = "%Y-%m-%d %H:%M";
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.with_timezone(&Utc).format(OUT).to_string();
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return dt.with_timezone(&Utc).format(OUT).to_string();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return dt.format(OUT).to_string();
    }
    raw.to_string()
}

// ── HTML rendering ────────────────────────────────────────────────────────────

/// HTML fragment for the headline panel.  Every feed-supplied string is
/// escaped; output depends only on `view`.
pub fn render_html(view: &FeedView) -> String {
    let FeedView::Articles {
        headlines, summary, ..
    } = view
    else {
        let (class, text) = match view {
            FeedView::Empty => ("headlines-empty", NO_NEWS_TEXT),
            FeedView::NotFound { .. } => ("headlines-missing", NOT_FOUND_TEXT),
            _ => ("headlines-loading", LOADING_TEXT),
        };
        return format!("<p class=\"{}\">{}</p>\n", class, text);
    };

    let mut out = String::new();
    if let Some(summary) = summary {
        out.push_str(&format!("<p class=\"summary\">{}</p>\n", Escape(summary)));
    }
    out.push_str("<ul class=\"headlines\">\n");
    for h in headlines {
        out.push_str("  <li class=\"headline\">");
        let title = Escape(&h.title);
        match &h.link {
            Some(link) => out.push_str(&format!(
                "<a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">{}</a>",
                Escape(link),
                title
            )),
            None => out.push_str(&format!("<span class=\"title\">{}</span>", title)),
        }
        let meta = meta_text(h);
        if !meta.is_empty() {
            out.push_str(&format!("<span class=\"meta\">{}</span>", Escape(&meta)));
        }
        out.push_str("</li>\n");
    }
    out.push_str("</ul>\n");
    out
}

fn meta_text(h: &Headline) -> String {
    let mut parts = Vec::new();
    if let Some(source) = &h.source {
        parts.push(source.clone());
    }
    if let Some(date) = h.display_date() {
        parts.push(date);
    }
    parts.join(" · ")
}

// ── Terminal rendering ────────────────────────────────────────────────────────

/// One headline prepared for a terminal row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlineLine {
    pub title: String,
    pub meta: String,
    pub link: Option<String>,
}

/// Drop control characters (escape sequences included) and collapse runs of
/// whitespace so feed text cannot drive the terminal.
pub fn sanitize_terminal(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn render_lines(view: &FeedView) -> Vec<HeadlineLine> {
    view.headlines()
        .iter()
        .map(|h| HeadlineLine {
            title: sanitize_terminal(&h.title),
            meta: sanitize_terminal(&meta_text(h)),
            link: h.link.as_deref().map(sanitize_terminal),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn articles(n: usize) -> String {
        let items: Vec<String> = (0..n)
            .map(|i| format!(r#"{{"title":"Story {i}","source":"wire","link":"https://e.x/{i}"}}"#))
            .collect();
        format!("[{}]", items.join(","))
    }

    #[test]
    fn test_bare_array_is_capped_at_ten() {
        let view = parse_document(&articles(15)).unwrap();
        assert_eq!(view.headlines().len(), MAX_HEADLINES);
        assert_eq!(view.headlines()[9].title, "Story 9");
        assert_eq!(render_html(&view).matches("<li").count(), 10);
        assert_eq!(render_lines(&view).len(), 10);
    }

    #[test]
    fn test_empty_items_shows_no_news_placeholder() {
        let view = parse_document(r#"{"items": []}"#).unwrap();
        assert_eq!(view, FeedView::Empty);
        let html = render_html(&view);
        assert!(html.contains(NO_NEWS_TEXT));
        assert!(!html.contains("<ul"));
    }

    #[test]
    fn test_wrapper_keys_and_metadata() {
        let doc = r#"{
            "generated_at_utc": "2024-01-29T10:00:00+00:00",
            "summary": "Markets steady.",
            "articles": [{"title": "A", "pubDate": "2024-01-29 09:15:00", "source_id": "bbc"}]
        }"#;
        let FeedView::Articles { headlines, summary, generated_at } = parse_document(doc).unwrap() else {
            panic!("expected articles");
        };
        assert_eq!(summary.as_deref(), Some("Markets steady."));
        assert_eq!(generated_at.as_deref(), Some("2024-01-29T10:00:00+00:00"));
        assert_eq!(headlines[0].source.as_deref(), Some("bbc"));
        assert_eq!(headlines[0].display_date().as_deref(), Some("2024-01-29 09:15"));

        for key in LIST_KEYS {
            let doc = format!(r#"{{"{key}": [{{"headline": "H"}}]}}"#);
            assert_eq!(parse_document(&doc).unwrap().headlines()[0].title, "H");
        }
    }

    #[test]
    fn test_field_aliases() {
        let entry = serde_json::json!({
            "name": "Aliased",
            "publisher": {"id": "x", "name": "Example Wire"},
            "href": "https://example.org/a",
            "publishedAt": "Mon, 29 Jan 2024 09:15:00 +0000"
        });
        let h = normalize_entry(&entry).unwrap();
        assert_eq!(h.title, "Aliased");
        assert_eq!(h.source.as_deref(), Some("Example Wire"));
        assert_eq!(h.link.as_deref(), Some("https://example.org/a"));
        assert_eq!(h.display_date().as_deref(), Some("2024-01-29 09:15"));
    }

    #[test]
    fn test_missing_title_and_bad_entries() {
        let view = parse_document(r#"[{"title": "  "}, 42, "text", {"url": "javascript:alert(1)"}]"#)
            .unwrap();
        let hs = view.headlines();
        assert_eq!(hs.len(), 2);
        assert!(hs.iter().all(|h| h.title == UNTITLED));
        assert_eq!(hs[1].link, None);
    }

    #[test]
    fn test_malformed_documents_error() {
        assert!(matches!(parse_document("{not json"), Err(FeedError::Json(_))));
        assert!(matches!(parse_document(r#"{"status": "ok"}"#), Err(FeedError::NoList)));
        assert!(matches!(parse_document("\"hello\""), Err(FeedError::NoList)));
    }

    #[test]
    fn test_script_title_is_escaped() {
        let hostile = parse_document(
            r#"[{"title": "<script>alert('x')</script>", "source": "<b>src</b>", "link": "https://e.x/?a=1&b=\"2\""}]"#,
        )
        .unwrap();
        let plain = parse_document(r#"[{"title": "plain", "source": "src", "link": "https://e.x/"}]"#)
            .unwrap();
        let html = render_html(&hostile);
        assert!(!html.contains("<script"));
        assert!(!html.contains("b=\"2\""));
        assert!(html.contains(&Escape("<script>alert('x')</script>").to_string()));
        assert!(html.contains(&Escape("https://e.x/?a=1&b=\"2\"").to_string()));
        assert!(html.contains(&Escape("<b>src</b>").to_string()));
        // Feed text contributes no '<' of its own.
        assert_eq!(
            html.matches('<').count(),
            render_html(&plain).matches('<').count()
        );
    }

    #[test]
    fn test_render_is_idempotent() {
        let doc = articles(3);
        let a = render_html(&parse_document(&doc).unwrap());
        let b = render_html(&parse_document(&doc).unwrap());
        assert_eq!(a, b);
        assert_eq!(
            render_lines(&parse_document(&doc).unwrap()),
            render_lines(&parse_document(&doc).unwrap())
        );
    }

    #[test]
    fn test_placeholders_are_distinct() {
        let not_found = FeedView::NotFound { reason: "HTTP 404".into() };
        assert_ne!(render_html(&FeedView::Empty), render_html(&not_found));
        assert!(render_html(&not_found).contains(NOT_FOUND_TEXT));
        assert_eq!(FeedView::Loading.placeholder(), Some(LOADING_TEXT));
        assert!(render_lines(&not_found).is_empty());
    }

    #[test]
    fn test_terminal_lines_strip_escapes() {
        let view = parse_document(r#"[{"title": "Breaking\u001b[2J\nnews", "source": "wire\t"}]"#).unwrap();
        let lines = render_lines(&view);
        assert_eq!(lines[0].title, "Breaking [2J news");
        assert_eq!(lines[0].meta, "wire");
        assert!(!lines[0].title.contains('\u{1b}'));
    }
}
