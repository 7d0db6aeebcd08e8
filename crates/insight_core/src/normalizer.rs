//! Free-text reply normalizer.
//!
//! Converts the model's free-text answer into a fully populated
//! [`InsightResponse`]. The parser is a fixed pipeline: locate section
//! headers, slice the text into summary / concepts / sources blocks,
//! pull list items out of each block, then run an ordered sequence of
//! link-extraction strategies over every source line. Any section that
//! yields nothing is filled with deterministic, topic-parameterized
//! placeholder content - the output shape never degrades.
//!
//! The whole module is pure: text in, record out. The timestamp is the
//! only non-deterministic field of the result.

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{InsightResponse, Recommendation};

/// Recognized section headers, longest spelling first so the scanner
/// prefers "КРАТКОЕ РЕЗЮМЕ" over the bare "РЕЗЮМЕ" at the same position.
/// Anchored to line starts: a section word inside running prose is
/// content, not a boundary.
static HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?im)^\s*(?:КРАТКОЕ РЕЗЮМЕ|РЕЗЮМЕ|SUMMARY|КЛЮЧЕВЫЕ КОНЦЕПЦИИ|КЛЮЧЕВЫЕ КОНЦЕПЦИО|KEY CONCEPTS|РЕКОМЕНДУЕМЫЕ ИСТОЧНИКИ|RECOMMENDED SOURCES|ИСТОЧНИКИ|SOURCES):?",
    )
    .unwrap()
});

/// Concepts header text that leaked into a summary block mid-line.
static LEAKED_HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)\s*(?:КЛЮЧЕВЫЕ КОНЦЕПЦИИ|КЛЮЧЕВЫЕ КОНЦЕПЦИО|KEY CONCEPTS):?.*$").unwrap()
});

/// List item with a leading marker: hyphen, asterisk, bullet glyph,
/// `1.`/`1)` numbering or single-letter `a.`/`a)` numbering.
static LIST_ITEM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*(?:-|\*|•|\d+[.)]|[A-Za-z][.)])\s+(.+)$").unwrap());

/// Marker prefix of a nested list item, stripped from captured item text.
static NESTED_MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:-|\*|•|\d+[.)]|[A-Za-z][.)])\s+").unwrap());

/// Leading numbering on a marker-less line.
static LINE_NUMBERING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:\d+\.\s+|[A-Za-z]\.\s+|-\s+|\*\s+)").unwrap());

/// `<title>: <url>` or `<title> - <url>`.
static LABELED_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(.+?)(?::|\s-\s)\s*(https?://\S+)").unwrap());

/// Markdown-style `[title](url)` or `[title][url]`.
static MARKDOWN_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\[([^\]]+)\][(\[](https?://[^)\]]+)[)\]]").unwrap());

/// Any URL anywhere in the line.
static BARE_URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)https?://\S+").unwrap());

/// Host part of a URL, for domain-derived titles.
static DOMAIN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^https?://(?:www\.)?([^/]+)").unwrap());

/// Trailing colon or dash left on a title once the URL is removed.
static TITLE_TRAILER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r":\s*$|\s*-\s*$").unwrap());

/// Leading `<n>.` numbering on a plain-text source line.
static PLAIN_NUMBERING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.\s+").unwrap());

/// Stray brackets anywhere in a URL plus a closing parenthesis at its end.
static URL_BRACKETS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[|\]|\(|\)$").unwrap());

/// One trailing comma, period or quote on a URL.
static URL_TRAILING_PUNCT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[,."]$"#).unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Summary,
    Concepts,
    Sources,
}

fn classify_header(text: &str) -> Section {
    let lower = text.to_lowercase();
    if lower.contains("концепци") || lower.contains("key concepts") {
        Section::Concepts
    } else if lower.contains("источники") || lower.contains("sources") {
        Section::Sources
    } else {
        Section::Summary
    }
}

/// Slice the reply into per-section blocks.
///
/// Each recognized header opens a block running to the next recognized
/// header or end of text. Text before the first header counts as summary.
/// Duplicate headers resolve to the last occurrence.
fn split_sections(content: &str) -> (Option<String>, Option<String>, Option<String>) {
    let headers: Vec<(usize, usize, Section)> = HEADER_RE
        .find_iter(content)
        .map(|m| (m.start(), m.end(), classify_header(m.as_str())))
        .collect();

    if headers.is_empty() {
        // No structure at all: the first non-empty paragraph serves as
        // the summary, everything else is left to placeholder synthesis.
        let first_block = content
            .split("\n\n")
            .map(str::trim)
            .find(|block| !block.is_empty())
            .map(str::to_string);
        return (first_block, None, None);
    }

    let mut summary = None;
    let mut concepts = None;
    let mut sources = None;

    let preamble = content[..headers[0].0].trim();
    if !preamble.is_empty() {
        summary = Some(preamble.to_string());
    }

    for (i, &(_, end, section)) in headers.iter().enumerate() {
        let block_end = headers.get(i + 1).map_or(content.len(), |next| next.0);
        let block = content[end..block_end].trim().to_string();
        match section {
            Section::Summary => summary = Some(block),
            Section::Concepts => concepts = Some(block),
            Section::Sources => sources = Some(block),
        }
    }

    (summary, concepts, sources)
}

/// Extract list items from a block, stripping their markers. When no
/// marker-based item is found, every non-empty line counts as one item
/// with any leading numbering removed. Blank lines are never items.
fn extract_list_items(block: &str) -> Vec<String> {
    let mut items: Vec<String> = LIST_ITEM_RE
        .captures_iter(block)
        .map(|caps| NESTED_MARKER_RE.replace(caps[1].trim(), "").trim().to_string())
        .filter(|item| !item.is_empty())
        .collect();

    if items.is_empty() {
        items = block
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| LINE_NUMBERING_RE.replace(line, "").to_string())
            .collect();
    }

    items
}

/// Strategy 1: `<title>: <url>` / `<title> - <url>`.
fn extract_labeled_link(line: &str) -> Option<Recommendation> {
    let caps = LABELED_LINK_RE.captures(line)?;
    Some(Recommendation::new(
        caps[1].trim(),
        clean_url(caps[2].trim()),
    ))
}

/// Strategy 2: markdown `[title](url)` / `[title][url]`.
fn extract_markdown_link(line: &str) -> Option<Recommendation> {
    let caps = MARKDOWN_LINK_RE.captures(line)?;
    Some(Recommendation::new(
        caps[1].trim(),
        clean_url(caps[2].trim()),
    ))
}

/// Strategy 3: bare URL anywhere in the line. The text before the URL
/// becomes the title; a URL that opens the line gets a domain-derived
/// title instead.
fn extract_bare_url(line: &str) -> Option<Recommendation> {
    let m = BARE_URL_RE.find(line)?;
    let url = m.as_str();
    let title = if m.start() > 0 {
        let prefix = line[..m.start()].trim();
        TITLE_TRAILER_RE.replace(prefix, "").to_string()
    } else {
        let domain = DOMAIN_RE
            .captures(url)
            .map(|caps| caps[1].to_string())
            .unwrap_or_else(|| url.to_string());
        format!("Resource from {domain}")
    };
    Some(Recommendation::new(title, clean_url(url)))
}

/// Strategy 4: no URL at all. The line is the title and the URL is a
/// search query parameterized by topic and title.
fn synthesize_search_link(line: &str, topic: &str) -> Recommendation {
    let title = PLAIN_NUMBERING_RE.replace(line.trim(), "").to_string();
    let url = format!(
        "https://www.google.com/search?q={}+{}",
        topic.replace(' ', "+"),
        title.replace(' ', "+")
    );
    Recommendation::new(title, url)
}

/// Run the extraction strategies over one source line, in order.
fn parse_recommendation(line: &str, topic: &str) -> Recommendation {
    extract_labeled_link(line)
        .or_else(|| extract_markdown_link(line))
        .or_else(|| extract_bare_url(line))
        .unwrap_or_else(|| synthesize_search_link(line, topic))
}

/// Strip stray brackets and trailing punctuation from an extracted URL.
fn clean_url(url: &str) -> String {
    let url = URL_BRACKETS_RE.replace_all(url, "");
    URL_TRAILING_PUNCT_RE.replace(&url, "").to_string()
}

fn placeholder_summary(topic: &str) -> String {
    format!("Анализ темы: {topic}")
}

fn placeholder_concepts(topic: &str) -> Vec<String> {
    vec![
        format!("Основные принципы {topic}"),
        "Практическое применение".to_string(),
        "Современные тренды и развитие".to_string(),
    ]
}

fn placeholder_recommendations(topic: &str) -> Vec<Recommendation> {
    vec![
        Recommendation::new(
            format!("Руководство по {topic}"),
            format!(
                "https://example.com/guides/{}",
                topic.to_lowercase().replace(' ', "-")
            ),
        ),
        Recommendation::new(
            "Научные публикации",
            format!(
                "https://scholar.google.com/scholar?q={}",
                topic.replace(' ', "+")
            ),
        ),
    ]
}

/// Normalize a raw model reply into a fully populated insight record.
///
/// `raw` is the assistant's free text, or `None` when no reply was
/// obtained at all - in which case every section is synthesized.
pub fn normalize(topic: &str, raw: Option<&str>) -> InsightResponse {
    let (mut summary, mut key_concepts, mut recommendations) =
        (String::new(), Vec::new(), Vec::new());

    if let Some(content) = raw {
        let (summary_block, concepts_block, sources_block) = split_sections(content);

        if let Some(block) = summary_block {
            summary = LEAKED_HEADER_RE.replace(&block, "").trim().to_string();
        }
        if let Some(block) = concepts_block {
            key_concepts = extract_list_items(&block);
        }
        if let Some(block) = sources_block {
            recommendations = extract_list_items(&block)
                .iter()
                .map(|line| parse_recommendation(line, topic))
                .collect();
        }
    }

    if summary.is_empty() {
        summary = placeholder_summary(topic);
    }
    if key_concepts.is_empty() {
        key_concepts = placeholder_concepts(topic);
    }
    if recommendations.is_empty() {
        recommendations = placeholder_recommendations(topic);
    }

    InsightResponse {
        topic: topic.to_string(),
        summary,
        key_concepts,
        recommendations,
        timestamp: Utc::now(),
    }
}
