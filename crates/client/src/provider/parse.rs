//! HTML parsing for provider listing and question pages.
//!
//! Listing pages (`/discussions/{provider}/{page}/`) list discussion links in
//! document order plus a "page X of Y" indicator. Question pages carry the
//! header, body, choices, suggested answer and the comment thread.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use url::Url;

use examdl_core::{Choice, Discussion, Error, QuestionData};

static QUESTION_NO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)question\s*#?:?\s*(\d+)").expect("invalid regex"));
static TOPIC_NO: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)topic\s*#?:?\s*(\d+)").expect("invalid regex"));

/// A discussion link found on a listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub title: String,
    /// Absolute URL of the question page.
    pub url: String,
}

/// Parsed listing page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    pub entries: Vec<ListingEntry>,
    /// Last page number advertised by the pagination indicator.
    pub last_page: Option<u32>,
}

/// Parse a provider listing page, resolving links against `base_url`.
pub fn parse_listing(html: &str, base_url: &Url) -> ListingPage {
    let document = Html::parse_document(html);
    let link_selector = Selector::parse("a.discussion-link[href]").expect("invalid selector");
    let indicator_selector = Selector::parse(".discussion-list-page-indicator strong").expect("invalid selector");

    let entries = document
        .select(&link_selector)
        .filter_map(|element| {
            let href = element.value().attr("href")?;
            let url = resolve(base_url, href)?;
            Some(ListingEntry { title: collapse_text(element), url })
        })
        .collect();

    let last_page = document
        .select(&indicator_selector)
        .filter_map(|strong| collapse_text(strong).parse::<u32>().ok())
        .max();

    ListingPage { entries, last_page }
}

/// Whether a listing entry belongs to the certification identified by `slug`.
///
/// Provider discussion URLs and titles embed `exam-{slug}-topic-N-question-M`.
pub fn matches_slug(entry: &ListingEntry, slug: &str) -> bool {
    let needle = format!("exam-{}-topic-", slug.trim().to_lowercase());
    let title = entry.title.to_lowercase().split_whitespace().collect::<Vec<_>>().join("-");
    entry.url.to_lowercase().contains(&needle) || title.contains(&needle)
}

/// Parse a question page into a `QuestionData` with `source_url`.
///
/// # Errors
///
/// Returns `Error::Parse` if the page has no question body.
pub fn parse_question(html: &str, source_url: &str) -> Result<QuestionData, Error> {
    let document = Html::parse_document(html);

    let body = first_text(&document, ".question-body p.card-text")
        .or_else(|| first_text(&document, ".question-body"))
        .filter(|b| !b.is_empty())
        .ok_or_else(|| Error::Parse(format!("no question body at {source_url}")))?;

    let title = first_text(&document, "h1").filter(|t| !t.is_empty());
    let header = first_text(&document, ".question-discussion-header").unwrap_or_default();

    let number = capture_number(&QUESTION_NO, &header)
        .or_else(|| title.as_deref().and_then(|t| capture_number(&QUESTION_NO, t)))
        .unwrap_or_default();
    let topic = capture_number(&TOPIC_NO, &header).or_else(|| title.as_deref().and_then(|t| capture_number(&TOPIC_NO, t)));

    let choice_selector = Selector::parse(".question-choices-container li").expect("invalid selector");
    let choices = document
        .select(&choice_selector)
        .enumerate()
        .map(|(idx, li)| Choice::parse(strip_badges(&collapse_text(li)), idx))
        .collect();

    let answer = first_text(&document, ".correct-answer").unwrap_or_default();
    let timestamp = first_text(&document, ".discussion-meta-data i").filter(|t| !t.is_empty());

    Ok(QuestionData {
        number,
        topic,
        title,
        body,
        choices,
        answer,
        discussion: parse_discussion(&document),
        timestamp,
        source_url: source_url.to_string(),
    })
}

fn parse_discussion(document: &Html) -> Vec<Discussion> {
    let container = Selector::parse(".comment-container").expect("invalid selector");
    let content = Selector::parse(".comment-content").expect("invalid selector");
    let upvotes = Selector::parse(".upvote-count").expect("invalid selector");

    document
        .select(&container)
        .filter_map(|comment| {
            let text = comment.select(&content).next().map(collapse_text)?;
            if text.is_empty() {
                return None;
            }
            let votes = comment
                .select(&upvotes)
                .next()
                .and_then(|v| collapse_text(v).parse::<u32>().ok())
                .unwrap_or(0);
            Some(Discussion { text, votes })
        })
        .collect()
}

fn first_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document.select(&selector).next().map(collapse_text)
}

/// Element text with runs of whitespace collapsed to single spaces.
fn collapse_text(element: ElementRef<'_>) -> String {
    element.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" ")
}

fn capture_number(re: &Regex, text: &str) -> Option<u32> {
    re.captures(text)?.get(1)?.as_str().parse().ok()
}

/// Drop provider badges such as "Most Voted" appended to choice text.
fn strip_badges(text: &str) -> &str {
    text.trim_end().trim_end_matches("Most Voted").trim_end()
}

/// Resolve `href` against `base`, dropping any fragment.
fn resolve(base: &Url, href: &str) -> Option<String> {
    let mut url = base.join(href.trim()).ok()?;
    match url.scheme() {
        "http" | "https" => {}
        _ => return None,
    }
    url.set_fragment(None);
    Some(url.to_string())
}
