//! Best-effort scans over question text. Nothing here tokenizes or parses;
//! every detector is a substring or regex probe.

use regex::Regex;
use std::ops::RangeInclusive;
use std::sync::OnceLock;

macro_rules! static_regex {
    ($name:ident, $pattern:expr) => {
        fn $name() -> &'static Regex {
            static RE: OnceLock<Regex> = OnceLock::new();
            RE.get_or_init(|| Regex::new($pattern).expect("static pattern compiles"))
        }
    };
}

/// Years considered plausible when scanning text.
pub const YEAR_SCAN: RangeInclusive<i64> = 2015..=2030;

static_regex!(dash_range, r"(20\d{2})\s*[-–]\s*(20\d{2})");
static_regex!(to_range, r"(20\d{2})\s+(?:to|through|thru)\s+(20\d{2})");
static_regex!(between_range, r"between\s+(20\d{2})\s+and\s+(20\d{2})");
static_regex!(from_year, r"from\s+(20\d{2})");
static_regex!(to_year, r"to\s+(20\d{2})");
static_regex!(top_n, r"top\s+(\d+)");
static_regex!(quoted, r#""([^"]+)""#);
static_regex!(category_word, r"(?i)\bcategory\b");
static_regex!(category_named, r"(?i)\bcategory(?:\s*[:=]\s*|\s+)([\w&/\-]+(?:\s+[\w&/\-]+)*)");

/// Words that end a trailing `category X ...` capture.
const CATEGORY_STOPWORDS: &[&str] = &[
    "in", "for", "during", "from", "to", "between", "over", "by", "with", "and", "or", "vs", "versus", "of",
    "the", "year", "years", "yearly", "per", "since", "last", "this", "compared", "sales", "revenue",
    "trend", "breakdown", "performance",
];

pub fn contains_any(text: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| text.contains(n))
}

/// First year of [`YEAR_SCAN`] that occurs literally in `text`.
pub fn extract_year(text: &str) -> Option<i64> {
    YEAR_SCAN.clone().find(|y| text.contains(&y.to_string()))
}

/// The two smallest distinct years mentioned, ascending.
pub fn extract_two_years(text: &str) -> Option<[i64; 2]> {
    let mut found = YEAR_SCAN.clone().filter(|y| text.contains(&y.to_string()));
    Some([found.next()?, found.next()?])
}

fn capture_pair(re: &Regex, text: &str) -> Option<(i64, i64)> {
    let caps = re.captures(text)?;
    Some((caps[1].parse().ok()?, caps[2].parse().ok()?))
}

fn capture_one(re: &Regex, text: &str) -> Option<i64> {
    re.captures(text)?[1].parse().ok()
}

/// `A-B`, `A to B`, `between A and B`, or loose `from A` / `to B` fragments.
pub fn extract_year_range(text: &str) -> (Option<i64>, Option<i64>) {
    let explicit = capture_pair(dash_range(), text)
        .or_else(|| capture_pair(to_range(), text))
        .or_else(|| capture_pair(between_range(), text));

    if let Some((from, to)) = explicit {
        return (Some(from), Some(to));
    }

    (capture_one(from_year(), text), capture_one(to_year(), text))
}

/// The `N` of a "top N" phrase.
pub fn extract_limit(text: &str) -> Option<i64> {
    capture_one(top_n(), text)
}

/// Text of the first double-quoted span, trimmed.
pub fn extract_quoted(text: &str) -> Option<String> {
    let caps = quoted().captures(text)?;
    let inner = caps[1].trim();
    (!inner.is_empty()).then(|| inner.to_string())
}

/// Connectives allowed inside a name that sits between "in" and "category".
const ENCLOSED_CONNECTIVES: &[&str] = &["and", "of", "the"];

fn has_digit(word: &str) -> bool {
    word.bytes().any(|b| b.is_ascii_digit())
}

fn is_name_word(word: &str) -> bool {
    let lower = word.to_lowercase();
    !CATEGORY_STOPWORDS.contains(&lower.as_str()) && !has_digit(word)
}

fn is_enclosed_word(word: &str) -> bool {
    let lower = word.to_lowercase();
    is_name_word(word) || ENCLOSED_CONNECTIVES.contains(&lower.as_str())
}

/// The run of name words directly before one `category`, provided the run
/// starts right after "in" or a year.
fn enclosed_category(before: &str) -> Option<String> {
    let words: Vec<&str> = before.split_whitespace().collect();
    let start = words.iter().rposition(|w| !is_enclosed_word(w))?;

    let boundary = words[start];
    if !boundary.eq_ignore_ascii_case("in") && !has_digit(boundary) {
        return None;
    }

    let mut run = &words[start + 1..];
    if run.first().is_some_and(|w| w.eq_ignore_ascii_case("the")) {
        run = &run[1..];
    }
    normalize_category(&run.join(" "))
}

/// "in the X category", "in X category", or "category X" / "category: X".
pub fn extract_category(text: &str) -> Option<String> {
    let enclosed = category_word()
        .find_iter(text)
        .find_map(|m| enclosed_category(&text[..m.start()]));

    if enclosed.is_some() {
        return enclosed;
    }

    let caps = category_named().captures(text)?;
    let kept: Vec<&str> = caps[1].split_whitespace().take_while(|w| is_name_word(w)).collect();

    normalize_category(&kept.join(" "))
}

/// Trim quotes and punctuation, then title-case each word: `" toyota "` → `"Toyota"`.
pub fn normalize_category(raw: &str) -> Option<String> {
    let trimmed = raw
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'')
        .trim_matches(|c: char| c.is_whitespace() || ".,:;()[]{}".contains(c));

    if trimmed.is_empty() {
        return None;
    }

    let words: Vec<String> = trimmed.split_whitespace().map(capitalize).collect();
    Some(words.join(" "))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
