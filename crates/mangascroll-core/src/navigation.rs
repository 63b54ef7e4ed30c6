//! Chapter numbers embedded in reader URLs.
//!
//! A pattern is a template such as `chapter-{n}` where `{n}` stands for the
//! chapter number. Matching is case-insensitive and only the first match in a
//! URL is considered.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

pub const DEFAULT_CHAPTER_PATTERN: &str = "chapter-{n}";
const PLACEHOLDER: &str = "{n}";

static DEFAULT_CHAPTER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)chapter-(\d+)").expect("default chapter regex is valid"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    /// The pattern has no `{n}` placeholder, or more than one.
    InvalidPattern(String),
    /// The URL contains no text matching the pattern.
    NoChapterInUrl,
    AtFirstChapter,
    NoUrl,
}

impl std::fmt::Display for NavigationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NavigationError::InvalidPattern(pattern) => write!(
                f,
                "Chapter pattern `{pattern}` must contain exactly one {PLACEHOLDER} placeholder"
            ),
            NavigationError::NoChapterInUrl => {
                write!(f, "Could not find a chapter number in the current URL")
            }
            NavigationError::AtFirstChapter => write!(f, "You are already at the first chapter"),
            NavigationError::NoUrl => write!(f, "Please enter a URL first"),
        }
    }
}

impl std::error::Error for NavigationError {}

#[derive(Debug, Clone)]
pub struct ChapterNavigator {
    pattern: String,
    regex: Regex,
}

impl Default for ChapterNavigator {
    fn default() -> Self {
        ChapterNavigator {
            pattern: DEFAULT_CHAPTER_PATTERN.to_string(),
            regex: DEFAULT_CHAPTER_RE.clone(),
        }
    }
}

impl ChapterNavigator {
    pub fn new(pattern: &str) -> Result<Self, NavigationError> {
        let pattern = pattern.trim();
        let mut parts = pattern.split(PLACEHOLDER);
        let (Some(prefix), Some(suffix), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(NavigationError::InvalidPattern(pattern.to_string()));
        };
        if prefix.is_empty() && suffix.is_empty() {
            return Err(NavigationError::InvalidPattern(pattern.to_string()));
        }

        let source = format!(
            r"(?i){}(\d+){}",
            regex::escape(prefix),
            regex::escape(suffix)
        );
        let regex =
            Regex::new(&source).map_err(|_| NavigationError::InvalidPattern(pattern.to_string()))?;
        debug!(pattern, regex = %regex, "Chapter pattern compiled");
        Ok(ChapterNavigator {
            pattern: pattern.to_string(),
            regex,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Chapter number found in `url`, or 1 when there is none.
    pub fn chapter_number(&self, url: &str) -> u32 {
        self.find(url).map(|(_, number)| number).unwrap_or(1)
    }

    pub fn next_url(&self, url: &str) -> Result<String, NavigationError> {
        let (range, current) = self.locate(url)?;
        let next = current.checked_add(1).ok_or(NavigationError::NoChapterInUrl)?;
        Ok(splice(url, range, next))
    }

    pub fn prev_url(&self, url: &str) -> Result<String, NavigationError> {
        let (range, current) = self.locate(url)?;
        if current <= 1 {
            return Err(NavigationError::AtFirstChapter);
        }
        Ok(splice(url, range, current - 1))
    }

    fn locate(&self, url: &str) -> Result<(std::ops::Range<usize>, u32), NavigationError> {
        if url.trim().is_empty() {
            return Err(NavigationError::NoUrl);
        }
        self.find(url).ok_or(NavigationError::NoChapterInUrl)
    }

    fn find(&self, url: &str) -> Option<(std::ops::Range<usize>, u32)> {
        let digits = self.regex.captures(url)?.get(1)?;
        let number = digits.as_str().parse::<u32>().ok()?;
        Some((digits.range(), number))
    }
}

fn splice(url: &str, range: std::ops::Range<usize>, number: u32) -> String {
    let mut out = String::with_capacity(url.len() + 2);
    out.push_str(&url[..range.start]);
    out.push_str(&number.to_string());
    out.push_str(&url[range.end..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pattern_extracts_chapter() {
        let nav = ChapterNavigator::default();
        assert_eq!(nav.chapter_number("https://example.com/manga/chapter-12"), 12);
        assert_eq!(nav.chapter_number("https://example.com/manga/Chapter-3/"), 3);
        assert_eq!(nav.chapter_number("https://example.com/manga/volume-2"), 1);
    }

    #[test]
    fn next_and_prev_replace_first_match_only() {
        let nav = ChapterNavigator::default();
        let url = "https://example.com/chapter-9/chapter-9.html";
        assert_eq!(
            nav.next_url(url).as_deref(),
            Ok("https://example.com/chapter-10/chapter-9.html")
        );
        assert_eq!(
            nav.prev_url(url).as_deref(),
            Ok("https://example.com/chapter-8/chapter-9.html")
        );
    }

    #[test]
    fn prev_from_first_chapter_is_rejected() {
        let nav = ChapterNavigator::default();
        let err = nav.prev_url("https://example.com/chapter-1").unwrap_err();
        assert_eq!(err, NavigationError::AtFirstChapter);
        assert_eq!(err.to_string(), "You are already at the first chapter");
    }

    #[test]
    fn custom_pattern_escapes_literal_text() {
        let nav = ChapterNavigator::new("ep.{n}.html").expect("pattern");
        assert_eq!(nav.chapter_number("https://site.test/show/ep.4.html"), 4);
        assert_eq!(nav.chapter_number("https://site.test/show/epX4.html"), 1);
        assert_eq!(
            nav.next_url("https://site.test/show/ep.4.html?x=1").as_deref(),
            Ok("https://site.test/show/ep.5.html?x=1")
        );
    }

    #[test]
    fn invalid_patterns_are_rejected() {
        assert!(matches!(
            ChapterNavigator::new("chapter"),
            Err(NavigationError::InvalidPattern(_))
        ));
        assert!(matches!(
            ChapterNavigator::new("{n}-{n}"),
            Err(NavigationError::InvalidPattern(_))
        ));
        assert!(matches!(
            ChapterNavigator::new("{n}"),
            Err(NavigationError::InvalidPattern(_))
        ));
    }

    #[test]
    fn urls_without_chapter_cannot_navigate() {
        let nav = ChapterNavigator::default();
        assert_eq!(
            nav.next_url("https://example.com/manga"),
            Err(NavigationError::NoChapterInUrl)
        );
        assert_eq!(nav.next_url("  "), Err(NavigationError::NoUrl));
    }
}
