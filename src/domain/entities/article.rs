//! Feed article record and the helpers the picture cache relies on.

use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Picture shown for articles whose description embeds no image.
pub const FALLBACK_PICTURE_URL: &str = "https://www.cbc.ca/a/favicon.ico";

/// A single feed article.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Article {
    guid: String,
    title: String,
    link: String,
    description: String,
    pub_date: Option<String>,
    author: Option<String>,
    category: Option<String>,
}

impl Article {
    /// Creates an article with the required fields.
    #[must_use]
    pub fn new(
        guid: impl Into<String>,
        title: impl Into<String>,
        link: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            guid: guid.into(),
            title: title.into(),
            link: link.into(),
            description: description.into(),
            ..Self::default()
        }
    }

    /// Sets the raw RFC 2822 publication date.
    #[must_use]
    pub fn with_pub_date(mut self, pub_date: impl Into<String>) -> Self {
        self.pub_date = Some(pub_date.into());
        self
    }

    /// Sets the author.
    #[must_use]
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Sets the category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Stable identifier, used as the store key.
    #[must_use]
    pub fn guid(&self) -> &str {
        &self.guid
    }

    /// Headline.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Link to the full story.
    #[must_use]
    pub fn link(&self) -> &str {
        &self.link
    }

    /// Raw HTML description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Raw publication date as published by the feed.
    #[must_use]
    pub fn pub_date(&self) -> Option<&str> {
        self.pub_date.as_deref()
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// Returns the first `<img src='...'>` embedded in the description, or
    /// [`FALLBACK_PICTURE_URL`].
    ///
    /// # Panics
    ///
    /// Panics if the internal regex is invalid.
    #[must_use]
    pub fn picture_url(&self) -> &str {
        static IMG_REGEX: OnceLock<Regex> = OnceLock::new();
        let re = IMG_REGEX.get_or_init(|| Regex::new(r"<img src='(.*?)'").expect("Invalid regex"));

        re.captures(&self.description)
            .and_then(|caps| caps.get(1))
            .map_or(FALLBACK_PICTURE_URL, |m| m.as_str())
    }

    /// The description with HTML tags removed and common entities decoded,
    /// flattened to a single trimmed line.
    ///
    /// # Panics
    ///
    /// Panics if the internal regex is invalid.
    #[must_use]
    pub fn description_plaintext(&self) -> String {
        static TAG_REGEX: OnceLock<Regex> = OnceLock::new();
        let re = TAG_REGEX.get_or_init(|| Regex::new(r"<[^>]*>").expect("Invalid regex"));

        re.replace_all(&self.description, "")
            .replace("&nbsp;", " ")
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&#39;", "'")
            .replace("&apos;", "'")
            .replace("&amp;", "&")
            .replace(['\n', '\r', '\u{a0}', '\u{fffc}'], " ")
            .trim()
            .to_string()
    }

    /// Publication time, or 2000-02-01 UTC when the date is missing or malformed.
    #[must_use]
    pub fn published_at(&self) -> DateTime<Utc> {
        self.pub_date
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc2822(raw.trim()).ok())
            .map_or_else(fallback_date, |dt| dt.with_timezone(&Utc))
    }
}

fn fallback_date() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(2000, 2, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or_default()
}

/// Sorts articles newest first.
pub fn sort_newest_first(articles: &mut [Article]) {
    articles.sort_by_key(|a| std::cmp::Reverse(a.published_at()));
}
