/// Hosts whose content is user-generated or farmed and should not back a verdict.
pub const DEFAULT_BLOCKED: &[&str] = &[
    "namu.wiki",
    "blog.naver.com",
    "cafe.naver.com",
    "tistory.com",
    "quora.com",
    "reddit.com",
    "pinterest.com",
    "facebook.com",
    "tiktok.com",
    "instagram.com",
];

/// Immutable list of domain substrings. Built once at startup, shared by `Arc`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockList { entries: Vec<String> }

impl BlockList {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = entries
            .into_iter()
            .map(Into::into)
            .filter(|e: &String| !e.is_empty())
            .collect();
        Self { entries }
    }

    /// The built-in list plus any extra entries from configuration.
    pub fn with_defaults<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list = Self::new(DEFAULT_BLOCKED.iter().copied());
        for e in extra.into_iter().map(Into::into) {
            let e = e.trim().to_string();
            if !e.is_empty() && !list.entries.contains(&e) {
                list.entries.push(e);
            }
        }
        list
    }

    pub fn entries(&self) -> &[String] { &self.entries }

    /// Entries shaped like a bare host name, the only form a search API's
    /// domain exclusion accepts. Local filtering still uses every entry.
    pub fn domains(&self) -> Vec<&str> {
        self.entries.iter()
            .map(String::as_str)
            .filter(|e| {
                e.contains('.')
                    && !e.starts_with('.')
                    && !e.ends_with('.')
                    && !e.contains("..")
                    && !e.chars().any(|c| c == '/' || c == ':' || c.is_whitespace())
            })
            .collect()
    }

    /// Case-sensitive substring scan over the raw URL; no parsing.
    pub fn is_trusted(&self, url: &str) -> bool {
        !self.entries.iter().any(|blocked| url.contains(blocked.as_str()))
    }
}
