//! Placeholder substitution for action parameters.
//!
//! Step files refer to run-specific values through `$KEY` placeholders
//! (`$URL`, `$HOST`, `$DOMAIN`, ...). The table is built once per run and is
//! read-only while actions execute.
use anyhow::{anyhow, Result};
use regex::Regex;
use std::sync::OnceLock;

/// Value used for the built-in keys when the source is not a URL.
pub const PLACEHOLDER_VALUE: &str = "testing";

const BUILTIN_KEYS: [&str; 3] = ["$URL", "$HOST", "$DOMAIN"];

/// Ordered placeholder table. Keys are applied in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentTable {
    entries: Vec<(String, String)>,
}

impl EnvironmentTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with every built-in key bound to [`PLACEHOLDER_VALUE`].
    pub fn placeholders() -> Self {
        let mut table = Self::new();
        for key in BUILTIN_KEYS {
            table.insert(key, PLACEHOLDER_VALUE);
        }
        table
    }

    /// Derive `$URL`, `$HOST` and `$DOMAIN` from the source location.
    ///
    /// Local paths keep the placeholder values.
    pub fn for_source(location: &str) -> Self {
        let mut table = Self::placeholders();
        if let Some(parts) = url_parts(location) {
            table.insert("$URL", location);
            table.insert("$HOST", &parts.origin);
            table.insert("$DOMAIN", &parts.domain);
        }
        table
    }

    /// Point `$HOST` and `$DOMAIN` at a custom host (`example.com` or
    /// `https://example.com:8080`).
    pub fn with_custom_host(mut self, host: &str) -> Self {
        match url_parts(host) {
            Some(parts) => {
                self.insert("$HOST", &parts.origin);
                self.insert("$DOMAIN", &parts.domain);
            }
            None => {
                self.insert("$HOST", host);
                self.insert("$DOMAIN", host);
            }
        }
        self
    }

    /// Insert or overwrite a key, keeping the original position on overwrite.
    pub fn insert(&mut self, key: &str, value: &str) {
        match self.entries.iter_mut().find(|(existing, _)| existing == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.entries.push((key.to_string(), value.to_string())),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value.as_str())
    }

    /// Apply `KEY=VALUE,KEY=VALUE` overrides. Keys without a leading `$` get one.
    pub fn apply_overrides(&mut self, raw: &str) -> Result<()> {
        for pair in raw.split(',') {
            let pair = pair.trim();
            if pair.is_empty() {
                continue;
            }
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| anyhow!("invalid env override: {pair}"))?;
            let key = key.trim();
            if key.is_empty() || key == "$" {
                return Err(anyhow!("env override has an empty key: {pair}"));
            }
            let key = if key.starts_with('$') {
                key.to_string()
            } else {
                format!("${key}")
            };
            self.insert(&key, value);
        }
        Ok(())
    }

    /// Substitute placeholders in `value`.
    ///
    /// Each key replaces only its first occurrence; `"$X and $X"` with
    /// `$X=A` becomes `"A and $X"`. Step files rely on this, so do not
    /// switch it to a global replace.
    pub fn resolve(&self, value: &str) -> String {
        let mut resolved = value.to_string();
        for (key, replacement) in &self.entries {
            resolved = resolved.replacen(key.as_str(), replacement, 1);
        }
        resolved
    }

    /// [`resolve`](Self::resolve) for optional parameters.
    pub fn resolve_opt(&self, value: Option<&str>) -> Option<String> {
        value.map(|value| self.resolve(value))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

struct UrlParts {
    origin: String,
    domain: String,
}

fn url_regex() -> &'static Regex {
    static URL_RE: OnceLock<Regex> = OnceLock::new();
    URL_RE.get_or_init(|| {
        Regex::new(r"(?i)^(https?://)?([a-z\d][a-z\d.-]*\.[a-z]{2,}|\d{1,3}(?:\.\d{1,3}){3}|localhost)(:\d+)?(?:[/?#].*)?$")
            .expect("valid url regex")
    })
}

fn url_parts(location: &str) -> Option<UrlParts> {
    let caps = url_regex().captures(location.trim())?;
    let scheme = caps
        .get(1)
        .map(|m| m.as_str().to_ascii_lowercase())
        .unwrap_or_else(|| "https://".to_string());
    let domain = caps.get(2)?.as_str().to_ascii_lowercase();
    let port = caps.get(3).map(|m| m.as_str()).unwrap_or_default();
    Some(UrlParts {
        origin: format!("{scheme}{domain}{port}"),
        domain,
    })
}

/// Whether `location` looks like a web address rather than a file path.
pub fn looks_like_url(location: &str) -> bool {
    url_regex().is_match(location.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_first_occurrence_of_each_key_is_replaced() {
        let mut table = EnvironmentTable::new();
        table.insert("$X", "A");
        assert_eq!(table.resolve("$X and $X"), "A and $X");
    }

    #[test]
    fn keys_apply_in_insertion_order() {
        let mut table = EnvironmentTable::new();
        table.insert("$URL", "$HOST/page");
        table.insert("$HOST", "https://example.com");
        assert_eq!(table.resolve("$URL"), "https://example.com/page");
    }

    #[test]
    fn text_without_placeholders_is_untouched() {
        let table = EnvironmentTable::placeholders();
        assert_eq!(table.resolve("<link rel=canonical>"), "<link rel=canonical>");
        assert_eq!(table.resolve_opt(None), None);
    }

    #[test]
    fn url_source_derives_host_and_domain() {
        let table = EnvironmentTable::for_source("https://www.example.com:8080/a/b.html?x=1");
        assert_eq!(
            table.get("$URL"),
            Some("https://www.example.com:8080/a/b.html?x=1")
        );
        assert_eq!(table.get("$HOST"), Some("https://www.example.com:8080"));
        assert_eq!(table.get("$DOMAIN"), Some("www.example.com"));
    }

    #[test]
    fn local_source_keeps_placeholders() {
        let table = EnvironmentTable::for_source("./pages/index");
        assert_eq!(table.get("$URL"), Some(PLACEHOLDER_VALUE));
        assert_eq!(table.get("$HOST"), Some(PLACEHOLDER_VALUE));
    }

    #[test]
    fn custom_host_overrides_host_and_domain() {
        let table = EnvironmentTable::placeholders().with_custom_host("amp.example.org");
        assert_eq!(table.get("$HOST"), Some("https://amp.example.org"));
        assert_eq!(table.get("$DOMAIN"), Some("amp.example.org"));
        assert_eq!(table.get("$URL"), Some(PLACEHOLDER_VALUE));
    }

    #[test]
    fn overrides_add_dollar_prefix() {
        let mut table = EnvironmentTable::placeholders();
        table
            .apply_overrides("CDN=https://cdn.test, $HOST=h")
            .expect("apply overrides");
        assert_eq!(table.get("$CDN"), Some("https://cdn.test"));
        assert_eq!(table.get("$HOST"), Some("h"));
        assert!(table.apply_overrides("novalue").is_err());
    }

    #[test]
    fn url_detection() {
        assert!(looks_like_url("example.com"));
        assert!(looks_like_url("http://127.0.0.1:8080/index.html"));
        assert!(!looks_like_url("pages/index"));
        assert!(!looks_like_url("/tmp/page"));
    }
}
