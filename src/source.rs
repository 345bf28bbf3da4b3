//! Loading the page to convert and the resources it links to.
//!
//! A location names a local file when one exists at that path; otherwise it
//! must look like a web address and is fetched over HTTP(S).
use crate::environment::looks_like_url;
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    Local(PathBuf),
    Remote(Url),
}

impl SourceLocation {
    pub fn parse(location: &str) -> Result<Self> {
        let path = Path::new(location);
        if path.exists() {
            return Ok(Self::Local(path.to_path_buf()));
        }
        if looks_like_url(location) {
            let address = with_scheme(location.trim());
            let url = Url::parse(&address).with_context(|| format!("parse URL {address}"))?;
            return Ok(Self::Remote(url));
        }
        Err(anyhow!(
            "{location} is neither an existing file nor a URL"
        ))
    }

    pub fn load(&self) -> Result<String> {
        match self {
            Self::Local(path) => {
                fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
            }
            Self::Remote(url) => fetch(url),
        }
    }

    /// Resolve a link found in this document. `data:` and fragment-only
    /// links resolve to nothing, as do schemes that cannot be loaded.
    pub fn join(&self, href: &str) -> Option<SourceLocation> {
        let href = href.trim();
        if href.is_empty() || href.starts_with('#') {
            return None;
        }
        let resolved = match self {
            Self::Remote(base) => base.join(href).ok()?,
            // A protocol-relative link from a file has no scheme to inherit.
            Self::Local(_) if href.starts_with("//") => Url::parse(&format!("https:{href}")).ok()?,
            Self::Local(path) => file_url(path)?.join(href).ok()?,
        };
        match resolved.scheme() {
            "http" | "https" => Some(Self::Remote(resolved)),
            "file" => resolved.to_file_path().ok().map(Self::Local),
            _ => None,
        }
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local(path) => write!(f, "{}", path.display()),
            Self::Remote(url) => f.write_str(url.as_str()),
        }
    }
}

/// `file:` URL for a local page. Relative paths are taken from the working
/// directory.
fn file_url(path: &Path) -> Option<Url> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().ok()?.join(path)
    };
    Url::from_file_path(absolute).ok()
}

fn fetch(url: &Url) -> Result<String> {
    tracing::debug!(%url, "fetching");
    let mut response = ureq::get(url.as_str())
        .call()
        .with_context(|| format!("fetch {url}"))?;
    response
        .body_mut()
        .read_to_string()
        .with_context(|| format!("read body of {url}"))
}

fn with_scheme(location: &str) -> String {
    let lower = location.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        location.to_string()
    } else {
        format!("https://{location}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(url: &str) -> Option<SourceLocation> {
        Some(SourceLocation::Remote(Url::parse(url).expect("valid url")))
    }

    #[test]
    fn existing_files_are_local() {
        let dir = tempfile::tempdir().expect("tempdir");
        let page = dir.path().join("index.html");
        fs::write(&page, "<p>hi</p>").expect("write");
        let location = SourceLocation::parse(&page.display().to_string()).expect("parse");
        assert_eq!(location, SourceLocation::Local(page));
        assert_eq!(location.load().expect("load"), "<p>hi</p>");
    }

    #[test]
    fn addresses_default_to_https() {
        assert_eq!(
            Some(SourceLocation::parse("example.com/page").expect("parse")),
            remote("https://example.com/page")
        );
        assert_eq!(
            Some(SourceLocation::parse("http://127.0.0.1:8080").expect("parse")),
            remote("http://127.0.0.1:8080/")
        );
    }

    #[test]
    fn unknown_locations_are_rejected() {
        assert!(SourceLocation::parse("no/such/file.html").is_err());
    }

    #[test]
    fn remote_links_resolve_against_the_page() {
        let base = remote("https://example.com/blog/post.html?x=1").expect("base");
        assert_eq!(base.join("site.css"), remote("https://example.com/blog/site.css"));
        assert_eq!(base.join("/main.css"), remote("https://example.com/main.css"));
        assert_eq!(base.join("//cdn.example.net/a.css"), remote("https://cdn.example.net/a.css"));
        assert_eq!(base.join("http://other.org/b.css"), remote("http://other.org/b.css"));
        assert_eq!(base.join("data:text/css,a{}"), None);
        assert_eq!(base.join("#top"), None);

        let root = remote("https://example.com").expect("root");
        assert_eq!(root.join("a.css"), remote("https://example.com/a.css"));
    }

    #[test]
    fn dot_segments_are_removed() {
        let base = remote("https://example.com/blog/post.html").expect("base");
        assert_eq!(base.join("../a.css"), remote("https://example.com/a.css"));
        assert_eq!(base.join("./css/../b.css"), remote("https://example.com/blog/b.css"));
    }

    #[test]
    fn local_links_resolve_next_to_the_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let base = SourceLocation::Local(dir.path().join("pages/index.html"));
        assert_eq!(
            base.join("../css/main.css?v=2"),
            Some(SourceLocation::Local(dir.path().join("css/main.css")))
        );
        assert_eq!(
            base.join("//cdn.example.net/a.css"),
            remote("https://cdn.example.net/a.css")
        );
        assert_eq!(base.join("mailto:someone@example.com"), None);
    }
}
