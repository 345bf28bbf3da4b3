//! External stylesheet collection for `inlineExternalStyles`.
use crate::document::Document;
use crate::source::SourceLocation;
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `href`s of `<link rel="stylesheet">` elements, in document order.
pub fn linked_stylesheets(markup: &str) -> Vec<String> {
    let mut document = Document::parse(markup);
    let Ok(links) = document.query("link[href]") else {
        return Vec::new();
    };
    links
        .into_iter()
        .filter(|link| {
            document.attribute(*link, "rel").is_some_and(|rel| {
                rel.split_ascii_whitespace()
                    .any(|token| token.eq_ignore_ascii_case("stylesheet"))
            })
        })
        .filter_map(|link| document.attribute(link, "href"))
        .map(str::to_string)
        .collect()
}

/// Concatenate the page's linked stylesheets followed by `extra` files.
///
/// Linked sheets that cannot be loaded are logged and skipped; explicitly
/// requested files must exist.
pub fn collect_external_styles(
    markup: &str,
    base: &SourceLocation,
    extra: &[PathBuf],
) -> Result<String> {
    let mut sheets = Vec::new();
    for href in linked_stylesheets(markup) {
        let Some(location) = base.join(&href) else {
            continue;
        };
        match location.load() {
            Ok(text) => {
                tracing::debug!(%location, bytes = text.len(), "loaded stylesheet");
                sheets.push(text);
            }
            Err(err) => tracing::warn!("skipping stylesheet {location}: {err:#}"),
        }
    }
    for path in extra {
        let text =
            fs::read_to_string(path).with_context(|| format!("read styles {}", path.display()))?;
        sheets.push(text);
    }
    Ok(sheets.join("\n"))
}
