use super::Action;
use crate::css::{self, StyleSnapshot};
use crate::document::{Document, DocumentError, NodeId};
use regex::{Regex, RegexBuilder};
use thiserror::Error;

/// Outcome of one successfully dispatched action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionResult {
    pub message: String,
    /// Serialized document after the action.
    pub html: String,
    pub optimized_styles: Option<String>,
    pub unused_styles: Option<String>,
}

/// Why an action was skipped. The document is left as it was before the
/// action started.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("No matched element(s): {0}")]
    NoMatch(String),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error("invalid regex {pattern:?}: {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

struct StyleReports {
    optimized: String,
    unused: String,
}

/// Apply `action` to `document`.
///
/// Every fallible lookup happens before the first mutation, so an error
/// leaves the tree untouched. On success the document is normalized (and the
/// resulting markup returned) so later actions query a freshly parsed tree.
/// `external_styles` is the stylesheet text gathered from the source page.
pub fn run_action(
    action: &Action,
    document: &mut Document,
    external_styles: &str,
) -> Result<ActionResult, ActionError> {
    let mut reports = None;
    let message = match action {
        Action::SetAttribute {
            selector,
            attribute,
            value,
        } => {
            for id in document.query(selector)? {
                document.set_attribute(id, attribute, value);
            }
            format!("set {attribute} as {value}")
        }
        Action::RemoveAttribute {
            selector,
            attribute,
        } => {
            let matches = document.query(selector)?;
            for id in &matches {
                document.remove_attribute(*id, attribute);
            }
            format!("remove {attribute} from {} elements", matches.len())
        }
        Action::Replace {
            selector,
            regex,
            replace,
        } => replace_all(document, selector, regex, replace)?,
        Action::ReplaceOrInsert {
            selector,
            regex,
            replace,
        } => replace_or_insert(document, selector, regex, replace)?,
        Action::Insert { selector, value } => {
            let id = require_first(document, selector)?;
            document.append_html(id, value);
            format!("Inserted in {selector}")
        }
        Action::AppendAfter { selector, value } => {
            let id = require_first(document, selector)?;
            document.insert_html_after(id, value);
            "Dom appended".to_string()
        }
        Action::Move {
            selector,
            dest_selector,
        } => {
            let matches = require_matches(document, selector)?;
            let dest = require_first(document, dest_selector)?;
            let mut moved = String::new();
            for id in &matches {
                moved.push_str(&document.outer_html(*id));
                moved.push('\n');
                document.detach(*id);
            }
            document.append_html(dest, &moved);
            format!("Moved {} elements", matches.len())
        }
        Action::MergeContent {
            selector,
            dest_selector,
        } => {
            let matches = require_matches(document, selector)?;
            let dest = require_first(document, dest_selector)?;
            let mut merged = String::new();
            for id in &matches {
                merged.push_str(&document.inner_html(*id));
                merged.push('\n');
                document.detach(*id);
            }
            let first = matches[0];
            document.set_inner_html(first, &merged);
            let markup = document.outer_html(first);
            document.append_html(dest, &markup);
            format!("Merged {} elements", matches.len())
        }
        Action::InlineExternalStyles { selector, minify } => {
            let id = require_first(document, selector)?;
            let styles = if *minify {
                css::minify(external_styles)
            } else {
                external_styles.to_string()
            };
            document.append_element(id, "style", &styles);
            "styles appended".to_string()
        }
        Action::RemoveUnusedStyles {
            selector,
            minify,
            output_css,
        } => {
            let (message, snapshot) = remove_unused_styles(document, selector, *minify)?;
            if *output_css {
                reports = Some(StyleReports {
                    unused: snapshot.unused(),
                    optimized: snapshot.purified,
                });
            }
            message
        }
        Action::CustomFunc { selector } => {
            // Reserved hook: only the match requirement is enforced.
            require_matches(document, selector)?;
            action.kind().to_string()
        }
        Action::Unsupported { kind } => {
            tracing::warn!("{kind} is not supported");
            format!("{kind} is not supported")
        }
    };

    let html = document.normalize();
    let (optimized_styles, unused_styles) = match reports {
        Some(reports) => (Some(reports.optimized), Some(reports.unused)),
        None => (None, None),
    };
    Ok(ActionResult {
        message,
        html,
        optimized_styles,
        unused_styles,
    })
}

fn require_matches(document: &mut Document, selector: &str) -> Result<Vec<NodeId>, ActionError> {
    let matches = document.query(selector)?;
    if matches.is_empty() {
        return Err(ActionError::NoMatch(selector.to_string()));
    }
    Ok(matches)
}

fn require_first(document: &mut Document, selector: &str) -> Result<NodeId, ActionError> {
    document
        .query_one(selector)?
        .ok_or_else(|| ActionError::NoMatch(selector.to_string()))
}

fn compile_regex(pattern: &str) -> Result<Regex, ActionError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| ActionError::InvalidRegex {
            pattern: pattern.to_string(),
            source,
        })
}

fn replace_all(
    document: &mut Document,
    selector: &str,
    pattern: &str,
    replace: &str,
) -> Result<String, ActionError> {
    let matches = require_matches(document, selector)?;
    let regex = compile_regex(pattern)?;
    let replacement = expand_replacement(replace, regex.captures_len());
    let mut replaced = 0;
    for id in matches {
        let inner = document.inner_html(id);
        let count = regex.find_iter(&inner).count();
        if count > 0 {
            let updated = regex.replace_all(&inner, replacement.as_str());
            document.set_inner_html(id, &updated);
            replaced += count;
        }
    }
    Ok(format!("{replaced} replaced"))
}

fn replace_or_insert(
    document: &mut Document,
    selector: &str,
    pattern: &str,
    replace: &str,
) -> Result<String, ActionError> {
    let id = require_first(document, selector)?;
    let regex = compile_regex(pattern)?;
    let inner = document.inner_html(id);
    if regex.is_match(&inner) {
        let replacement = expand_replacement(replace, regex.captures_len());
        let updated = regex.replace_all(&inner, replacement.as_str());
        document.set_inner_html(id, &updated);
        Ok("Replaced".to_string())
    } else {
        document.append_html(id, replace);
        Ok(format!("Inserted in {selector}"))
    }
}

fn remove_unused_styles(
    document: &mut Document,
    selector: &str,
    minify: bool,
) -> Result<(String, StyleSnapshot), ActionError> {
    let styles = require_matches(document, selector)?;
    let body = require_first(document, "body")?;
    let mut snapshot = StyleSnapshot::default();
    for id in styles {
        let old = document.inner_html(id);
        // Re-format first so malformed input reaches the purifier as clean rules.
        let cleaned = css::beautify(&old);
        let purified = css::purify(&document.inner_html(body), &cleaned, minify);
        document.set_text(id, &purified);
        snapshot.record(&old, &purified);
    }
    let message = format!(
        "Removed {}% styles. ({} -> {} bytes)",
        snapshot.ratio(),
        snapshot.old_size(),
        snapshot.new_size()
    );
    Ok((message, snapshot))
}

/// Translate a `$1` / `$&` / `$$` replacement string into the regex crate's
/// `${1}` syntax. `$n` references to groups the pattern does not have stay
/// literal, and `$12` means group 12 only when that group exists.
pub(crate) fn expand_replacement(replace: &str, captures_len: usize) -> String {
    let chars: Vec<char> = replace.chars().collect();
    let mut out = String::with_capacity(replace.len());
    let mut pos = 0;
    while pos < chars.len() {
        let ch = chars[pos];
        pos += 1;
        if ch != '$' {
            out.push(ch);
            continue;
        }
        match chars.get(pos).copied() {
            Some('$') => {
                out.push_str("$$");
                pos += 1;
            }
            Some('&') => {
                out.push_str("${0}");
                pos += 1;
            }
            Some('<') => match chars[pos..].iter().position(|c| *c == '>') {
                Some(close) => {
                    let name: String = chars[pos + 1..pos + close].iter().collect();
                    out.push_str(&format!("${{{name}}}"));
                    pos += close + 1;
                }
                None => out.push_str("$$"),
            },
            Some(first) if first.is_ascii_digit() => {
                let one = first.to_digit(10).unwrap_or(0) as usize;
                let two = chars
                    .get(pos + 1)
                    .and_then(|second| second.to_digit(10))
                    .map(|second| one * 10 + second as usize);
                match two {
                    Some(group) if (1..captures_len).contains(&group) => {
                        out.push_str(&format!("${{{group}}}"));
                        pos += 2;
                    }
                    _ if (1..captures_len).contains(&one) => {
                        out.push_str(&format!("${{{one}}}"));
                        pos += 1;
                    }
                    _ => out.push_str("$$"),
                }
            }
            _ => out.push_str("$$"),
        }
    }
    out
}
