use super::format::{render, Format};
use super::parse::parse_stylesheet;
use similar::{ChangeTag, TextDiff};

/// Rules of `original` that did not survive into `purified`, beautified.
///
/// Both sides are first rendered one rule per line, which makes the line
/// diff insensitive to whitespace and layout. Lines present only on the
/// original side are the unused rules, including rules whose selector list
/// was shortened.
pub fn diff_unused(purified: &str, original: &str) -> String {
    let purified_lines = render(&parse_stylesheet(purified), Format::RulePerLine);
    let original_lines = render(&parse_stylesheet(original), Format::RulePerLine);
    let diff = TextDiff::from_lines(purified_lines.as_str(), original_lines.as_str());
    let mut unused = String::new();
    for change in diff.iter_all_changes() {
        if change.tag() == ChangeTag::Insert {
            unused.push_str(change.value());
        }
    }
    render(&parse_stylesheet(&unused), Format::Beautified)
}
