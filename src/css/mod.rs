//! Style optimization: minify, purify against markup, and report what was
//! dropped.
//!
//! All entry points accept arbitrary text. Malformed stylesheets are parsed
//! leniently rather than rejected, so an optimization pass can never fail an
//! action.
mod diff;
mod format;
mod parse;
mod purify;

pub use diff::diff_unused;
use format::Format;
pub use purify::purify;

/// Minify a stylesheet.
pub fn minify(css: &str) -> String {
    format::render(&parse::parse_stylesheet(css), Format::Minified)
}

/// Re-format a stylesheet with one declaration per line.
pub fn beautify(css: &str) -> String {
    format::render(&parse::parse_stylesheet(css), Format::Beautified)
}

/// Percentage of `old_size` removed, rounded half up.
///
/// An empty original reports `0` rather than dividing by zero.
pub fn compression_ratio(old_size: usize, new_size: usize) -> i64 {
    if old_size == 0 {
        return 0;
    }
    let removed = (old_size as i128 - new_size as i128) * 100;
    let old_size = old_size as i128;
    // floor(removed / old_size + 1/2) without float error
    (2 * removed + old_size).div_euclid(2 * old_size) as i64
}

/// Accumulated style text before and after purification for one action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleSnapshot {
    pub old: String,
    pub purified: String,
}

impl StyleSnapshot {
    /// Record one style block. Purified blocks are separated by a blank line.
    pub fn record(&mut self, old: &str, purified: &str) {
        self.old.push_str(old);
        self.purified.push_str("\n\n");
        self.purified.push_str(purified);
    }

    /// Sizes are counted in UTF-16 code units, the unit the size report has
    /// always used.
    pub fn old_size(&self) -> usize {
        self.old.encode_utf16().count()
    }

    pub fn new_size(&self) -> usize {
        self.purified.encode_utf16().count()
    }

    pub fn ratio(&self) -> i64 {
        compression_ratio(self.old_size(), self.new_size())
    }

    /// Rules present in the original text but not in the purified text.
    pub fn unused(&self) -> String {
        diff_unused(&self.purified, &self.old)
    }
}
