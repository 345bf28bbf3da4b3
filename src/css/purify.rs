use super::format::{render, Format};
use super::parse::{parse_stylesheet, Rule};
use scraper::{Html, Selector};

/// Pseudo-classes that depend only on document structure and can be matched
/// against static markup.
const STRUCTURAL_PSEUDO_CLASSES: &[&str] = &[
    "first-child",
    "last-child",
    "only-child",
    "first-of-type",
    "last-of-type",
    "only-of-type",
    "nth-child",
    "nth-last-child",
    "nth-of-type",
    "nth-last-of-type",
    "not",
    "is",
    "where",
    "has",
    "root",
    "empty",
];

/// Remove style rules whose selectors match nothing in `markup_context`.
///
/// Selectors in a rule's list that match nothing are dropped from the list;
/// group rules left empty are dropped; other at-rules are kept as-is.
pub fn purify(markup_context: &str, css: &str, minify: bool) -> String {
    let context = Html::parse_document(markup_context);
    let kept = retain_used(&context, parse_stylesheet(css));
    let format = if minify {
        Format::Minified
    } else {
        Format::Beautified
    };
    render(&kept, format)
}

fn retain_used(context: &Html, rules: Vec<Rule>) -> Vec<Rule> {
    rules
        .into_iter()
        .filter_map(|rule| match rule {
            Rule::Style {
                selectors,
                declarations,
            } => {
                let selectors: Vec<String> = selectors
                    .into_iter()
                    .filter(|selector| selector_in_use(context, selector))
                    .collect();
                (!selectors.is_empty()).then_some(Rule::Style {
                    selectors,
                    declarations,
                })
            }
            Rule::Group { prelude, rules } => {
                let rules = retain_used(context, rules);
                (!rules.is_empty()).then_some(Rule::Group { prelude, rules })
            }
            at_rule @ Rule::AtRule { .. } => Some(at_rule),
        })
        .collect()
}

/// Whether `selector` matches an element of `context`. Selectors the matcher
/// cannot parse count as used.
pub fn selector_in_use(context: &Html, selector: &str) -> bool {
    let matchable = matchable_selector(selector);
    let matchable = matchable.trim();
    if matchable.is_empty() {
        return true;
    }
    let Ok(parsed) = Selector::parse(matchable) else {
        return true;
    };
    context.select(&parsed).next().is_some()
}

/// Drop pseudo-elements and state pseudo-classes (`:hover`, `::before`, ...)
/// so the rest of the selector can be matched against static markup.
fn matchable_selector(selector: &str) -> String {
    let chars: Vec<char> = selector.chars().collect();
    let mut out = String::with_capacity(selector.len());
    let mut quote: Option<char> = None;
    let mut brackets = 0usize;
    let mut pos = 0;
    while pos < chars.len() {
        let ch = chars[pos];
        if let Some(open) = quote {
            out.push(ch);
            if ch == '\\' && pos + 1 < chars.len() {
                out.push(chars[pos + 1]);
                pos += 1;
            } else if ch == open {
                quote = None;
            }
            pos += 1;
            continue;
        }
        match ch {
            '\\' => {
                // Escaped characters (`.md\:flex`) belong to the identifier.
                out.push(ch);
                if let Some(next) = chars.get(pos + 1) {
                    out.push(*next);
                }
                pos += 2;
                continue;
            }
            '"' | '\'' => quote = Some(ch),
            '[' => brackets += 1,
            ']' => brackets = brackets.saturating_sub(1),
            ':' if brackets == 0 => {
                let end = pseudo_end(&chars, pos);
                let token: String = chars[pos..end].iter().collect();
                if keep_pseudo(&token) {
                    out.push_str(&token);
                }
                pos = end;
                continue;
            }
            _ => {}
        }
        out.push(ch);
        pos += 1;
    }
    out
}

/// End position of the pseudo token starting at `start` (a `:`), including a
/// balanced argument list.
fn pseudo_end(chars: &[char], start: usize) -> usize {
    let mut pos = start;
    while pos < chars.len() && chars[pos] == ':' {
        pos += 1;
    }
    while pos < chars.len() && (chars[pos].is_alphanumeric() || chars[pos] == '-' || chars[pos] == '_')
    {
        pos += 1;
    }
    if pos < chars.len() && chars[pos] == '(' {
        let mut depth = 0usize;
        while pos < chars.len() {
            match chars[pos] {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        return pos + 1;
                    }
                }
                _ => {}
            }
            pos += 1;
        }
    }
    pos
}

fn keep_pseudo(token: &str) -> bool {
    if token.starts_with("::") {
        return false;
    }
    let name = token
        .trim_start_matches(':')
        .split('(')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    STRUCTURAL_PSEUDO_CLASSES.contains(&name.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = "<div class=\"card\"><a href=\"a:b\">x</a><p>one</p><p>two</p></div>";

    #[test]
    fn unused_rules_are_removed() {
        let css = ".card { color: red }\n.missing { color: blue }\np { margin: 0 }";
        assert_eq!(
            purify(BODY, css, true),
            ".card{color:red}p{margin:0}"
        );
    }

    #[test]
    fn selector_lists_keep_only_used_entries() {
        assert_eq!(
            purify(BODY, ".missing, .card > a { color: red }", true),
            ".card > a{color:red}"
        );
    }

    #[test]
    fn state_pseudo_classes_match_on_their_base() {
        let css = "a:hover { color: red }\n.card::before { content: \"\" }\nbutton:focus { outline: 0 }";
        assert_eq!(
            purify(BODY, css, true),
            "a:hover{color:red}.card::before{content:\"\"}"
        );
    }

    #[test]
    fn structural_pseudo_classes_are_matched() {
        let css = "p:first-child { color: red }\np:nth-child(2) { color: blue }";
        assert_eq!(purify(BODY, css, true), "p:nth-child(2){color:blue}");
    }

    #[test]
    fn colons_inside_attribute_selectors_are_preserved() {
        assert_eq!(
            purify(BODY, "a[href=\"a:b\"] { color: red }", true),
            "a[href=\"a:b\"]{color:red}"
        );
    }

    #[test]
    fn empty_groups_are_dropped_and_at_rules_kept() {
        let css = "@media print { .missing { color: red } }\n@media screen { p { color: blue } }\n@font-face { font-family: x }";
        assert_eq!(
            purify(BODY, css, true),
            "@media screen{p{color:blue}}@font-face{font-family:x}"
        );
    }

    #[test]
    fn escaped_colons_are_part_of_the_class_name() {
        let body = "<div class=\"md:flex\"></div>";
        assert_eq!(
            purify(body, ".md\\:flex { display: flex }\n.sm\\:flex { display: flex }", true),
            ".md\\:flex{display:flex}"
        );
    }

    #[test]
    fn escaped_braces_do_not_swallow_later_rules() {
        let body = "<div class=\"a{b\"></div><p class=\"keep\">k</p>";
        let css = ".a\\{b { color: red }\n.keep { color: blue }\n.gone { color: green }";
        assert_eq!(
            purify(body, css, true),
            ".a\\{b{color:red}.keep{color:blue}"
        );
    }

    #[test]
    fn unparseable_selectors_are_kept() {
        assert_eq!(
            purify(BODY, "svg|rect { fill: red }", true),
            "svg|rect{fill:red}"
        );
    }

    #[test]
    fn document_level_selectors_match() {
        assert_eq!(
            purify(BODY, "html, body { margin: 0 }", true),
            "html,body{margin:0}"
        );
    }
}
