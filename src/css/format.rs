use super::parse::{AtBlock, Rule};

/// Output layout for rendered rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// No optional whitespace at all.
    Minified,
    /// One declaration per line, two-space indentation.
    Beautified,
    /// One self-contained rule per line; group preludes are repeated on every
    /// nested rule so each line stands alone.
    RulePerLine,
}

pub fn render(rules: &[Rule], format: Format) -> String {
    let mut out = String::new();
    match format {
        Format::Minified => {
            for rule in rules {
                write_minified(rule, &mut out);
            }
        }
        Format::Beautified => {
            for rule in rules {
                write_beautified(rule, 0, &mut out);
            }
        }
        Format::RulePerLine => {
            for rule in rules {
                write_rule_lines(rule, &[], &mut out);
            }
        }
    }
    out
}

fn write_minified(rule: &Rule, out: &mut String) {
    match rule {
        Rule::Style {
            selectors,
            declarations,
        } => {
            out.push_str(&selectors.join(","));
            out.push('{');
            out.push_str(&declarations.join(";"));
            out.push('}');
        }
        Rule::Group { prelude, rules } => {
            out.push_str(prelude);
            out.push('{');
            for nested in rules {
                write_minified(nested, out);
            }
            out.push('}');
        }
        Rule::AtRule { prelude, block } => {
            out.push_str(prelude);
            match block {
                Some(AtBlock::Declarations(declarations)) => {
                    out.push('{');
                    out.push_str(&declarations.join(";"));
                    out.push('}');
                }
                Some(AtBlock::Nested(text)) => {
                    out.push('{');
                    out.push_str(text);
                    out.push('}');
                }
                None => out.push(';'),
            }
        }
    }
}

fn write_beautified(rule: &Rule, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    match rule {
        Rule::Style {
            selectors,
            declarations,
        } => {
            out.push_str(&indent);
            out.push_str(&selectors.join(", "));
            out.push_str(" {\n");
            for declaration in declarations {
                push_declaration_line(&indent, declaration, out);
            }
            out.push_str(&indent);
            out.push_str("}\n");
        }
        Rule::Group { prelude, rules } => {
            out.push_str(&indent);
            out.push_str(prelude);
            out.push_str(" {\n");
            for nested in rules {
                write_beautified(nested, depth + 1, out);
            }
            out.push_str(&indent);
            out.push_str("}\n");
        }
        Rule::AtRule { prelude, block } => {
            out.push_str(&indent);
            out.push_str(prelude);
            match block {
                Some(AtBlock::Declarations(declarations)) => {
                    out.push_str(" {\n");
                    for declaration in declarations {
                        push_declaration_line(&indent, declaration, out);
                    }
                    out.push_str(&indent);
                    out.push_str("}\n");
                }
                Some(AtBlock::Nested(text)) => {
                    out.push_str(" {\n");
                    out.push_str(&indent);
                    out.push_str("  ");
                    out.push_str(text);
                    out.push('\n');
                    out.push_str(&indent);
                    out.push_str("}\n");
                }
                None => out.push_str(";\n"),
            }
        }
    }
}

fn push_declaration_line(indent: &str, declaration: &str, out: &mut String) {
    out.push_str(indent);
    out.push_str("  ");
    match declaration.split_once(':') {
        Some((property, value)) => {
            out.push_str(property.trim());
            out.push_str(": ");
            out.push_str(value.trim());
        }
        None => out.push_str(declaration.trim()),
    }
    out.push_str(";\n");
}

fn write_rule_lines(rule: &Rule, groups: &[&str], out: &mut String) {
    match rule {
        Rule::Group { prelude, rules } => {
            let mut nested_groups = groups.to_vec();
            nested_groups.push(prelude);
            for nested in rules {
                write_rule_lines(nested, &nested_groups, out);
            }
        }
        _ => {
            for prelude in groups {
                out.push_str(prelude);
                out.push('{');
            }
            write_minified(rule, out);
            for _ in groups {
                out.push('}');
            }
            out.push('\n');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::parse::parse_stylesheet;
    use super::*;

    const SHEET: &str = "@media screen { .a, .b { color: red; margin: 0 } }\n.c { padding: 1px }\n@font-face { font-family: x; src: url(x.woff) }";

    #[test]
    fn minified_output_has_no_optional_whitespace() {
        let rules = parse_stylesheet(SHEET);
        assert_eq!(
            render(&rules, Format::Minified),
            "@media screen{.a,.b{color:red;margin:0}}.c{padding:1px}@font-face{font-family:x;src:url(x.woff)}"
        );
    }

    #[test]
    fn beautified_output_indents_declarations() {
        let rules = parse_stylesheet(".c { padding: 1px; color:blue }");
        assert_eq!(
            render(&rules, Format::Beautified),
            ".c {\n  padding: 1px;\n  color: blue;\n}\n"
        );
    }

    #[test]
    fn at_rule_blocks_render_per_kind() {
        let rules = parse_stylesheet("@page { margin: 1cm }\n@keyframes k { to { opacity: 1 } }");
        assert_eq!(
            render(&rules, Format::Beautified),
            "@page {\n  margin: 1cm;\n}\n@keyframes k {\n  to{opacity:1}\n}\n"
        );
    }

    #[test]
    fn rule_per_line_repeats_group_preludes() {
        let rules = parse_stylesheet("@media screen { .a { color: red } .b { color: blue } }");
        assert_eq!(
            render(&rules, Format::RulePerLine),
            "@media screen{.a{color:red}}\n@media screen{.b{color:blue}}\n"
        );
    }
}
