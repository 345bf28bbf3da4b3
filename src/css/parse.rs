//! Stylesheet parsing on top of `cssparser` tokens.
//!
//! Only the rule structure matters here: selectors, declarations and at-rule
//! blocks. Token text is re-serialized with whitespace collapsed and comments
//! dropped, so escapes survive untouched. Malformed input never fails;
//! unbalanced blocks are closed at end of input and stray tokens dropped.
use cssparser::{ParseError, Parser, ParserInput, ToCss, Token};

/// At-rules whose block holds nested style rules.
const GROUP_AT_RULES: &[&str] = &[
    "media",
    "supports",
    "document",
    "-moz-document",
    "container",
    "layer",
    "scope",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    Style {
        selectors: Vec<String>,
        declarations: Vec<String>,
    },
    /// Conditional group rule (`@media`, `@supports`, ...).
    Group { prelude: String, rules: Vec<Rule> },
    /// Any other at-rule, with its block if it has one.
    AtRule {
        prelude: String,
        block: Option<AtBlock>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AtBlock {
    /// `property:value` entries (`@font-face`, `@page`).
    Declarations(Vec<String>),
    /// Nested blocks (`@keyframes`) kept as whitespace-minimal text.
    Nested(String),
}

/// Parse a stylesheet into rules.
pub fn parse_stylesheet(css: &str) -> Vec<Rule> {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    parse_rules(&mut parser)
}

fn parse_rules(parser: &mut Parser<'_, '_>) -> Vec<Rule> {
    let mut rules = Vec::new();
    loop {
        let token = match parser.next() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };
        let rule = match token {
            // A block with no prelude is skipped by the next `next()`.
            Token::CDO
            | Token::CDC
            | Token::Semicolon
            | Token::CloseCurlyBracket
            | Token::CurlyBracketBlock => None,
            Token::AtKeyword(_) => parse_at_rule(parser, &token),
            _ => parse_style_rule(parser, token),
        };
        rules.extend(rule);
    }
    rules
}

fn parse_style_rule<'i>(parser: &mut Parser<'i, '_>, first: Token<'i>) -> Option<Rule> {
    let mut selectors = Vec::new();
    let mut current = TokenWriter::collapsed();
    let mut token = first;
    loop {
        match token {
            Token::CurlyBracketBlock => break,
            // Recovery: drop the prelude read so far and start over.
            Token::Semicolon | Token::CloseCurlyBracket => return None,
            Token::Comma => selectors.push(current.take()),
            _ => write_token(parser, &token, &mut current),
        }
        token = match parser.next_including_whitespace_and_comments() {
            Ok(next) => next.clone(),
            Err(_) => return None,
        };
    }
    selectors.push(current.take());
    selectors.retain(|selector| !selector.is_empty());
    let declarations = nested(parser, read_declarations).unwrap_or_default();
    if selectors.is_empty() {
        return None;
    }
    Some(Rule::Style {
        selectors,
        declarations,
    })
}

fn parse_at_rule<'i>(parser: &mut Parser<'i, '_>, keyword: &Token<'i>) -> Option<Rule> {
    let Token::AtKeyword(name) = keyword else {
        return None;
    };
    let name = name.to_ascii_lowercase();
    let mut prelude = TokenWriter::collapsed();
    prelude.push(&keyword.to_css_string());
    loop {
        let token = match parser.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };
        match token {
            Token::Semicolon => break,
            Token::CloseCurlyBracket => return None,
            Token::CurlyBracketBlock => {
                let prelude = prelude.take();
                if GROUP_AT_RULES.contains(&name.as_str()) {
                    let rules = nested(parser, parse_rules).unwrap_or_default();
                    return Some(Rule::Group { prelude, rules });
                }
                let block = nested(parser, read_at_block);
                return Some(Rule::AtRule { prelude, block });
            }
            _ => write_token(parser, &token, &mut prelude),
        }
    }
    Some(Rule::AtRule {
        prelude: prelude.take(),
        block: None,
    })
}

fn read_at_block(parser: &mut Parser<'_, '_>) -> AtBlock {
    let start = parser.state();
    let mut has_blocks = false;
    while let Ok(token) = parser.next() {
        if matches!(token, Token::CurlyBracketBlock) {
            has_blocks = true;
            break;
        }
    }
    parser.reset(&start);
    if has_blocks {
        let mut text = TokenWriter::compact();
        write_all(parser, &mut text);
        AtBlock::Nested(text.take())
    } else {
        AtBlock::Declarations(read_declarations(parser))
    }
}

/// Split a block body on top-level `;` into `property:value` entries.
fn read_declarations(parser: &mut Parser<'_, '_>) -> Vec<String> {
    let mut declarations = Vec::new();
    let mut property: Option<String> = None;
    let mut text = TokenWriter::collapsed();
    while let Ok(token) = parser.next_including_whitespace_and_comments() {
        let token = token.clone();
        match token {
            Token::Semicolon => push_declaration(&mut declarations, property.take(), text.take()),
            Token::Colon if property.is_none() => property = Some(text.take()),
            _ => write_token(parser, &token, &mut text),
        }
    }
    push_declaration(&mut declarations, property.take(), text.take());
    declarations
}

fn push_declaration(declarations: &mut Vec<String>, property: Option<String>, value: String) {
    match property {
        Some(property) => declarations.push(format!("{property}:{value}")),
        None if !value.is_empty() => declarations.push(value),
        None => {}
    }
}

/// Run `parse` over the contents of the block whose opening token was just
/// returned by `parser`.
fn nested<'i, T>(
    parser: &mut Parser<'i, '_>,
    parse: impl for<'tt> FnOnce(&mut Parser<'i, 'tt>) -> T,
) -> Option<T> {
    parser
        .parse_nested_block(|block| Ok::<_, ParseError<'i, ()>>(parse(block)))
        .ok()
}

fn write_all(parser: &mut Parser<'_, '_>, writer: &mut TokenWriter) {
    while let Ok(token) = parser.next_including_whitespace_and_comments() {
        let token = token.clone();
        write_token(parser, &token, writer);
    }
}

fn write_token<'i>(parser: &mut Parser<'i, '_>, token: &Token<'i>, writer: &mut TokenWriter) {
    let close = match token {
        Token::WhiteSpace(_) | Token::Comment(_) => {
            writer.space();
            return;
        }
        Token::Function(_) | Token::ParenthesisBlock => ")",
        Token::SquareBracketBlock => "]",
        Token::CurlyBracketBlock => "}",
        _ => {
            writer.push(&token.to_css_string());
            return;
        }
    };
    writer.push(&token.to_css_string());
    nested(parser, |block| write_all(block, writer));
    writer.push(close);
}

/// Accumulates serialized tokens, turning whitespace and comment runs into a
/// single space.
struct TokenWriter {
    out: String,
    pending_space: bool,
    /// Also drop spaces next to `{ } ; ,` and after `:`.
    compact: bool,
}

impl TokenWriter {
    fn collapsed() -> Self {
        Self {
            out: String::new(),
            pending_space: false,
            compact: false,
        }
    }

    fn compact() -> Self {
        Self {
            compact: true,
            ..Self::collapsed()
        }
    }

    fn space(&mut self) {
        self.pending_space = !self.out.is_empty();
    }

    fn push(&mut self, text: &str) {
        if std::mem::take(&mut self.pending_space) {
            let tight = self.compact
                && (self.out.ends_with(['{', '}', ';', ',', ':'])
                    || text.starts_with(['{', '}', ';', ',']));
            if !tight {
                self.out.push(' ');
            }
        }
        self.out.push_str(text);
    }

    fn take(&mut self) -> String {
        self.pending_space = false;
        std::mem::take(&mut self.out)
    }
}
