//! CSS rule-tree parser per [§ 5 Parsing](https://www.w3.org/TR/css-syntax-3/#parsing).
//!
//! Produces style rules, grouping at-rules (`@media`, `@supports`, ...) with
//! their child rules, and opaque at-rules. Selector text and declaration
//! values are kept as author text (comments dropped, whitespace collapsed),
//! so escaped selectors survive parsing unchanged.

use crate::tokenizer::{Token, TokenKind, tokenize};

/// [§ 5.4.6 Consume a declaration](https://www.w3.org/TR/css-syntax-3/#consume-declaration)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Property name, ASCII-lowercased (custom properties keep their case).
    pub name: String,
    /// Value as written, without `!important`.
    pub value: String,
    /// Whether the declaration carried `!important`.
    pub important: bool,
}

/// [§ 5.4.3 Consume a qualified rule](https://www.w3.org/TR/css-syntax-3/#consume-qualified-rule)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRule {
    /// The selector list as written.
    pub selector_text: String,
    /// Declarations in source order.
    pub declarations: Vec<Declaration>,
}

/// An at-rule whose block holds further rules.
///
/// [CSS Conditional Rules § 2](https://www.w3.org/TR/css-conditional-3/#processing)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRule {
    /// At-keyword name, lowercased (`media`, `supports`, ...).
    pub name: String,
    /// Prelude text (e.g. the media query list).
    pub prelude: String,
    /// Child rules.
    pub rules: Vec<Rule>,
}

/// Any other at-rule (`@import`, `@font-face`, `@keyframes`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtRule {
    /// At-keyword name, lowercased.
    pub name: String,
    /// Prelude text.
    pub prelude: String,
}

/// A rule in a stylesheet or grouping rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// A style rule.
    Style(StyleRule),
    /// A grouping at-rule.
    Group(GroupRule),
    /// An at-rule whose contents are not modelled.
    At(AtRule),
}

/// [§ 5.3.3 Parse a stylesheet](https://www.w3.org/TR/css-syntax-3/#parse-stylesheet)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stylesheet {
    /// Top-level rules.
    pub rules: Vec<Rule>,
}

impl Stylesheet {
    /// Visit every style rule, depth first, with the preludes of its
    /// enclosing `@media` rules.
    pub fn for_each_style_rule<'s>(&'s self, mut visit: impl FnMut(&'s StyleRule, &[&'s str])) {
        fn walk<'s>(
            rules: &'s [Rule],
            media: &mut Vec<&'s str>,
            visit: &mut dyn FnMut(&'s StyleRule, &[&'s str]),
        ) {
            for rule in rules {
                match rule {
                    Rule::Style(style) => visit(style, media),
                    Rule::Group(group) => {
                        let is_media = group.name == "media";
                        if is_media {
                            media.push(&group.prelude);
                        }
                        walk(&group.rules, media, visit);
                        if is_media {
                            let _ = media.pop();
                        }
                    }
                    Rule::At(_) => {}
                }
            }
        }
        walk(&self.rules, &mut Vec::new(), &mut visit);
    }
}

/// At-rules whose block is a list of rules.
const GROUPING_AT_RULES: &[&str] = &[
    "media",
    "supports",
    "document",
    "-moz-document",
    "layer",
    "container",
    "scope",
];

/// CSS parser over a token stream that remembers its source text.
pub struct CSSParser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    position: usize,
}

impl<'a> CSSParser<'a> {
    /// Tokenize `source` and create a parser over it.
    #[must_use]
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            tokens: tokenize(source),
            position: 0,
        }
    }

    /// [§ 5.3.3 Parse a stylesheet](https://www.w3.org/TR/css-syntax-3/#parse-stylesheet)
    #[must_use]
    pub fn parse_stylesheet(mut self) -> Stylesheet {
        Stylesheet {
            rules: self.consume_list_of_rules(true),
        }
    }

    /// [§ 5.3.8 Parse a list of declarations](https://www.w3.org/TR/css-syntax-3/#parse-list-of-declarations)
    ///
    /// Used for `style` attributes.
    #[must_use]
    pub fn parse_declaration_list(mut self) -> Vec<Declaration> {
        self.consume_list_of_declarations()
    }

    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.position).map(|t| &t.kind)
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    /// [§ 5.4.1 Consume a list of rules](https://www.w3.org/TR/css-syntax-3/#consume-list-of-rules)
    ///
    /// Nested lists stop at (and consume) the closing `}`.
    fn consume_list_of_rules(&mut self, top_level: bool) -> Vec<Rule> {
        let mut rules = Vec::new();
        loop {
            match self.peek() {
                None => return rules,
                Some(TokenKind::Whitespace) => self.advance(),
                Some(TokenKind::RightBrace) if !top_level => {
                    self.advance();
                    return rules;
                }
                Some(TokenKind::Cdo | TokenKind::Cdc) if top_level => self.advance(),
                Some(TokenKind::AtKeyword(_)) => {
                    if let Some(rule) = self.consume_at_rule() {
                        rules.push(rule);
                    }
                }
                Some(_) => {
                    if let Some(rule) = self.consume_qualified_rule() {
                        rules.push(Rule::Style(rule));
                    }
                }
            }
        }
    }

    /// [§ 5.4.2 Consume an at-rule](https://www.w3.org/TR/css-syntax-3/#consume-at-rule)
    fn consume_at_rule(&mut self) -> Option<Rule> {
        let Some(TokenKind::AtKeyword(name)) = self.peek() else {
            return None;
        };
        let name = name.to_ascii_lowercase();
        self.advance();

        let prelude_start = self.position;
        loop {
            match self.peek() {
                None => {
                    let prelude = self.text_of(prelude_start, self.position);
                    return Some(Rule::At(AtRule { name, prelude }));
                }
                Some(TokenKind::Semicolon) => {
                    let prelude = self.text_of(prelude_start, self.position);
                    self.advance();
                    return Some(Rule::At(AtRule { name, prelude }));
                }
                Some(TokenKind::LeftBrace) => {
                    let prelude = self.text_of(prelude_start, self.position);
                    if GROUPING_AT_RULES.contains(&name.as_str()) {
                        self.advance();
                        let rules = self.consume_list_of_rules(false);
                        return Some(Rule::Group(GroupRule {
                            name,
                            prelude,
                            rules,
                        }));
                    }
                    self.consume_component_value();
                    return Some(Rule::At(AtRule { name, prelude }));
                }
                Some(_) => self.consume_component_value(),
            }
        }
    }

    /// [§ 5.4.3 Consume a qualified rule](https://www.w3.org/TR/css-syntax-3/#consume-qualified-rule)
    fn consume_qualified_rule(&mut self) -> Option<StyleRule> {
        let prelude_start = self.position;
        loop {
            match self.peek() {
                // "This is a parse error. Return nothing."
                None => return None,
                Some(TokenKind::LeftBrace) => {
                    let selector_text = self.text_of(prelude_start, self.position);
                    self.advance();
                    let declarations = self.consume_list_of_declarations();
                    if selector_text.is_empty() {
                        return None;
                    }
                    return Some(StyleRule {
                        selector_text,
                        declarations,
                    });
                }
                Some(_) => self.consume_component_value(),
            }
        }
    }

    /// [§ 5.4.5 Consume a list of declarations](https://www.w3.org/TR/css-syntax-3/#consume-list-of-declarations)
    ///
    /// Stops at (and consumes) a `}` or at end of input.
    fn consume_list_of_declarations(&mut self) -> Vec<Declaration> {
        let mut declarations = Vec::new();
        loop {
            match self.peek() {
                None => return declarations,
                Some(TokenKind::RightBrace) => {
                    self.advance();
                    return declarations;
                }
                Some(TokenKind::Whitespace | TokenKind::Semicolon) => self.advance(),
                Some(TokenKind::AtKeyword(_)) => {
                    let _ = self.consume_at_rule();
                }
                Some(TokenKind::Ident(_)) => {
                    let start = self.position;
                    self.skip_to_declaration_end();
                    if let Some(declaration) = self.declaration_from(start, self.position) {
                        declarations.push(declaration);
                    }
                }
                // "This is a parse error. Reconsume the current input token. As long
                // as the next input token is anything other than a <semicolon-token>
                // or <EOF-token>, consume a component value and throw away the
                // returned value."
                Some(_) => self.skip_to_declaration_end(),
            }
        }
    }

    /// Advance to the next top-level `;` or `}` without consuming it.
    fn skip_to_declaration_end(&mut self) {
        while !matches!(
            self.peek(),
            None | Some(TokenKind::Semicolon | TokenKind::RightBrace)
        ) {
            self.consume_component_value();
        }
    }

    /// [§ 5.4.6 Consume a declaration](https://www.w3.org/TR/css-syntax-3/#consume-declaration)
    fn declaration_from(&self, start: usize, end: usize) -> Option<Declaration> {
        let tokens = &self.tokens[start..end];
        let TokenKind::Ident(name) = &tokens.first()?.kind else {
            return None;
        };

        // "While the next input token is a <whitespace-token>, consume the next
        // input token. If the next input token is anything other than a
        // <colon-token>, this is a parse error. Return nothing."
        let mut i = 1;
        while matches!(tokens.get(i).map(|t| &t.kind), Some(TokenKind::Whitespace)) {
            i += 1;
        }
        if !matches!(tokens.get(i).map(|t| &t.kind), Some(TokenKind::Colon)) {
            return None;
        }
        let value_start = start + i + 1;

        // "If the last two non-<whitespace-token>s in the declaration's value are a
        // <delim-token> with the value "!" followed by an <ident-token> with a
        // value that is an ASCII case-insensitive match for "important", remove
        // them from the declaration's value and set the declaration's important
        // flag to true."
        let significant: Vec<usize> = (value_start..end)
            .filter(|&j| self.tokens[j].kind != TokenKind::Whitespace)
            .collect();
        let mut value_end = end;
        let mut important = false;
        if let [.., bang, last] = significant.as_slice() {
            let is_bang = self.tokens[*bang].kind == TokenKind::Delim('!');
            let is_important = matches!(
                &self.tokens[*last].kind,
                TokenKind::Ident(word) if word.eq_ignore_ascii_case("important")
            );
            if is_bang && is_important {
                important = true;
                value_end = *bang;
            }
        }

        let name = if name.starts_with("--") {
            name.clone()
        } else {
            name.to_ascii_lowercase()
        };
        Some(Declaration {
            name,
            value: self.text_of(value_start, value_end),
            important,
        })
    }

    /// [§ 5.4.7 Consume a component value](https://www.w3.org/TR/css-syntax-3/#consume-component-value)
    ///
    /// Simple blocks and functions are skipped as a whole.
    fn consume_component_value(&mut self) {
        let closer = match self.peek() {
            None => return,
            Some(TokenKind::LeftBrace) => TokenKind::RightBrace,
            Some(TokenKind::LeftBracket) => TokenKind::RightBracket,
            Some(TokenKind::LeftParen | TokenKind::Function(_)) => TokenKind::RightParen,
            Some(_) => {
                self.advance();
                return;
            }
        };
        self.advance();
        loop {
            match self.peek() {
                None => return,
                Some(kind) if *kind == closer => {
                    self.advance();
                    return;
                }
                Some(_) => self.consume_component_value(),
            }
        }
    }

    /// Author text of tokens `start..end`: whitespace runs collapse to one
    /// space, comments are dropped, the result is trimmed.
    fn text_of(&self, start: usize, end: usize) -> String {
        let mut out = String::new();
        for token in &self.tokens[start..end] {
            if token.kind == TokenKind::Whitespace {
                if !out.is_empty() && !out.ends_with(' ') {
                    out.push(' ');
                }
            } else {
                out.push_str(&self.source[token.span.clone()]);
            }
        }
        out.trim_end().to_string()
    }
}

/// Parse a stylesheet from text.
#[must_use]
pub fn parse_stylesheet(source: &str) -> Stylesheet {
    CSSParser::new(source).parse_stylesheet()
}

/// Parse the contents of a `style` attribute.
#[must_use]
pub fn parse_declaration_list(source: &str) -> Vec<Declaration> {
    CSSParser::new(source).parse_declaration_list()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declaration_value_keeps_author_text() {
        let sheet = parse_stylesheet(".a { width : 12.5em ; margin: 0 auto }");
        let Rule::Style(rule) = &sheet.rules[0] else {
            panic!("expected style rule");
        };
        assert_eq!(rule.selector_text, ".a");
        assert_eq!(rule.declarations[0].name, "width");
        assert_eq!(rule.declarations[0].value, "12.5em");
        assert_eq!(rule.declarations[1].value, "0 auto");
    }

    #[test]
    fn test_important_is_stripped() {
        let decls = parse_declaration_list("color: red ! IMPORTANT; width: 10px");
        assert_eq!(decls[0].value, "red");
        assert!(decls[0].important);
        assert!(!decls[1].important);
    }

    #[test]
    fn test_invalid_declaration_is_skipped() {
        let decls = parse_declaration_list("color: red; 12px; width: 3px");
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[1].name, "width");
    }
}
