//! CSS tokenizer per [§ 4 Tokenization](https://www.w3.org/TR/css-syntax-3/#tokenization).
//!
//! Every token records the byte span it was consumed from. The parser uses
//! those spans to hand selector text and declaration values back to callers
//! exactly as the author wrote them, escapes included.

use core::ops::Range;

/// [§ 4.2 Definitions](https://www.w3.org/TR/css-syntax-3/#token-diagrams)
///
/// Token kinds. Numeric tokens keep only their value; the raw spelling is
/// always recoverable from the span.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// "`<ident-token>`" with escapes resolved.
    Ident(String),
    /// "`<function-token>`": the name, without the `(`.
    Function(String),
    /// "`<at-keyword-token>`": the name, without the `@`.
    AtKeyword(String),
    /// "`<hash-token>`": the value, without the `#`.
    Hash(String),
    /// "`<string-token>`" with quotes removed.
    String(String),
    /// "`<bad-string-token>`"
    BadString,
    /// "`<url-token>`"
    Url(String),
    /// "`<bad-url-token>`"
    BadUrl,
    /// "`<delim-token>`"
    Delim(char),
    /// "`<number-token>`"
    Number(f64),
    /// "`<percentage-token>`"
    Percentage(f64),
    /// "`<dimension-token>`"
    Dimension {
        /// "a numeric value"
        value: f64,
        /// "a unit", with escapes resolved.
        unit: String,
    },
    /// "`<whitespace-token>`"
    Whitespace,
    /// "`<CDO-token>`" (`<!--`)
    Cdo,
    /// "`<CDC-token>`" (`-->`)
    Cdc,
    /// "`<colon-token>`"
    Colon,
    /// "`<semicolon-token>`"
    Semicolon,
    /// "`<comma-token>`"
    Comma,
    /// `<[-token>`
    LeftBracket,
    /// `<]-token>`
    RightBracket,
    /// `<(-token>`
    LeftParen,
    /// `<)-token>`
    RightParen,
    /// `<{-token>`
    LeftBrace,
    /// `<}-token>`
    RightBrace,
}

/// A token together with the byte range of the source it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// What was consumed.
    pub kind: TokenKind,
    /// Byte range in the tokenized source.
    pub span: Range<usize>,
}

/// [§ 4.3 Tokenizer Algorithms](https://www.w3.org/TR/css-syntax-3/#tokenizer-algorithms)
pub struct CSSTokenizer<'a> {
    source: &'a str,
    /// Code points with their byte offsets.
    input: Vec<(usize, char)>,
    position: usize,
}

impl<'a> CSSTokenizer<'a> {
    /// Create a tokenizer over `source`.
    #[must_use]
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            input: source.char_indices().collect(),
            position: 0,
        }
    }

    /// Consume the whole input and return its tokens. EOF is implicit.
    #[must_use]
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            // "Consume comments."
            self.consume_comments();
            let start = self.offset();
            let Some(kind) = self.consume_token() else {
                return tokens;
            };
            tokens.push(Token {
                kind,
                span: start..self.offset(),
            });
        }
    }

    /// The source text this tokenizer reads.
    #[must_use]
    pub const fn source(&self) -> &'a str {
        self.source
    }

    fn offset(&self) -> usize {
        self.input
            .get(self.position)
            .map_or(self.source.len(), |&(offset, _)| offset)
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).map(|&(_, c)| c)
    }

    fn peek(&self) -> Option<char> {
        self.peek_at(0)
    }

    fn consume(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.position += 1;
        Some(c)
    }

    const fn reconsume(&mut self) {
        self.position -= 1;
    }

    /// [§ 4.3.2 Consume comments](https://www.w3.org/TR/css-syntax-3/#consume-comments)
    fn consume_comments(&mut self) {
        while self.peek() == Some('/') && self.peek_at(1) == Some('*') {
            self.position += 2;
            loop {
                match self.consume() {
                    None => return,
                    Some('*') if self.peek() == Some('/') => {
                        self.position += 1;
                        break;
                    }
                    Some(_) => {}
                }
            }
        }
    }

    /// [§ 4.3.1 Consume a token](https://www.w3.org/TR/css-syntax-3/#consume-token)
    fn consume_token(&mut self) -> Option<TokenKind> {
        let c = self.consume()?;
        let kind = match c {
            c if is_whitespace(c) => {
                while self.peek().is_some_and(is_whitespace) {
                    self.position += 1;
                }
                TokenKind::Whitespace
            }
            '"' | '\'' => self.consume_string_token(c),
            '#' => {
                if self.peek().is_some_and(is_ident_code_point)
                    || is_valid_escape(self.peek(), self.peek_at(1))
                {
                    TokenKind::Hash(self.consume_ident_sequence())
                } else {
                    TokenKind::Delim('#')
                }
            }
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '+' | '.' => {
                if self.would_start_number(Some(c)) {
                    self.reconsume();
                    self.consume_numeric_token()
                } else {
                    TokenKind::Delim(c)
                }
            }
            ',' => TokenKind::Comma,
            '-' => {
                if self.would_start_number(Some('-')) {
                    self.reconsume();
                    self.consume_numeric_token()
                } else if self.peek() == Some('-') && self.peek_at(1) == Some('>') {
                    self.position += 2;
                    TokenKind::Cdc
                } else if would_start_ident(Some('-'), self.peek(), self.peek_at(1)) {
                    self.reconsume();
                    self.consume_ident_like_token()
                } else {
                    TokenKind::Delim('-')
                }
            }
            ':' => TokenKind::Colon,
            ';' => TokenKind::Semicolon,
            '<' => {
                if self.peek() == Some('!')
                    && self.peek_at(1) == Some('-')
                    && self.peek_at(2) == Some('-')
                {
                    self.position += 3;
                    TokenKind::Cdo
                } else {
                    TokenKind::Delim('<')
                }
            }
            '@' => {
                if would_start_ident(self.peek(), self.peek_at(1), self.peek_at(2)) {
                    TokenKind::AtKeyword(self.consume_ident_sequence())
                } else {
                    TokenKind::Delim('@')
                }
            }
            '[' => TokenKind::LeftBracket,
            '\\' => {
                if is_valid_escape(Some('\\'), self.peek()) {
                    self.reconsume();
                    self.consume_ident_like_token()
                } else {
                    TokenKind::Delim('\\')
                }
            }
            ']' => TokenKind::RightBracket,
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            c if c.is_ascii_digit() => {
                self.reconsume();
                self.consume_numeric_token()
            }
            c if is_ident_start_code_point(c) => {
                self.reconsume();
                self.consume_ident_like_token()
            }
            c => TokenKind::Delim(c),
        };
        Some(kind)
    }

    /// [§ 4.3.5 Consume a string token](https://www.w3.org/TR/css-syntax-3/#consume-string-token)
    fn consume_string_token(&mut self, ending: char) -> TokenKind {
        let mut value = String::new();
        loop {
            match self.consume() {
                None => return TokenKind::String(value),
                Some(c) if c == ending => return TokenKind::String(value),
                Some('\n') => {
                    // "This is a parse error. Reconsume the current input code
                    // point, create a <bad-string-token>, and return it."
                    self.reconsume();
                    return TokenKind::BadString;
                }
                Some('\\') => match self.peek() {
                    None => {}
                    Some('\n') => self.position += 1,
                    Some(_) => value.push(self.consume_escaped_code_point()),
                },
                Some(c) => value.push(c),
            }
        }
    }

    /// [§ 4.3.4 Consume an ident-like token](https://www.w3.org/TR/css-syntax-3/#consume-ident-like-token)
    fn consume_ident_like_token(&mut self) -> TokenKind {
        let name = self.consume_ident_sequence();
        if self.peek() != Some('(') {
            return TokenKind::Ident(name);
        }
        self.position += 1;
        if name.eq_ignore_ascii_case("url") {
            let mut lookahead = 0;
            while self.peek_at(lookahead).is_some_and(is_whitespace) {
                lookahead += 1;
            }
            if !matches!(self.peek_at(lookahead), Some('"' | '\'')) {
                return self.consume_url_token();
            }
        }
        TokenKind::Function(name)
    }

    /// [§ 4.3.6 Consume a url token](https://www.w3.org/TR/css-syntax-3/#consume-url-token)
    fn consume_url_token(&mut self) -> TokenKind {
        let mut value = String::new();
        while self.peek().is_some_and(is_whitespace) {
            self.position += 1;
        }
        loop {
            match self.consume() {
                None | Some(')') => return TokenKind::Url(value),
                Some(c) if is_whitespace(c) => {
                    while self.peek().is_some_and(is_whitespace) {
                        self.position += 1;
                    }
                    if matches!(self.peek(), None | Some(')')) {
                        let _ = self.consume();
                        return TokenKind::Url(value);
                    }
                    self.consume_bad_url_remnants();
                    return TokenKind::BadUrl;
                }
                Some('"' | '\'' | '(') => {
                    self.consume_bad_url_remnants();
                    return TokenKind::BadUrl;
                }
                Some('\\') => {
                    if is_valid_escape(Some('\\'), self.peek()) {
                        value.push(self.consume_escaped_code_point());
                    } else {
                        self.consume_bad_url_remnants();
                        return TokenKind::BadUrl;
                    }
                }
                Some(c) => value.push(c),
            }
        }
    }

    /// [§ 4.3.14 Consume the remnants of a bad url](https://www.w3.org/TR/css-syntax-3/#consume-remnants-of-bad-url)
    fn consume_bad_url_remnants(&mut self) {
        loop {
            match self.consume() {
                None | Some(')') => return,
                Some('\\') if is_valid_escape(Some('\\'), self.peek()) => {
                    let _ = self.consume_escaped_code_point();
                }
                Some(_) => {}
            }
        }
    }

    /// [§ 4.3.3 Consume a numeric token](https://www.w3.org/TR/css-syntax-3/#consume-numeric-token)
    fn consume_numeric_token(&mut self) -> TokenKind {
        let value = self.consume_number();
        if would_start_ident(self.peek(), self.peek_at(1), self.peek_at(2)) {
            let unit = self.consume_ident_sequence();
            TokenKind::Dimension { value, unit }
        } else if self.peek() == Some('%') {
            self.position += 1;
            TokenKind::Percentage(value)
        } else {
            TokenKind::Number(value)
        }
    }

    /// [§ 4.3.12 Consume a number](https://www.w3.org/TR/css-syntax-3/#consume-number)
    fn consume_number(&mut self) -> f64 {
        let mut repr = String::new();
        if let Some(sign @ ('+' | '-')) = self.peek() {
            repr.push(sign);
            self.position += 1;
        }
        self.consume_digits(&mut repr);
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            repr.push('.');
            self.position += 1;
            self.consume_digits(&mut repr);
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let signed = matches!(self.peek_at(1), Some('+' | '-'));
            let digit_at = if signed { 2 } else { 1 };
            if self.peek_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                for _ in 0..digit_at {
                    if let Some(c) = self.consume() {
                        repr.push(c);
                    }
                }
                self.consume_digits(&mut repr);
            }
        }
        repr.parse().unwrap_or(0.0)
    }

    fn consume_digits(&mut self, repr: &mut String) {
        while let Some(c) = self.peek().filter(char::is_ascii_digit) {
            repr.push(c);
            self.position += 1;
        }
    }

    /// [§ 4.3.11 Consume an ident sequence](https://www.w3.org/TR/css-syntax-3/#consume-name)
    fn consume_ident_sequence(&mut self) -> String {
        let mut result = String::new();
        loop {
            match self.peek() {
                Some(c) if is_ident_code_point(c) => {
                    result.push(c);
                    self.position += 1;
                }
                Some('\\') if is_valid_escape(Some('\\'), self.peek_at(1)) => {
                    self.position += 1;
                    result.push(self.consume_escaped_code_point());
                }
                _ => return result,
            }
        }
    }

    /// [§ 4.3.7 Consume an escaped code point](https://www.w3.org/TR/css-syntax-3/#consume-escaped-code-point)
    ///
    /// Assumes the backslash has already been consumed.
    fn consume_escaped_code_point(&mut self) -> char {
        let Some(c) = self.consume() else {
            return char::REPLACEMENT_CHARACTER;
        };
        if !c.is_ascii_hexdigit() {
            return c;
        }
        let mut hex = String::from(c);
        while hex.len() < 6 {
            match self.peek() {
                Some(h) if h.is_ascii_hexdigit() => {
                    hex.push(h);
                    self.position += 1;
                }
                _ => break,
            }
        }
        if self.peek().is_some_and(is_whitespace) {
            self.position += 1;
        }
        u32::from_str_radix(&hex, 16)
            .ok()
            .filter(|&n| n != 0)
            .and_then(char::from_u32)
            .unwrap_or(char::REPLACEMENT_CHARACTER)
    }

    /// [§ 4.3.10 Check if three code points would start a number](https://www.w3.org/TR/css-syntax-3/#starts-with-a-number)
    ///
    /// `first` is the code point just consumed; the next two are peeked.
    fn would_start_number(&self, first: Option<char>) -> bool {
        let second = self.peek();
        let third = self.peek_at(1);
        match first {
            Some('+' | '-') => {
                second.is_some_and(|c| c.is_ascii_digit())
                    || (second == Some('.') && third.is_some_and(|c| c.is_ascii_digit()))
            }
            Some('.') => second.is_some_and(|c| c.is_ascii_digit()),
            Some(c) => c.is_ascii_digit(),
            None => false,
        }
    }
}

/// Tokenize `source` in one call.
#[must_use]
pub fn tokenize(source: &str) -> Vec<Token> {
    CSSTokenizer::new(source).tokenize()
}

/// [§ 4.2 whitespace](https://www.w3.org/TR/css-syntax-3/#whitespace)
const fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0C')
}

/// [§ 4.2 ident-start code point](https://www.w3.org/TR/css-syntax-3/#ident-start-code-point)
pub(crate) const fn is_ident_start_code_point(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || !c.is_ascii()
}

/// [§ 4.2 ident code point](https://www.w3.org/TR/css-syntax-3/#ident-code-point)
pub(crate) const fn is_ident_code_point(c: char) -> bool {
    is_ident_start_code_point(c) || c.is_ascii_digit() || c == '-'
}

/// [§ 4.3.8 Check if two code points are a valid escape](https://www.w3.org/TR/css-syntax-3/#starts-with-a-valid-escape)
fn is_valid_escape(first: Option<char>, second: Option<char>) -> bool {
    first == Some('\\') && second.is_some_and(|c| c != '\n')
}

/// [§ 4.3.9 Check if three code points would start an ident sequence](https://www.w3.org/TR/css-syntax-3/#would-start-an-identifier)
fn would_start_ident(first: Option<char>, second: Option<char>, third: Option<char>) -> bool {
    match first {
        Some('-') => {
            second.is_some_and(|c| is_ident_start_code_point(c) || c == '-')
                || is_valid_escape(second, third)
        }
        Some('\\') => is_valid_escape(first, second),
        Some(c) => is_ident_start_code_point(c),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_escaped_ident_keeps_raw_span() {
        let source = r".\:container\(min-width\:300px\)";
        let tokens = tokenize(source);
        assert_eq!(tokens[0].kind, TokenKind::Delim('.'));
        assert_eq!(
            tokens[1].kind,
            TokenKind::Ident(":container(min-width:300px)".to_string())
        );
        assert_eq!(&source[tokens[1].span.clone()], &source[1..]);
    }

    #[test]
    fn test_dimension_and_percentage() {
        assert_eq!(
            kinds("12.5em 50%"),
            vec![
                TokenKind::Dimension {
                    value: 12.5,
                    unit: "em".to_string()
                },
                TokenKind::Whitespace,
                TokenKind::Percentage(50.0),
            ]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            kinds("a/* x */{}"),
            vec![
                TokenKind::Ident("a".to_string()),
                TokenKind::LeftBrace,
                TokenKind::RightBrace
            ]
        );
    }

    #[test]
    fn test_unquoted_url() {
        assert_eq!(
            kinds("url( img/a.png )"),
            vec![TokenKind::Url("img/a.png".to_string())]
        );
        assert_eq!(
            kinds("url('a.png')"),
            vec![
                TokenKind::Function("url".to_string()),
                TokenKind::String("a.png".to_string()),
                TokenKind::RightParen
            ]
        );
    }

    #[test]
    fn test_hex_escape_consumes_trailing_space() {
        assert_eq!(kinds(r"\31 0"), vec![TokenKind::Ident("10".to_string())]);
    }
}
