//! Lexer for the Qsol surface syntax

use crate::config::OperatorKind;
use crate::error::{CompileError, Result};
use crate::query::token;

/// Kind of literal search token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    MatchAll,
    Quoted,
    BoostedQuoted,
    Range,
    Wildcard,
    Fuzzy,
    BoostedTerm,
    Term,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    LParen,
    RParen,
    /// `name(` or `a,b(`; holds the comma-separated list without the paren
    FieldStart(String),
    Operator(OperatorKind),
    Search(SearchKind),
    Eof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub image: String,
    /// Byte offsets into the input
    pub start: usize,
    pub end: usize,
}

/// Split `input` into tokens. Operators in `hidden` are lexed as escaped
/// term text instead of operators.
pub fn tokenize(input: &str, hidden: &[OperatorKind]) -> Result<Vec<Token>> {
    let mut lexer = Lexer {
        input,
        pos: 0,
        hidden,
    };
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    hidden: &'a [OperatorKind],
}

impl<'a> Lexer<'a> {
    fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();
        let start = self.pos;

        let Some(ch) = self.peek_char() else {
            return Ok(self.token(TokenKind::Eof, start));
        };

        match ch {
            '(' => {
                self.advance();
                Ok(self.token(TokenKind::LParen, start))
            }
            ')' => {
                self.advance();
                Ok(self.token(TokenKind::RParen, start))
            }
            '"' => self.lex_quoted(),
            '[' | '{' => self.lex_range(),
            _ if self.remaining().starts_with("*:*") && self.is_boundary(start + 3) => {
                self.pos += 3;
                Ok(self.token(TokenKind::Search(SearchKind::MatchAll), start))
            }
            _ => {
                if let Some(kind) = self.operator_for(ch) {
                    return self.lex_operator(kind);
                }
                self.lex_word()
            }
        }
    }

    fn operator_for(&self, ch: char) -> Option<OperatorKind> {
        let kind = match ch {
            '|' => OperatorKind::Or,
            '&' => OperatorKind::And,
            '!' => OperatorKind::AndNot,
            '~' => OperatorKind::Proximity,
            _ => return None,
        };
        (!self.hidden.contains(&kind)).then_some(kind)
    }

    fn lex_operator(&mut self, kind: OperatorKind) -> Result<Token> {
        let start = self.pos;
        if kind == OperatorKind::Proximity {
            return self.lex_proximity(start);
        }
        let symbol = kind.symbol();
        self.pos += symbol.len();
        // doubled spellings are aliases
        if self.remaining().starts_with(symbol) {
            self.pos += symbol.len();
        }
        Ok(self.token(TokenKind::Operator(kind), start))
    }

    /// Rest of a proximity operator starting at `start`, which may hold an
    /// `ord`/`pre` prefix
    fn lex_proximity(&mut self, start: usize) -> Result<Token> {
        self.lex_proximity_suffix();
        let token = self.token(TokenKind::Operator(OperatorKind::Proximity), start);
        if token::parse_proximity(&token.image).is_none() {
            return Err(CompileError::syntax(
                start,
                format!("malformed proximity operator `{}`", token.image),
            ));
        }
        Ok(token)
    }

    /// Consumes `~`, digits and an optional `s`/`p` unit
    fn lex_proximity_suffix(&mut self) {
        self.advance();
        while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        if let Some(unit) = self.peek_char() {
            if matches!(unit, 's' | 'S' | 'p' | 'P') && self.is_boundary(self.pos + 1) {
                self.advance();
            }
        }
    }

    fn lex_quoted(&mut self) -> Result<Token> {
        let start = self.pos;
        self.advance();
        loop {
            match self.peek_char() {
                None => return Err(CompileError::syntax(start, "unterminated quote")),
                Some('\\') => {
                    self.advance();
                    self.advance();
                }
                Some('"') => {
                    self.advance();
                    break;
                }
                Some(_) => self.advance(),
            }
        }

        // :slop and ^boost suffixes
        if self.peek_char() == Some(':') {
            let digits = self.count_while(self.pos + 1, |c| c.is_ascii_digit());
            if digits > 0 {
                self.pos += 1 + digits;
            }
        }
        let mut kind = SearchKind::Quoted;
        if self.peek_char() == Some('^') {
            let digits = self.count_while(self.pos + 1, |c| c.is_ascii_digit() || c == '.');
            if digits > 0 {
                self.pos += 1 + digits;
                kind = SearchKind::BoostedQuoted;
            }
        }

        let token = self.token(TokenKind::Search(kind), start);
        if token::parse_quoted(&token.image).is_none() {
            return Err(CompileError::syntax(start, "malformed quoted phrase"));
        }
        Ok(token)
    }

    fn lex_range(&mut self) -> Result<Token> {
        let start = self.pos;
        self.advance();
        loop {
            match self.peek_char() {
                None => return Err(CompileError::syntax(start, "unterminated range")),
                Some('\\') => {
                    self.advance();
                    self.advance();
                }
                Some(']' | '}') => {
                    self.advance();
                    break;
                }
                Some(_) => self.advance(),
            }
        }
        let token = self.token(TokenKind::Search(SearchKind::Range), start);
        if token::parse_range(&token.image).is_none() {
            return Err(CompileError::syntax(
                start,
                "range must look like [low TO high]",
            ));
        }
        Ok(token)
    }

    fn lex_word(&mut self) -> Result<Token> {
        let start = self.pos;
        let mut image = String::new();

        while let Some(ch) = self.peek_char() {
            if ch.is_whitespace() || matches!(ch, '(' | ')' | '"') || self.operator_for(ch).is_some() {
                break;
            }
            if ch == '\\' {
                image.push(ch);
                self.advance();
                if let Some(escaped) = self.peek_char() {
                    image.push(escaped);
                    self.advance();
                }
                continue;
            }
            if matches!(ch, '|' | '&' | '!' | '~') {
                // a hidden operator is literal text
                image.push('\\');
            }
            image.push(ch);
            self.advance();
        }

        if image.is_empty() {
            return Err(CompileError::syntax(start, "unexpected character"));
        }

        // ord~3 / pre~3
        let lower = image.to_ascii_lowercase();
        if (lower == "ord" || lower == "pre") && self.operator_for('~').is_some() && self.peek_char() == Some('~') {
            return self.lex_proximity(start);
        }

        if self.peek_char() == Some('(') && is_field_list(&image) {
            self.advance();
            return Ok(Token {
                kind: TokenKind::FieldStart(image),
                image: self.input[start..self.pos].to_string(),
                start,
                end: self.pos,
            });
        }

        let kind = if token::is_fuzzy(&image) {
            SearchKind::Fuzzy
        } else if token::split_boost(&image).is_some() {
            SearchKind::BoostedTerm
        } else if token::is_wildcard(&image) {
            SearchKind::Wildcard
        } else {
            SearchKind::Term
        };

        Ok(Token {
            kind: TokenKind::Search(kind),
            image,
            start,
            end: self.pos,
        })
    }

    fn token(&self, kind: TokenKind, start: usize) -> Token {
        Token {
            kind,
            image: self.input[start..self.pos].to_string(),
            start,
            end: self.pos,
        }
    }

    fn is_boundary(&self, at: usize) -> bool {
        match self.input.get(at..).and_then(|rest| rest.chars().next()) {
            None => true,
            Some(c) => c.is_whitespace() || c == ')' || c == '(',
        }
    }

    /// Bytes matching `pred` starting at `from`
    fn count_while(&self, from: usize, pred: impl Fn(char) -> bool) -> usize {
        self.input
            .get(from..)
            .map(|rest| rest.chars().take_while(|c| pred(*c)).map(char::len_utf8).sum())
            .unwrap_or(0)
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(ch) = self.peek_char() {
            self.pos += ch.len_utf8();
        }
    }

    fn remaining(&self) -> &str {
        &self.input[self.pos..]
    }
}

/// `name` or `name1,name2` where names are identifier-like
fn is_field_list(text: &str) -> bool {
    text.split(',').all(|name| {
        let mut chars = name.chars();
        chars.next().is_some_and(|c| c.is_alphabetic() || c == '_')
            && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '-'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input, &[])
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("a & b|c"),
            vec![
                TokenKind::Search(SearchKind::Term),
                TokenKind::Operator(OperatorKind::And),
                TokenKind::Search(SearchKind::Term),
                TokenKind::Operator(OperatorKind::Or),
                TokenKind::Search(SearchKind::Term),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_doubled_operator_is_one_token() {
        let tokens = tokenize("a && b", &[]).unwrap();
        assert_eq!(tokens[1].kind, TokenKind::Operator(OperatorKind::And));
        assert_eq!(tokens[1].image, "&&");
        assert_eq!(tokens.len(), 4);
    }

    #[test]
    fn test_proximity_images() {
        let tokens = tokenize("a ord~3p b ~ c ~5s", &[]).unwrap();
        assert_eq!(tokens[1].image, "ord~3p");
        assert_eq!(tokens[3].image, "~");
        assert_eq!(tokens[5].image, "~5s");
        assert_eq!(tokens[5].kind, TokenKind::Operator(OperatorKind::Proximity));
    }

    #[test]
    fn test_proximity_distance_overflow() {
        assert_eq!(
            tokenize("aaa bbb ~99999999999 c", &[]).unwrap_err(),
            CompileError::syntax(8, "malformed proximity operator `~99999999999`")
        );
        assert!(matches!(
            tokenize("a ord~99999999999 b", &[]),
            Err(CompileError::Syntax { position: 2, .. })
        ));
        // hidden proximity is plain text
        assert!(tokenize("a ~99999999999 b", &[OperatorKind::Proximity]).is_ok());
    }

    #[test]
    fn test_word_followed_by_unit_letter_is_not_consumed() {
        let tokens = tokenize("a ~3 sun", &[]).unwrap();
        assert_eq!(tokens[1].image, "~3");
        assert_eq!(tokens[2].image, "sun");
    }

    #[test]
    fn test_field_start() {
        let tokens = tokenize("title,body(x)", &[]).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::FieldStart("title,body".into()));
        assert_eq!(tokens[1].image, "x");
        assert_eq!(tokens[2].kind, TokenKind::RParen);
    }

    #[test]
    fn test_search_kinds() {
        assert_eq!(kinds("*:*")[0], TokenKind::Search(SearchKind::MatchAll));
        assert_eq!(kinds("\"a b\":2")[0], TokenKind::Search(SearchKind::Quoted));
        assert_eq!(kinds("\"a b\"^2")[0], TokenKind::Search(SearchKind::BoostedQuoted));
        assert_eq!(kinds("[1 TO 2]")[0], TokenKind::Search(SearchKind::Range));
        assert_eq!(kinds("f*x")[0], TokenKind::Search(SearchKind::Wildcard));
        assert_eq!(kinds("fox`")[0], TokenKind::Search(SearchKind::Fuzzy));
        assert_eq!(kinds("fox^3")[0], TokenKind::Search(SearchKind::BoostedTerm));
        assert_eq!(kinds("date:1982")[0], TokenKind::Search(SearchKind::Term));
    }

    #[test]
    fn test_escapes_stay_in_image() {
        let tokens = tokenize(r"m\&m's a\(b", &[]).unwrap();
        assert_eq!(tokens[0].image, r"m\&m's");
        assert_eq!(tokens[1].image, r"a\(b");
    }

    #[test]
    fn test_hidden_operator_becomes_text() {
        let tokens = tokenize("a & b", &[OperatorKind::And]).unwrap();
        assert_eq!(tokens[1].kind, TokenKind::Search(SearchKind::Term));
        assert_eq!(tokens[1].image, r"\&");
    }

    #[test]
    fn test_unterminated() {
        assert!(matches!(tokenize("\"abc", &[]), Err(CompileError::Syntax { position: 0, .. })));
        assert!(matches!(tokenize("x [1 TO 2", &[]), Err(CompileError::Syntax { position: 2, .. })));
    }
}
