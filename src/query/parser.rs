//! Recursive-descent grammar producing the concrete syntax tree.
//!
//! ```text
//! Search      := Check(0) EOF
//! Check(k)    := Operand(k) (OP_k Operand(k))*
//! Operand(k)  := Check(k+1)            k < 3
//!              | BasicSearch           k = 3
//! BasicSearch := Unit+
//! Unit        := FIELDSTART Check(0) ')' | '(' Check(0) ')' | SearchToken
//! ```
//!
//! Which slot an operator symbol belongs to comes from the configured
//! precedence order, so the same text can group differently under different
//! configurations.

use crate::config::{Configuration, OperatorKind};
use crate::error::{CompileError, Result};
use crate::query::lexer::{SearchKind, Token, TokenKind, tokenize};
use crate::query::token;

/// Number of precedence slots
pub const LEVELS: usize = 4;

/// Parsed query
#[derive(Debug, Clone, PartialEq)]
pub struct Search {
    pub root: Check,
}

/// One precedence level: a head operand and the same-level operators that follow it
#[derive(Debug, Clone, PartialEq)]
pub struct Check {
    pub level: usize,
    pub head: Operand,
    pub chain: Vec<Link>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub op: OpToken,
    pub operand: Operand,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OpToken {
    pub kind: OperatorKind,
    pub image: String,
    /// Byte offset in the parsed text
    pub start: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Check(Box<Check>),
    Basic(BasicSearch),
}

/// Adjacent units with no operator between them
#[derive(Debug, Clone, PartialEq)]
pub struct BasicSearch {
    pub units: Vec<Unit>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Unit {
    Field(FieldSearch),
    Token(SearchToken),
    Paren(Box<Check>),
}

/// `a,b( ... )`
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSearch {
    pub fields: Vec<String>,
    pub body: Box<Check>,
    /// Source text between the parentheses
    pub raw: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchToken {
    pub kind: SearchKind,
    pub image: String,
    /// Byte offset in the parsed text
    pub start: usize,
}

/// Grammar configured with a precedence order, a set of hidden operators
/// and a nesting limit
#[derive(Debug, Clone)]
pub struct Grammar {
    precedence: [OperatorKind; LEVELS],
    hidden: Vec<OperatorKind>,
    max_nesting: usize,
}

impl Grammar {
    /// Grammar for user input: disabled operators are plain text
    pub fn for_input(config: &Configuration) -> Self {
        Self {
            precedence: config.precedence,
            hidden: OperatorKind::ALL
                .into_iter()
                .filter(|k| config.is_disabled(*k))
                .collect(),
            max_nesting: config.max_nesting,
        }
    }

    /// Grammar for rewritten text: every operator is live. A replacement may
    /// wrap a token in one more group.
    pub fn canonical(config: &Configuration) -> Self {
        Self {
            precedence: config.precedence,
            hidden: Vec::new(),
            max_nesting: config.max_nesting + 1,
        }
    }

    pub fn parse(&self, input: &str) -> Result<Search> {
        let tokens = tokenize(input, &self.hidden)?;
        let mut parser = QueryParser {
            input,
            tokens,
            pos: 0,
            precedence: &self.precedence,
            depth: 0,
            max_nesting: self.max_nesting,
        };
        parser.parse()
    }
}

struct QueryParser<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    precedence: &'a [OperatorKind; LEVELS],
    /// Open parentheses and field searches around the cursor
    depth: usize,
    max_nesting: usize,
}

impl<'a> QueryParser<'a> {
    fn parse(&mut self) -> Result<Search> {
        let root = self.parse_check(0)?;
        let next = self.peek();
        if next.kind != TokenKind::Eof {
            return Err(CompileError::syntax(
                next.start,
                format!("unexpected `{}`", next.image),
            ));
        }
        Ok(Search { root })
    }

    fn parse_check(&mut self, level: usize) -> Result<Check> {
        let head = self.parse_operand(level)?;
        let mut chain = Vec::new();

        while let Some(kind) = self.peek_operator() {
            if self.level_of(kind) != level {
                break;
            }
            let op = self.next();
            let operand = self.parse_operand(level)?;
            chain.push(Link {
                op: OpToken {
                    kind,
                    image: op.image,
                    start: op.start,
                },
                operand,
            });
        }

        Ok(Check { level, head, chain })
    }

    fn parse_operand(&mut self, level: usize) -> Result<Operand> {
        if level + 1 < LEVELS {
            Ok(Operand::Check(Box::new(self.parse_check(level + 1)?)))
        } else {
            Ok(Operand::Basic(self.parse_basic()?))
        }
    }

    fn parse_basic(&mut self) -> Result<BasicSearch> {
        let mut units = Vec::new();
        while self.starts_unit() {
            units.push(self.parse_unit()?);
        }
        if units.is_empty() {
            let next = self.peek();
            let message = match next.kind {
                TokenKind::Eof => "expected a search term at end of query".to_string(),
                _ => format!("expected a search term before `{}`", next.image),
            };
            return Err(CompileError::syntax(next.start, message));
        }
        Ok(BasicSearch { units })
    }

    fn starts_unit(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::LParen | TokenKind::FieldStart(_) | TokenKind::Search(_)
        )
    }

    fn parse_unit(&mut self) -> Result<Unit> {
        let token = self.next();
        match token.kind {
            TokenKind::LParen => {
                self.enter(token.start)?;
                let inner = self.parse_check(0)?;
                self.expect_close(token.start)?;
                self.depth -= 1;
                Ok(Unit::Paren(Box::new(inner)))
            }
            TokenKind::FieldStart(list) => {
                self.enter(token.start)?;
                let body = self.parse_check(0)?;
                let close = self.expect_close(token.start)?;
                self.depth -= 1;
                Ok(Unit::Field(FieldSearch {
                    fields: list.split(',').map(str::to_string).collect(),
                    body: Box::new(body),
                    raw: self.input[token.end..close].trim().to_string(),
                }))
            }
            TokenKind::Search(SearchKind::Term) if self.at_bare_range() => {
                let keyword = self.next().image;
                let hi = self.next().image;
                Ok(Unit::Token(SearchToken {
                    kind: SearchKind::Range,
                    image: format!("{} {} {}", token.image, keyword, hi),
                    start: token.start,
                }))
            }
            TokenKind::Search(kind) => Ok(Unit::Token(SearchToken {
                kind,
                image: token.image,
                start: token.start,
            })),
            _ => Err(CompileError::syntax(
                token.start,
                format!("unexpected `{}`", token.image),
            )),
        }
    }

    /// `low RNG high` without brackets
    fn at_bare_range(&self) -> bool {
        let keyword = self.peek_at(0);
        let hi = self.peek_at(1);
        keyword.kind == TokenKind::Search(SearchKind::Term)
            && token::is_range_keyword(&keyword.image)
            && keyword.image != "TO"
            && hi.kind == TokenKind::Search(SearchKind::Term)
    }

    /// Step into a group opened at `open`
    fn enter(&mut self, open: usize) -> Result<()> {
        if self.depth >= self.max_nesting {
            return Err(CompileError::syntax(open, "query nested too deeply"));
        }
        self.depth += 1;
        Ok(())
    }

    /// Consume `)` and return its start offset
    fn expect_close(&mut self, open: usize) -> Result<usize> {
        let token = self.peek();
        if token.kind == TokenKind::RParen {
            let start = token.start;
            self.next();
            Ok(start)
        } else {
            Err(CompileError::syntax(
                token.start,
                format!("missing `)` for `(` at byte {}", open),
            ))
        }
    }

    fn level_of(&self, kind: OperatorKind) -> usize {
        self.precedence
            .iter()
            .position(|k| *k == kind)
            .unwrap_or(LEVELS - 1)
    }

    fn peek_operator(&self) -> Option<OperatorKind> {
        match self.peek().kind {
            TokenKind::Operator(kind) => Some(kind),
            _ => None,
        }
    }

    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.pos + offset).min(last)]
    }

    fn next(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }
}
