//! EBNF source text → [`Grammar`].
//!
//! Wirth-style notation with two extensions: `<body / separator>` for
//! one-or-more repetition and an optional quoted title and comment around a
//! braced production list.

use crate::ir::{Grammar, NodeId};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\A\s+").unwrap());
static COMMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\A\(\*(?s:.*?)\*\)").unwrap());
static IDENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\A[A-Za-z_][A-Za-z0-9_\-]*").unwrap());
static DOUBLE_QUOTED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"\A"([^"\n]*)""#).unwrap());
static SINGLE_QUOTED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\A'([^'\n]*)'").unwrap());
static SPECIAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\A\?([^?]*)\?").unwrap());

const SYMBOLS: &str = "=.;|[]{}()<>/";

pub const DEFAULT_MAX_DEPTH: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("{line}:{column}: unexpected character '{found}'")]
    UnexpectedChar {
        found: char,
        line: usize,
        column: usize,
    },
    #[error("{line}:{column}: unterminated literal")]
    UnterminatedLiteral { line: usize, column: usize },
    #[error("{line}:{column}: unterminated comment")]
    UnterminatedComment { line: usize, column: usize },
    #[error("{line}:{column}: expected {expected}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: String,
        line: usize,
        column: usize,
    },
    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: String },
    #[error("{line}:{column}: expressions nested deeper than {limit}")]
    NestingTooDeep {
        limit: usize,
        line: usize,
        column: usize,
    },
    #[error("grammar has no productions")]
    NoProductions,
}

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Ident(String),
    Quoted(String),
    Special(String),
    Symbol(char),
    Eof,
}

impl Tok {
    fn describe(&self) -> String {
        match self {
            Tok::Ident(name) => format!("identifier `{name}`"),
            Tok::Quoted(text) => format!("literal \"{text}\""),
            Tok::Special(text) => format!("special sequence ?{text}?"),
            Tok::Symbol(c) => format!("'{c}'"),
            Tok::Eof => "end of input".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct Token {
    tok: Tok,
    line: usize,
    column: usize,
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn advance(&mut self, len: usize) {
        for ch in self.src[self.pos..self.pos + len].chars() {
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.pos += len;
    }

    fn skip_trivia(&mut self) -> Result<(), ParseError> {
        loop {
            let rest = &self.src[self.pos..];
            if let Some(m) = WHITESPACE_RE.find(rest) {
                self.advance(m.end());
            } else if let Some(m) = COMMENT_RE.find(rest) {
                self.advance(m.end());
            } else if rest.starts_with("(*") {
                return Err(ParseError::UnterminatedComment {
                    line: self.line,
                    column: self.column,
                });
            } else {
                return Ok(());
            }
        }
    }

    fn tokenize(mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia()?;
            let (line, column) = (self.line, self.column);
            let rest = &self.src[self.pos..];
            let Some(first) = rest.chars().next() else {
                tokens.push(Token {
                    tok: Tok::Eof,
                    line,
                    column,
                });
                return Ok(tokens);
            };

            let (tok, len) = if let Some(m) = IDENT_RE.find(rest) {
                (Tok::Ident(m.as_str().to_string()), m.end())
            } else if first == '"' || first == '\'' {
                let re = if first == '"' {
                    &*DOUBLE_QUOTED_RE
                } else {
                    &*SINGLE_QUOTED_RE
                };
                let caps = re
                    .captures(rest)
                    .ok_or(ParseError::UnterminatedLiteral { line, column })?;
                (Tok::Quoted(caps[1].to_string()), caps[0].len())
            } else if first == '?' {
                let caps = SPECIAL_RE
                    .captures(rest)
                    .ok_or(ParseError::UnterminatedLiteral { line, column })?;
                (Tok::Special(caps[1].trim().to_string()), caps[0].len())
            } else if SYMBOLS.contains(first) {
                (Tok::Symbol(first), first.len_utf8())
            } else {
                return Err(ParseError::UnexpectedChar {
                    found: first,
                    line,
                    column,
                });
            };
            self.advance(len);
            tokens.push(Token { tok, line, column });
        }
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    grammar: Grammar,
    depth: usize,
    max_depth: usize,
}

pub fn parse_grammar(input: &str) -> Result<Grammar, ParseError> {
    parse_grammar_with_limit(input, DEFAULT_MAX_DEPTH)
}

/// Parses with an explicit bound on bracket nesting.
pub fn parse_grammar_with_limit(input: &str, max_depth: usize) -> Result<Grammar, ParseError> {
    let tokens = Lexer::new(input).tokenize()?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        grammar: Grammar::new(),
        depth: 0,
        max_depth,
    };
    parser.syntax()?;
    tracing::debug!(nodes = parser.grammar.len(), "parsed grammar");
    Ok(parser.grammar)
}

impl Parser {
    fn peek(&self) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.pos.min(last)]
    }

    fn bump(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn error(&self, expected: &str) -> ParseError {
        let token = self.peek();
        match &token.tok {
            Tok::Eof => ParseError::UnexpectedEof {
                expected: expected.to_string(),
            },
            other => ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: other.describe(),
                line: token.line,
                column: token.column,
            },
        }
    }

    fn at_symbol(&self, c: char) -> bool {
        self.peek().tok == Tok::Symbol(c)
    }

    fn expect_symbol(&mut self, c: char) -> Result<(), ParseError> {
        if self.at_symbol(c) {
            self.bump();
            Ok(())
        } else {
            Err(self.error(&format!("'{c}'")))
        }
    }

    fn syntax(&mut self) -> Result<NodeId, ParseError> {
        let title = match &self.peek().tok {
            Tok::Quoted(text) => {
                let text = text.clone();
                self.bump();
                Some(self.grammar.title(&text))
            }
            _ => None,
        };
        let braced = title.is_some() || self.at_symbol('{');
        if braced {
            self.expect_symbol('{')?;
        }

        let mut productions = Vec::new();
        while matches!(self.peek().tok, Tok::Ident(_)) {
            productions.push(self.production()?);
        }

        let mut comment = None;
        if braced {
            self.expect_symbol('}')?;
            if let Tok::Quoted(text) = &self.peek().tok {
                let text = text.clone();
                self.bump();
                comment = Some(self.grammar.other(&text));
            }
        }
        if self.peek().tok != Tok::Eof {
            let expected = if braced { "end of input" } else { "production" };
            return Err(self.error(expected));
        }
        if productions.is_empty() {
            return Err(ParseError::NoProductions);
        }

        let list = self.grammar.production_list(productions);
        Ok(self.grammar.grammar(title, list, comment))
    }

    fn production(&mut self) -> Result<NodeId, ParseError> {
        let Tok::Ident(name) = self.bump().tok else {
            return Err(self.error("production name"));
        };
        self.expect_symbol('=')?;
        let expression = self.expression()?;
        if self.at_symbol('.') || self.at_symbol(';') {
            self.bump();
        } else {
            return Err(self.error("'.' or ';'"));
        }
        Ok(self.grammar.production(&name, expression))
    }

    fn expression(&mut self) -> Result<NodeId, ParseError> {
        let mut terms = vec![self.term()?];
        while self.at_symbol('|') {
            self.bump();
            terms.push(self.term()?);
        }
        if terms.len() == 1 {
            return Ok(terms[0]);
        }
        Ok(self.grammar.alternation(terms))
    }

    fn starts_factor(&self) -> bool {
        match &self.peek().tok {
            Tok::Ident(_) | Tok::Quoted(_) | Tok::Special(_) => true,
            Tok::Symbol(c) => matches!(*c, '[' | '{' | '(' | '<'),
            Tok::Eof => false,
        }
    }

    fn term(&mut self) -> Result<NodeId, ParseError> {
        if !self.starts_factor() {
            return Err(self.error("expression"));
        }
        let mut factors = Vec::new();
        while self.starts_factor() {
            factors.push(self.factor()?);
        }
        if factors.len() == 1 {
            return Ok(factors[0]);
        }
        Ok(self.grammar.sequence(factors))
    }

    fn factor(&mut self) -> Result<NodeId, ParseError> {
        let token = self.bump();
        match token.tok {
            Tok::Ident(name) => Ok(self.grammar.identifier(&name)),
            Tok::Quoted(text) => Ok(self.grammar.literal(&text)),
            Tok::Special(text) => Ok(self.grammar.special(&text)),
            Tok::Symbol(open) => {
                if self.depth >= self.max_depth {
                    return Err(ParseError::NestingTooDeep {
                        limit: self.max_depth,
                        line: token.line,
                        column: token.column,
                    });
                }
                self.depth += 1;
                let node = self.group(open);
                self.depth -= 1;
                node
            }
            Tok::Eof => Err(ParseError::UnexpectedEof {
                expected: "expression".to_string(),
            }),
        }
    }

    fn group(&mut self, open: char) -> Result<NodeId, ParseError> {
        let body = self.expression()?;
        match open {
            '[' => {
                self.expect_symbol(']')?;
                Ok(self.grammar.optional(body))
            }
            '{' => {
                self.expect_symbol('}')?;
                Ok(self.grammar.repetition(body))
            }
            '(' => {
                self.expect_symbol(')')?;
                Ok(body)
            }
            _ => {
                let separator = if self.at_symbol('/') {
                    self.bump();
                    Some(self.expression()?)
                } else {
                    None
                };
                self.expect_symbol('>')?;
                Ok(self.grammar.one_or_more(body, separator))
            }
        }
    }
}
