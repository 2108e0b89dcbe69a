use std::{iter::Peekable, str::CharIndices};

use tracing::{debug, trace};

use crate::ast::OperatorKind;
use crate::symbols::SymbolTable;
use crate::token::{Span, Token, TokenKind};

pub mod error;

pub use error::{LexError, LexResult};

/// Word spellings of the language, resolved before a run is treated as a name.
pub const KEYWORDS: &[(&str, OperatorKind)] = &[
    ("sin", OperatorKind::Sin),
    ("cos", OperatorKind::Cos),
    ("log", OperatorKind::Log),
    ("ln", OperatorKind::Ln),
    ("koreshok", OperatorKind::Sqrt),
    ("koli", OperatorKind::If),
    ("pokuda", OperatorKind::While),
    ("togda", OperatorKind::Then),
    ("vvedi", OperatorKind::In),
    ("vivedi", OperatorKind::Out),
    ("plus", OperatorKind::Add),
    ("minus", OperatorKind::Sub),
    ("umnozhit", OperatorKind::Mul),
    ("delit", OperatorKind::Div),
    ("vozvesti", OperatorKind::Pow),
    ("prisvoy", OperatorKind::Assign),
    ("menshe", OperatorKind::Below),
    ("bolshe", OperatorKind::Above),
    ("ravno", OperatorKind::Equal),
    ("neravno", OperatorKind::NotEqual),
    ("perem", OperatorKind::NewVar),
    ("pole_polushko_nachnis", OperatorKind::OpenBlock),
    ("pole_polushko_zakonchis", OperatorKind::CloseBlock),
    ("slavsya_rus", OperatorKind::InstrEnd),
];

pub fn keyword(word: &str) -> Option<OperatorKind> {
    KEYWORDS
        .iter()
        .find(|(spelling, _)| *spelling == word)
        .map(|(_, op)| *op)
}

fn punctuation(c: char) -> Option<OperatorKind> {
    let op = match c {
        '(' => OperatorKind::LeftBracket,
        ')' => OperatorKind::RightBracket,
        '+' => OperatorKind::Add,
        '-' => OperatorKind::Sub,
        '*' => OperatorKind::Mul,
        '/' => OperatorKind::Div,
        '^' => OperatorKind::Pow,
        ';' => OperatorKind::InstrEnd,
        '{' => OperatorKind::OpenBlock,
        '}' => OperatorKind::CloseBlock,
        _ => return None,
    };
    Some(op)
}

pub struct Lexer<'a, 's> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
    symbols: &'s mut SymbolTable,
    line: usize,
    column: usize,
}

impl<'a, 's> Lexer<'a, 's> {
    pub fn new(input: &'a str, symbols: &'s mut SymbolTable) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
            symbols,
            line: 1,
            column: 1,
        }
    }

    pub fn next_token(&mut self) -> LexResult<Token> {
        self.skip_whitespace();

        let start_line = self.line;
        let start_column = self.column;
        let Some(&(start_idx, ch)) = self.chars.peek() else {
            let index = self.input.len();
            return Ok(Token::new(
                TokenKind::End,
                Span {
                    start: index,
                    end: index,
                    line: start_line,
                    column: start_column,
                },
            ));
        };

        if let Some(op) = punctuation(ch) {
            self.advance_char();
            return Ok(Token::new(
                TokenKind::Operator(op),
                Span {
                    start: start_idx,
                    end: start_idx + ch.len_utf8(),
                    line: start_line,
                    column: start_column,
                },
            ));
        }

        match ch {
            c if c.is_ascii_digit() => self.read_number(start_idx, start_line, start_column),
            c if c.is_alphabetic() => self.read_word(start_idx, start_line, start_column),
            _ => Err(LexError::UnexpectedCharacter {
                character: ch,
                line: start_line,
                column: start_column,
            }),
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_whitespace() {
                self.advance_char();
            } else {
                break;
            }
        }
    }

    fn read_word(&mut self, start: usize, line: usize, column: usize) -> LexResult<Token> {
        self.advance_char(); // Consume first letter
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.advance_char();
            } else {
                break;
            }
        }

        let end = self.current_index();
        let word = &self.input[start..end];
        let kind = match keyword(word) {
            Some(op) => TokenKind::Operator(op),
            None => {
                let slot = self
                    .symbols
                    .intern(word)
                    .map_err(|source| LexError::SymbolTable {
                        source,
                        line,
                        column,
                    })?;
                TokenKind::Identifier(slot)
            }
        };
        Ok(Token::new(
            kind,
            Span {
                start,
                end,
                line,
                column,
            },
        ))
    }

    /// Decimal literal with optional fraction and exponent, `strtod` style: a
    /// trailing `e` without digits is left for the next token.
    fn read_number(&mut self, start: usize, line: usize, column: usize) -> LexResult<Token> {
        self.consume_digits();

        if self.peek_char() == Some('.') {
            self.advance_char();
            self.consume_digits();
        }

        if matches!(self.peek_char(), Some('e' | 'E')) && self.exponent_follows() {
            self.advance_char(); // e
            if matches!(self.peek_char(), Some('+' | '-')) {
                self.advance_char();
            }
            self.consume_digits();
        }

        let end = self.current_index();
        let literal = &self.input[start..end];
        let value = literal
            .parse::<f64>()
            .map_err(|_| LexError::InvalidNumber {
                literal: literal.to_string(),
                line,
                column,
            })?;
        Ok(Token::new(
            TokenKind::Number(value),
            Span {
                start,
                end,
                line,
                column,
            },
        ))
    }

    fn exponent_follows(&self) -> bool {
        let mut lookahead = self.chars.clone();
        lookahead.next(); // e
        match lookahead.next() {
            Some((_, c)) if c.is_ascii_digit() => true,
            Some((_, '+' | '-')) => matches!(lookahead.next(), Some((_, c)) if c.is_ascii_digit()),
            _ => false,
        }
    }

    fn consume_digits(&mut self) {
        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() {
                self.advance_char();
            } else {
                break;
            }
        }
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn advance_char(&mut self) -> Option<(usize, char)> {
        let next = self.chars.next();
        if let Some((_, c)) = next {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        next
    }

    fn current_index(&mut self) -> usize {
        self.chars
            .peek()
            .map(|(idx, _)| *idx)
            .unwrap_or(self.input.len())
    }
}

/// Lex `input` into tokens terminated by [`TokenKind::End`], interning every
/// identifier into `symbols`.
pub fn tokenize(input: &str, symbols: &mut SymbolTable) -> LexResult<Vec<Token>> {
    let mut lexer = Lexer::new(input, symbols);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        trace!(kind = ?token.kind, line = token.span.line, column = token.span.column, "token");
        let is_end = matches!(token.kind, TokenKind::End);
        tokens.push(token);
        if is_end {
            break;
        }
    }
    debug!(tokens = tokens.len(), symbols = symbols.len(), "tokenized source");
    Ok(tokens)
}
