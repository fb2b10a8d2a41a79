// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tokenizer for the command language

use crate::command::ParseError;
use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A run of ASCII letters
    Word(String),
    /// A run of ASCII digits, unparsed
    Number(String),
    /// Raw text between double quotes
    Str(String),
    Unrecognized(char),
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Word(w) => write!(f, "word {w:?}"),
            Token::Number(n) => write!(f, "number {n}"),
            Token::Str(s) => write!(f, "string {s:?}"),
            Token::Unrecognized(c) => write!(f, "character {c:?}"),
            Token::Eof => write!(f, "end of line"),
        }
    }
}

pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(line: &'a str) -> Self {
        Self {
            chars: line.chars().peekable(),
        }
    }

    pub fn next_token(&mut self) -> Result<Token, ParseError> {
        while self.chars.next_if(|c| c.is_whitespace()).is_some() {}

        let Some(c) = self.chars.next() else {
            return Ok(Token::Eof);
        };
        let token = match c {
            '"' => {
                let mut text = String::new();
                loop {
                    match self.chars.next() {
                        Some('"') => break,
                        Some(c) => text.push(c),
                        None => return Err(ParseError::UnterminatedString),
                    }
                }
                Token::Str(text)
            }
            c if c.is_ascii_alphabetic() => {
                Token::Word(self.take_while(c, |c| c.is_ascii_alphabetic()))
            }
            c if c.is_ascii_digit() => Token::Number(self.take_while(c, |c| c.is_ascii_digit())),
            c => Token::Unrecognized(c),
        };
        Ok(token)
    }

    fn take_while(&mut self, first: char, pred: impl Fn(&char) -> bool) -> String {
        let mut text = String::from(first);
        while let Some(c) = self.chars.next_if(&pred) {
            text.push(c);
        }
        text
    }
}

/// Tokenize a whole line; the result always ends with [`Token::Eof`]
pub fn tokenize(line: &str) -> Result<Vec<Token>, ParseError> {
    let mut lexer = Lexer::new(line);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token == Token::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

#[cfg(test)]
#[path = "lexer_tests.rs"]
mod tests;
