// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command language parser

use crate::lexer::{tokenize, Token};
use thiserror::Error;

/// Command reference printed by `HELP`
pub const HELP: &str = "\
commands (keywords are case-insensitive):
  HELP                      show this help
  CLEAR                     remove the user and duration filters
  USER <id>                 only match records of this user
  DURATION \"<t1>\" \"<t2>\"    only match records created in [t1, t2],
                            times as YYYY-MM-DDTHH:MM:SS (UTC)
  SUM                       count matching records
  LS                        list matching records
  SHOW <n>                  print the record at index position n (1-based)
  REPLAY \"<uri>\"            apply matching records to a sink
                            (file:///dir, http://host/base, memory:)
  FILES                     list segments with their record counts
  USERS                     record counts per user within the duration";

/// Errors confined to a single command line
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unterminated string")]
    UnterminatedString,
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("expected {expected}, found {found}")]
    Expected { expected: &'static str, found: String },
    #[error("number out of range: {0}")]
    NumberOutOfRange(String),
    #[error("unexpected {0} after command")]
    TrailingInput(String),
    #[error("line is not valid UTF-8")]
    InvalidEncoding,
}

/// One parsed command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Clear,
    User(i32),
    Duration { start: String, end: String },
    Sum,
    Ls,
    Show(usize),
    Replay(String),
    Files,
    Users,
}

/// Parse one line. Blank lines yield `None`.
pub fn parse(line: &str) -> Result<Option<Command>, ParseError> {
    let mut parser = Parser::new(tokenize(line)?);

    let keyword = match parser.next() {
        Token::Eof => return Ok(None),
        Token::Word(w) => w.to_ascii_uppercase(),
        other => {
            return Err(ParseError::Expected {
                expected: "a command",
                found: other.to_string(),
            })
        }
    };

    let command = match keyword.as_str() {
        "HELP" => Command::Help,
        "CLEAR" => Command::Clear,
        "USER" => Command::User(parser.number()?),
        "DURATION" => Command::Duration {
            start: parser.string()?,
            end: parser.string()?,
        },
        "SUM" => Command::Sum,
        "LS" => Command::Ls,
        "SHOW" => Command::Show(parser.number()?),
        "REPLAY" => Command::Replay(parser.string()?),
        "FILES" => Command::Files,
        "USERS" => Command::Users,
        _ => return Err(ParseError::UnknownCommand(keyword)),
    };

    parser.finish()?;
    Ok(Some(command))
}

struct Parser {
    tokens: std::vec::IntoIter<Token>,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens: tokens.into_iter(),
        }
    }

    fn next(&mut self) -> Token {
        self.tokens.next().unwrap_or(Token::Eof)
    }

    fn number<T: std::str::FromStr>(&mut self) -> Result<T, ParseError> {
        match self.next() {
            Token::Number(digits) => digits
                .parse()
                .map_err(|_| ParseError::NumberOutOfRange(digits)),
            other => Err(ParseError::Expected {
                expected: "a number",
                found: other.to_string(),
            }),
        }
    }

    fn string(&mut self) -> Result<String, ParseError> {
        match self.next() {
            Token::Str(s) => Ok(s),
            other => Err(ParseError::Expected {
                expected: "a quoted string",
                found: other.to_string(),
            }),
        }
    }

    fn finish(&mut self) -> Result<(), ParseError> {
        match self.next() {
            Token::Eof => Ok(()),
            other => Err(ParseError::TrailingInput(other.to_string())),
        }
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
