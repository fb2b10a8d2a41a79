// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

fn parsed(line: &str) -> Command {
    parse(line).unwrap().unwrap()
}

#[parameterized(
    help = { "HELP", Command::Help },
    clear_lowercase = { "clear", Command::Clear },
    user = { "USER 1234", Command::User(1234) },
    user_mixed_case = { "User 7", Command::User(7) },
    sum = { "  SUM  ", Command::Sum },
    ls = { "ls", Command::Ls },
    show = { "SHOW 3", Command::Show(3) },
    files = { "FILES", Command::Files },
    users = { "users", Command::Users },
)]
fn parses_simple_commands(line: &str, expected: Command) {
    assert_eq!(parsed(line), expected);
}

#[test]
fn parses_duration() {
    assert_eq!(
        parsed(r#"DURATION "2020-01-01T00:00:00" "2020-01-02T00:00:00""#),
        Command::Duration {
            start: "2020-01-01T00:00:00".to_string(),
            end: "2020-01-02T00:00:00".to_string(),
        }
    );
}

#[test]
fn parses_replay() {
    assert_eq!(
        parsed(r#"replay "file:///tmp/out""#),
        Command::Replay("file:///tmp/out".to_string())
    );
}

#[test]
fn blank_line_is_none() {
    assert_eq!(parse("").unwrap(), None);
    assert_eq!(parse("   ").unwrap(), None);
}

#[parameterized(
    missing_user = { "USER" },
    user_takes_number = { "USER \"1\"" },
    show_takes_number = { "SHOW abc" },
    duration_needs_two = { "DURATION \"2020-01-01T00:00:00\"" },
    duration_takes_strings = { "DURATION 1 2" },
    replay_takes_string = { "REPLAY memory" },
    starts_with_number = { "12" },
    starts_with_string = { "\"SUM\"" },
)]
fn argument_mismatch_is_expected_error(line: &str) {
    assert!(
        matches!(parse(line), Err(ParseError::Expected { .. })),
        "{line}: {:?}",
        parse(line)
    );
}

#[parameterized(
    sum = { "SUM 1" },
    user = { "USER 1 2" },
    replay = { "REPLAY \"memory:\" extra" },
    symbol = { "LS ;" },
)]
fn trailing_tokens_are_rejected(line: &str) {
    assert!(matches!(parse(line), Err(ParseError::TrailingInput(_))));
}

#[test]
fn unknown_command() {
    assert_eq!(
        parse("DROP 1"),
        Err(ParseError::UnknownCommand("DROP".to_string()))
    );
}

#[test]
fn number_overflow_is_an_error() {
    assert_eq!(
        parse("USER 2147483648"),
        Err(ParseError::NumberOutOfRange("2147483648".to_string()))
    );
    assert_eq!(parsed("USER 2147483647"), Command::User(i32::MAX));
}

#[test]
fn unterminated_string_is_an_error() {
    assert_eq!(
        parse("REPLAY \"memory:"),
        Err(ParseError::UnterminatedString)
    );
}

#[test]
fn help_lists_every_command() {
    for keyword in [
        "HELP", "CLEAR", "USER", "DURATION", "SUM", "LS", "SHOW", "REPLAY", "FILES", "USERS",
    ] {
        assert!(HELP.contains(keyword), "help is missing {keyword}");
    }
}
