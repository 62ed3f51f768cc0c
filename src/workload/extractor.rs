//! Heuristic table-name extraction.
//!
//! This is keyword-proximity scanning, not a full SQL parser: good enough for
//! TPC-H-style statements, tolerant of multi-line formatting and casing, and
//! isolated behind `extract_tables` so a real parser could replace it without
//! touching the matcher.

use super::objects::{Statement, StatementKind, TableName};
use crate::constants::is_reserved_word;
use nom::branch::alt;
use nom::bytes::complete::{is_a, tag, tag_no_case};
use nom::character::complete::{multispace0, multispace1};
use nom::combinator::{opt, verify};
use nom::error::{ContextError, ParseError, VerboseError};
use nom::multi::separated_list1;
use nom::sequence::{pair, preceded, terminated, tuple};
use nom::IResult;
use std::collections::HashSet;

/// The set of table names a statement references. Empty (with a logged
/// warning) when nothing can be determined; a malformed statement never
/// aborts the matching pass.
pub fn extract_tables(statement: &Statement) -> HashSet<TableName> {
    let mut tables = match statement.kind {
        StatementKind::Select => extract_select_tables(&statement.text),
        kind if kind.is_write() => {
            //UPDATE ... FROM and DELETE ... USING reference tables beyond the target
            let mut tables = extract_select_tables(&statement.text);
            if let Some(target) = extract_write_target(statement) {
                tables.insert(target);
            }
            tables
        }
        _ => HashSet::new(),
    };
    tables.retain(|t| !t.is_empty());

    if tables.is_empty() {
        warn!(
            "Unable to determine referenced tables for statement {}: {}",
            statement.position,
            snippet(&statement.text)
        );
    }
    tables
}

/// The single table a write statement targets, normalized. `None` when the
/// statement is not a recognizable INSERT/UPDATE/DELETE.
pub fn extract_write_target(statement: &Statement) -> Option<TableName> {
    let sql = strip_comments(&statement.text);
    let parsed = match statement.kind {
        StatementKind::Insert => parse_insert_target::<VerboseError<&str>>(&sql),
        StatementKind::Update => parse_update_target::<VerboseError<&str>>(&sql),
        StatementKind::Delete => parse_delete_target::<VerboseError<&str>>(&sql),
        _ => return None,
    };

    match parsed {
        Ok((_, raw)) => {
            let target = TableName::normalize_write_target(raw);
            if target.is_empty() {
                None
            } else {
                Some(target)
            }
        }
        Err(_) => None,
    }
}

/// All identifiers following FROM and JOIN keywords, normalized, with
/// reserved words and aliases excluded.
pub fn extract_select_tables(sql_raw: &str) -> HashSet<TableName> {
    let sql = strip_comments(sql_raw);
    let mut tables = HashSet::new();

    for offset in from_join_positions(&sql) {
        if let Ok((_, names)) = table_list::<VerboseError<&str>>(&sql[offset..]) {
            for raw in names {
                let name = TableName::normalize(raw);
                if !name.is_empty() && !is_reserved_word(name.as_str()) {
                    tables.insert(name);
                }
            }
        }
    }
    tables
}

/// Replaces comments with whitespace, leaving string literals untouched.
pub fn strip_comments(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut rest = sql;

    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("--") {
            rest = match after.find('\n') {
                Some(pos) => {
                    out.push('\n');
                    &after[pos + 1..]
                }
                None => "",
            };
        } else if let Some(after) = rest.strip_prefix("/*") {
            rest = match after.find("*/") {
                Some(pos) => {
                    out.push(' ');
                    &after[pos + 2..]
                }
                None => "",
            };
        } else if rest.starts_with('\'') {
            let end = literal_end(rest);
            out.push_str(&rest[..end]);
            rest = &rest[end..];
        } else if let Some(ch) = rest.chars().next() {
            out.push(ch);
            rest = &rest[ch.len_utf8()..];
        }
    }
    out
}

/// Byte length of the single-quoted literal at the start of the input,
/// honoring `''` escapes. Unterminated literals run to end of input.
pub(crate) fn literal_end(s: &str) -> usize {
    let bytes = s.as_bytes();
    let mut i = 1;
    while i < bytes.len() {
        if bytes[i] == b'\'' {
            if i + 1 < bytes.len() && bytes[i + 1] == b'\'' {
                i += 2;
            } else {
                return i + 1;
            }
        } else {
            i += 1;
        }
    }
    bytes.len()
}

/// Byte offsets immediately after each standalone FROM or JOIN keyword.
/// String literals are passed over so their contents cannot leak keywords.
fn from_join_positions(sql: &str) -> Vec<usize> {
    let bytes = sql.as_bytes();
    let mut positions = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'\'' {
            i += literal_end(&sql[i..]);
        } else if is_word_byte(bytes[i]) {
            let start = i;
            while i < bytes.len() && is_word_byte(bytes[i]) {
                i += 1;
            }
            let word = &sql[start..i];
            if word.eq_ignore_ascii_case("from") || word.eq_ignore_ascii_case("join") {
                positions.push(i);
            }
        } else {
            i += 1;
        }
    }
    positions
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

fn parse_insert_target<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, &'a str, E> {
    let (input, (_, _, _, _, _, target)) = tuple((
        multispace0,
        tag_no_case("insert"),
        multispace1,
        tag_no_case("into"),
        multispace1,
        parse_sql_identifier,
    ))(input)?;
    Ok((input, target))
}

fn parse_update_target<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, &'a str, E> {
    let (input, (_, _, _, _, target)) = tuple((
        multispace0,
        tag_no_case("update"),
        multispace1,
        opt(terminated(tag_no_case("only"), multispace1)),
        parse_sql_identifier,
    ))(input)?;
    Ok((input, target))
}

fn parse_delete_target<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, &'a str, E> {
    let (input, (_, _, _, _, _, target)) = tuple((
        multispace0,
        tag_no_case("delete"),
        multispace1,
        tag_no_case("from"),
        multispace1,
        parse_sql_identifier,
    ))(input)?;
    Ok((input, target))
}

/// Comma-separated table references, each with an optional alias.
fn table_list<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, Vec<&'a str>, E> {
    separated_list1(tuple((multispace0, tag(","), multispace0)), table_ref)(input)
}

fn table_ref<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, &'a str, E> {
    let (input, (_, name, _)) =
        tuple((multispace0, parse_sql_identifier, opt(table_alias)))(input)?;
    Ok((input, name))
}

fn table_alias<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, &'a str, E> {
    preceded(
        multispace1,
        alt((
            preceded(
                pair(tag_no_case("as"), multispace1),
                parse_sql_identifier,
            ),
            verify(parse_sql_identifier, |word: &str| !is_reserved_word(word)),
        )),
    )(input)
}

fn parse_sql_identifier<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, &'a str, E> {
    is_a("abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789_.$\"[]`")(input)
}

fn snippet(text: &str) -> String {
    const LIMIT: usize = 80;
    if text.len() > LIMIT {
        let cut = text
            .char_indices()
            .take_while(|(i, _)| *i < LIMIT)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        format!("{}...", &text[..cut].replace('\n', " "))
    } else {
        text.replace('\n', " ")
    }
}
