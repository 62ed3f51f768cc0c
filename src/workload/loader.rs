//! Splits SQL source files into discrete statements.
//!
//! The splitter tokenizes just enough SQL to know when a `;` is a real
//! terminator: semicolons inside single-quoted literals, double-quoted
//! identifiers and comments do not end a statement. An unterminated literal
//! at end of file degrades to treating the stray quote as plain text.

use super::extractor::strip_comments;
use super::objects::Statement;
use nom::branch::alt;
use nom::bytes::complete::{is_not, tag, take_until};
use nom::character::complete::none_of;
use nom::combinator::{eof, opt, recognize};
use nom::error::{ContextError, ParseError, VerboseError};
use nom::multi::{many0, many_till};
use nom::sequence::{delimited, pair, tuple};
use nom::IResult;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub struct StatementLoader {}

impl StatementLoader {
    /// Loads every statement from a SQL text file, in file order.
    pub fn load(path: &Path) -> Result<Vec<Statement>, LoaderError> {
        let source = fs::read_to_string(path)
            .map_err(|e| LoaderError::Unreadable(path.to_path_buf(), e))?;

        let statements: Vec<Statement> = StatementSplitter::new(&source).collect();
        if statements.is_empty() {
            return Err(LoaderError::EmptySource(path.to_path_buf()));
        }

        debug!(
            "Loaded {} statements from {}",
            statements.len(),
            path.display()
        );
        Ok(statements)
    }
}

/// Lazy, forward-only iterator over the statements of a source string.
pub struct StatementSplitter<'a> {
    remaining: &'a str,
    position: usize,
}

impl<'a> StatementSplitter<'a> {
    pub fn new(source: &'a str) -> StatementSplitter<'a> {
        StatementSplitter {
            remaining: source,
            position: 0,
        }
    }
}

impl<'a> Iterator for StatementSplitter<'a> {
    type Item = Statement;

    fn next(&mut self) -> Option<Statement> {
        loop {
            if self.remaining.is_empty() {
                return None;
            }

            let fragment = match statement_fragment::<VerboseError<&str>>(self.remaining) {
                Ok((rest, fragment)) => {
                    self.remaining = rest;
                    fragment
                }
                Err(_) => {
                    let fragment = self.remaining;
                    self.remaining = "";
                    fragment
                }
            };

            let text = fragment.trim_end_matches(';').trim();
            if text.is_empty() || strip_comments(text).trim().is_empty() {
                continue;
            }

            let statement = Statement::new(text.to_string(), self.position);
            self.position += 1;
            return Some(statement);
        }
    }
}

/// Everything up to and including the next statement terminator (or end of
/// input), with literals and comments passed over opaquely.
fn statement_fragment<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, &'a str, E> {
    recognize(many_till(
        alt((
            string_literal,
            quoted_identifier,
            line_comment,
            block_comment,
            recognize(none_of(";")),
        )),
        alt((tag(";"), eof)),
    ))(input)
}

fn string_literal<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, &'a str, E> {
    recognize(delimited(
        tag("'"),
        many0(alt((is_not("'"), tag("''")))),
        tag("'"),
    ))(input)
}

fn quoted_identifier<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, &'a str, E> {
    recognize(delimited(tag("\""), opt(is_not("\"")), tag("\"")))(input)
}

fn line_comment<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, &'a str, E> {
    recognize(pair(tag("--"), opt(is_not("\n"))))(input)
}

fn block_comment<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, &'a str, E> {
    recognize(tuple((tag("/*"), take_until("*/"), tag("*/"))))(input)
}

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("Unable to read SQL source {0}")]
    Unreadable(PathBuf, #[source] std::io::Error),
    #[error("SQL source {0} contains no statements")]
    EmptySource(PathBuf),
}
