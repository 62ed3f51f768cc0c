//! Rewrites a select workload file in place, removing clauses the
//! incremental-view extension cannot handle. Currently that is `ORDER BY`.
//!
//! The file format is one statement per line (the shape the metrics tooling
//! produces), so processing is line-oriented and the layout is preserved.

use crate::workload::extractor::literal_end;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Copy, Clone, Debug)]
pub struct CleanSummary {
    pub statements_changed: usize,
}

pub struct StatementCleaner {
    backup: bool,
    dry_run: bool,
}

impl StatementCleaner {
    pub fn new(backup: bool, dry_run: bool) -> StatementCleaner {
        StatementCleaner { backup, dry_run }
    }

    pub fn clean_file(&self, path: &Path) -> Result<CleanSummary, CleanerError> {
        let source = fs::read_to_string(path)
            .map_err(|e| CleanerError::Unreadable(path.to_path_buf(), e))?;

        let mut changed = 0;
        let mut cleaned_lines = Vec::new();
        for (line_num, line) in source.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with("--") {
                cleaned_lines.push(line.to_string());
                continue;
            }

            let cleaned = clean_statement(line);
            if cleaned != line {
                changed += 1;
                if self.dry_run {
                    info!("Line {}:", line_num + 1);
                    info!("  before: {}", line);
                    info!("  after:  {}", cleaned);
                }
            }
            cleaned_lines.push(cleaned);
        }

        if self.dry_run {
            info!(
                "Dry run: would modify {} statement(s) in {}",
                changed,
                path.display()
            );
            return Ok(CleanSummary {
                statements_changed: changed,
            });
        }

        if changed == 0 {
            info!("No changes needed in {}", path.display());
            return Ok(CleanSummary {
                statements_changed: 0,
            });
        }

        if self.backup {
            let backup_path = backup_path(path);
            fs::write(&backup_path, &source)
                .map_err(|e| CleanerError::BackupFailed(backup_path.clone(), e))?;
            info!("Backup created: {}", backup_path.display());
        }

        let mut output = cleaned_lines.join("\n");
        if source.ends_with('\n') {
            output.push('\n');
        }
        fs::write(path, output).map_err(|e| CleanerError::Unwritable(path.to_path_buf(), e))?;

        info!(
            "Cleaned {} statement(s) in {}",
            changed,
            path.display()
        );
        Ok(CleanSummary {
            statements_changed: changed,
        })
    }
}

/// Applies every clause rewrite to a single statement. Non-SELECT statements
/// pass through untouched.
pub fn clean_statement(sql: &str) -> String {
    if !is_select(sql) {
        return sql.to_string();
    }
    remove_order_by(sql)
}

fn is_select(sql: &str) -> bool {
    let trimmed = sql.trim_start().as_bytes();
    trimmed.len() >= 6
        && trimmed[..6].eq_ignore_ascii_case(b"select")
        && trimmed
            .get(6)
            .map_or(true, |b| !(b.is_ascii_alphanumeric() || *b == b'_'))
}

/// Removes a top-level ORDER BY clause, keeping any trailing LIMIT/OFFSET.
/// Whitespace is normalized as a side effect (string literals excepted), as
/// the downstream replay tooling expects single-line statements.
pub fn remove_order_by(sql: &str) -> String {
    let trimmed = sql.trim_end();
    let had_terminator = trimmed.ends_with(';');
    let body = if had_terminator {
        trimmed[..trimmed.len() - 1].trim_end()
    } else {
        trimmed
    };

    let collapsed = collapse_whitespace(body.trim_start());
    let mut cleaned = match order_by_span(&collapsed) {
        Some((start, end)) => {
            let head = collapsed[..start].trim_end();
            let tail = &collapsed[end..];
            if tail.is_empty() {
                head.to_string()
            } else {
                format!("{} {}", head, tail)
            }
        }
        None => collapsed,
    };

    if had_terminator {
        cleaned.push(';');
    }
    cleaned
}

/// Byte span of the first depth-zero `ORDER BY ...` clause: from the ORDER
/// keyword up to the next depth-zero LIMIT/OFFSET keyword or end of string.
fn order_by_span(sql: &str) -> Option<(usize, usize)> {
    let words = scan_words(sql);

    let mut order_idx = None;
    for i in 0..words.len().saturating_sub(1) {
        let (start, end, depth) = words[i];
        if depth == 0
            && sql[start..end].eq_ignore_ascii_case("order")
            && sql[words[i + 1].0..words[i + 1].1].eq_ignore_ascii_case("by")
        {
            order_idx = Some(i);
            break;
        }
    }
    let order_idx = order_idx?;
    let clause_start = words[order_idx].0;

    for &(start, end, depth) in &words[order_idx + 2..] {
        if depth == 0
            && (sql[start..end].eq_ignore_ascii_case("limit")
                || sql[start..end].eq_ignore_ascii_case("offset"))
        {
            return Some((clause_start, start));
        }
    }
    Some((clause_start, sql.len()))
}

/// Word tokens as (start, end, paren depth), skipping string literals.
fn scan_words(sql: &str) -> Vec<(usize, usize, i32)> {
    let bytes = sql.as_bytes();
    let mut words = Vec::new();
    let mut depth = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\'' => i += literal_end(&sql[i..]),
            b'(' => {
                depth += 1;
                i += 1;
            }
            b')' => {
                depth -= 1;
                i += 1;
            }
            b if b.is_ascii_alphanumeric() || b == b'_' => {
                let start = i;
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                    i += 1;
                }
                words.push((start, i, depth));
            }
            _ => i += 1,
        }
    }
    words
}

fn collapse_whitespace(sql: &str) -> String {
    let bytes = sql.as_bytes();
    let mut out = String::with_capacity(sql.len());
    let mut i = 0;
    let mut pending_space = false;

    while i < bytes.len() {
        if bytes[i] == b'\'' {
            let end = literal_end(&sql[i..]);
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.push_str(&sql[i..i + end]);
            i += end;
        } else if bytes[i].is_ascii_whitespace() {
            pending_space = !out.is_empty();
            i += 1;
        } else if let Some(ch) = sql[i..].chars().next() {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.push(ch);
            i += ch.len_utf8();
        }
    }
    out
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".backup");
    path.with_file_name(name)
}

#[derive(Debug, Error)]
pub enum CleanerError {
    #[error("Unable to read SQL file {0}")]
    Unreadable(PathBuf, #[source] std::io::Error),
    #[error("Unable to create backup file {0}")]
    BackupFailed(PathBuf, #[source] std::io::Error),
    #[error("Unable to rewrite SQL file {0}")]
    Unwritable(PathBuf, #[source] std::io::Error),
}
