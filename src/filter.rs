//! Extracts the write statements from a benchmark workload CSV.
//!
//! The metrics collector logs every executed statement with at least a
//! `query_type` and a `sql` column; this module keeps the INSERT/UPDATE/
//! DELETE rows, folds sharded table names back onto their logical table, and
//! emits either a filtered CSV or a plain SQL statement file for the matcher.

use csv::StringRecord;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FilterFormat {
    Csv,
    Sql,
}

#[derive(Copy, Clone, Debug, Default)]
pub struct FilterSummary {
    pub inserts: usize,
    pub updates: usize,
    pub deletes: usize,
}

impl FilterSummary {
    pub fn total(&self) -> usize {
        self.inserts + self.updates + self.deletes
    }
}

pub struct WriteFilter {
    format: FilterFormat,
}

impl WriteFilter {
    pub fn new(format: FilterFormat) -> WriteFilter {
        WriteFilter { format }
    }

    pub fn filter_file(&self, input: &Path, output: &Path) -> Result<FilterSummary, FilterError> {
        let mut reader = csv::Reader::from_path(input)
            .map_err(|e| FilterError::Unreadable(input.to_path_buf(), e))?;
        let headers = reader
            .headers()
            .map_err(|e| FilterError::Unreadable(input.to_path_buf(), e))?
            .clone();

        let type_idx = column_index(&headers, "query_type")
            .ok_or_else(|| FilterError::MissingColumn(input.to_path_buf(), "query_type"))?;
        let sql_idx = column_index(&headers, "sql")
            .ok_or_else(|| FilterError::MissingColumn(input.to_path_buf(), "sql"))?;

        let mut summary = FilterSummary::default();
        let mut kept: Vec<StringRecord> = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| FilterError::Unreadable(input.to_path_buf(), e))?;
            let query_type = record.get(type_idx).unwrap_or("").trim().to_lowercase();
            match query_type.as_str() {
                "insert" => summary.inserts += 1,
                "update" => summary.updates += 1,
                "delete" => summary.deletes += 1,
                _ => continue,
            }

            let mut fields: Vec<String> = record.iter().map(str::to_string).collect();
            if let Some(sql) = fields.get_mut(sql_idx) {
                *sql = strip_shard_suffixes(sql);
            }
            kept.push(StringRecord::from(fields));
        }

        info!("Found {} write statements:", summary.total());
        info!("  INSERT: {}", summary.inserts);
        info!("  UPDATE: {}", summary.updates);
        info!("  DELETE: {}", summary.deletes);

        match self.format {
            FilterFormat::Csv => write_csv_output(&headers, &kept, output)?,
            FilterFormat::Sql => write_sql_output(&kept, sql_idx, output)?,
        }

        info!("Write statements saved to {}", output.display());
        Ok(summary)
    }
}

/// Removes one `_<digits>` shard suffix from each double-quoted identifier,
/// so `"orders_3"` addresses the logical `"orders"` table again.
pub fn strip_shard_suffixes(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut rest = sql;

    loop {
        let pos = match rest.find('"') {
            Some(pos) => pos,
            None => {
                out.push_str(rest);
                return out;
            }
        };
        out.push_str(&rest[..pos + 1]);
        let after = &rest[pos + 1..];
        match after.find('"') {
            Some(end) => {
                out.push_str(strip_one_suffix(&after[..end]));
                out.push('"');
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(after);
                return out;
            }
        }
    }
}

fn strip_one_suffix(ident: &str) -> &str {
    let pos = match ident.rfind('_') {
        Some(pos) if pos > 0 => pos,
        _ => return ident,
    };
    let (prefix, suffix) = (&ident[..pos], &ident[pos + 1..]);
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return ident;
    }
    let mut chars = prefix.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return ident,
    }
    if !prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return ident;
    }
    prefix
}

fn column_index(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}

fn write_csv_output(
    headers: &StringRecord,
    records: &[StringRecord],
    output: &Path,
) -> Result<(), FilterError> {
    let mut writer = csv::Writer::from_path(output)
        .map_err(|e| FilterError::CsvWrite(output.to_path_buf(), e))?;
    writer
        .write_record(headers)
        .map_err(|e| FilterError::CsvWrite(output.to_path_buf(), e))?;
    for record in records {
        writer
            .write_record(record)
            .map_err(|e| FilterError::CsvWrite(output.to_path_buf(), e))?;
    }
    writer
        .flush()
        .map_err(|e| FilterError::CsvWrite(output.to_path_buf(), csv::Error::from(e)))?;
    Ok(())
}

fn write_sql_output(
    records: &[StringRecord],
    sql_idx: usize,
    output: &Path,
) -> Result<(), FilterError> {
    let file =
        File::create(output).map_err(|e| FilterError::SqlWrite(output.to_path_buf(), e))?;
    let mut out = BufWriter::new(file);
    for record in records {
        let sql = record.get(sql_idx).unwrap_or("").trim();
        if sql.is_empty() {
            continue;
        }
        if sql.ends_with(';') {
            writeln!(out, "{}", sql).map_err(|e| FilterError::SqlWrite(output.to_path_buf(), e))?;
        } else {
            writeln!(out, "{};", sql)
                .map_err(|e| FilterError::SqlWrite(output.to_path_buf(), e))?;
        }
    }
    out.flush()
        .map_err(|e| FilterError::SqlWrite(output.to_path_buf(), e))
}

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("Unable to read workload CSV {0}")]
    Unreadable(PathBuf, #[source] csv::Error),
    #[error("Workload CSV {0} is missing required column '{1}'")]
    MissingColumn(PathBuf, &'static str),
    #[error("Unable to write filtered CSV {0}")]
    CsvWrite(PathBuf, #[source] csv::Error),
    #[error("Unable to write filtered SQL {0}")]
    SqlWrite(PathBuf, #[source] std::io::Error),
}
