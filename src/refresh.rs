//! Converts TPC-H dbgen refresh-stream files into replayable SQL.
//!
//! Stream N consists of `orders.tbl.uN` and `lineitem.tbl.uN` (RF1 insert
//! rows) and `delete.N` (RF2 order keys). The emitted file wraps everything
//! in one transaction; deletes hit LINEITEM before ORDERS to respect the
//! foreign key.

use crate::constants::{ColumnKind, RefreshTable, LINEITEM, ORDERS};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Copy, Clone, Debug, Default)]
pub struct RefreshSummary {
    pub inserts: usize,
    pub deletes: usize,
}

pub struct RefreshConverter {
    update_dir: PathBuf,
    stream: u32,
    delimiter: char,
}

impl RefreshConverter {
    pub fn new(update_dir: PathBuf, stream: u32, delimiter: char) -> RefreshConverter {
        RefreshConverter {
            update_dir,
            stream,
            delimiter,
        }
    }

    pub fn convert(&self, output: &Path) -> Result<RefreshSummary, RefreshError> {
        let orders_file = self.update_dir.join(format!("orders.tbl.u{}", self.stream));
        let lineitem_file = self
            .update_dir
            .join(format!("lineitem.tbl.u{}", self.stream));
        let delete_file = self.update_dir.join(format!("delete.{}", self.stream));

        for path in [&orders_file, &lineitem_file, &delete_file].iter() {
            if !path.exists() {
                return Err(RefreshError::MissingInput(path.to_path_buf()));
            }
        }

        let file = File::create(output)?;
        let mut out = BufWriter::new(file);
        let mut summary = RefreshSummary::default();

        writeln!(out, "BEGIN TRANSACTION;")?;
        writeln!(out)?;

        summary.inserts += self.emit_inserts(&mut out, &ORDERS, &orders_file)?;
        summary.inserts += self.emit_inserts(&mut out, &LINEITEM, &lineitem_file)?;
        summary.deletes = self.emit_deletes(&mut out, &delete_file)?;

        writeln!(out, "COMMIT;")?;
        out.flush()?;

        info!(
            "Wrote {} inserts and {} deletes to {}",
            summary.inserts,
            summary.deletes,
            output.display()
        );
        Ok(summary)
    }

    fn emit_inserts(
        &self,
        out: &mut BufWriter<File>,
        table: &RefreshTable,
        path: &Path,
    ) -> Result<usize, RefreshError> {
        let source = fs::read_to_string(path)
            .map_err(|e| RefreshError::Unreadable(path.to_path_buf(), e))?;

        writeln!(
            out,
            "-- RF1: Processing inserts for {} from {}",
            table.name,
            file_name(path)
        )?;

        let mut count = 0;
        for (line_num, line) in source.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            let mut values: Vec<&str> = line.split(self.delimiter).collect();
            //dbgen rows end with a trailing delimiter
            if values.last() == Some(&"") {
                values.pop();
            }
            if values.len() != table.arity() {
                return Err(RefreshError::RowArity(
                    path.to_path_buf(),
                    line_num + 1,
                    values.len(),
                    table.arity(),
                ));
            }

            writeln!(
                out,
                "INSERT INTO {} VALUES ({});",
                table.name,
                render_row(table, &values)
            )?;
            count += 1;
        }
        writeln!(out)?;
        Ok(count)
    }

    fn emit_deletes(
        &self,
        out: &mut BufWriter<File>,
        path: &Path,
    ) -> Result<usize, RefreshError> {
        let source = fs::read_to_string(path)
            .map_err(|e| RefreshError::Unreadable(path.to_path_buf(), e))?;

        writeln!(out, "-- RF2: Processing deletes from {}", file_name(path))?;

        let mut count = 0;
        for line in source.lines() {
            let order_key = line.trim();
            if order_key.is_empty() {
                continue;
            }
            writeln!(out, "DELETE FROM LINEITEM WHERE L_ORDERKEY = {};", order_key)?;
            writeln!(out, "DELETE FROM ORDERS WHERE O_ORDERKEY = {};", order_key)?;
            count += 2;
        }
        writeln!(out)?;
        Ok(count)
    }
}

fn render_row(table: &RefreshTable, values: &[&str]) -> String {
    let rendered: Vec<String> = table
        .columns
        .iter()
        .zip(values.iter())
        .map(|(kind, value)| match kind {
            ColumnKind::Numeric => value.to_string(),
            ColumnKind::Text => format!("'{}'", value.replace('\'', "''")),
        })
        .collect();
    rendered.join(", ")
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("Refresh input {0} not found")]
    MissingInput(PathBuf),
    #[error("Unable to read refresh input {0}")]
    Unreadable(PathBuf, #[source] std::io::Error),
    #[error("Refresh input {0} line {1}: expected {3} fields, found {2}")]
    RowArity(PathBuf, usize, usize, usize),
    #[error(transparent)]
    OutputError(#[from] std::io::Error),
}
