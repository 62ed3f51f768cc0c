//! Serializes a matched workload for verbatim replay.
//!
//! Statement text is emitted unchanged apart from a uniform `;` + newline
//! termination. Output lands in a sibling temp file that is renamed onto the
//! destination once the emission is complete, so a failed run never leaves a
//! torn workload file behind.

use super::objects::MatchedWorkload;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub struct WorkloadWriter {}

impl WorkloadWriter {
    pub fn write(workload: &MatchedWorkload, destination: &Path) -> Result<(), WriterError> {
        let staging = staging_path(destination);
        let file = File::create(&staging)
            .map_err(|e| WriterError::Create(staging.clone(), e))?;

        if let Err(e) = WorkloadWriter::emit(file, workload, &staging) {
            let _ = fs::remove_file(&staging);
            return Err(e);
        }

        fs::rename(&staging, destination)
            .map_err(|e| WriterError::Commit(destination.to_path_buf(), e))
    }

    fn emit(file: File, workload: &MatchedWorkload, staging: &Path) -> Result<(), WriterError> {
        let mut out = BufWriter::new(file);
        for statement in workload.statements() {
            //A terminator appended to a trailing line comment would be
            //swallowed, so it gets its own line in that case
            if ends_in_line_comment(&statement.text) {
                writeln!(out, "{}\n;", statement.text)
                    .map_err(|e| WriterError::Write(staging.to_path_buf(), e))?;
            } else {
                writeln!(out, "{};", statement.text)
                    .map_err(|e| WriterError::Write(staging.to_path_buf(), e))?;
            }
        }
        out.flush()
            .map_err(|e| WriterError::Write(staging.to_path_buf(), e))
    }
}

fn ends_in_line_comment(text: &str) -> bool {
    text.rsplit('\n')
        .next()
        .map_or(false, |line| line.contains("--"))
}

fn staging_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    destination.with_file_name(name)
}

#[derive(Debug, Error)]
pub enum WriterError {
    #[error("Unable to create workload output {0}")]
    Create(PathBuf, #[source] std::io::Error),
    #[error("Unable to write workload output {0}")]
    Write(PathBuf, #[source] std::io::Error),
    #[error("Unable to move workload output into place at {0}")]
    Commit(PathBuf, #[source] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::super::objects::{Statement, TableName};
    use super::*;

    #[test]
    fn test_statements_terminated_and_verbatim() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = tempfile::TempDir::new()?;
        let destination = tmp.path().join("workload.sql");

        let mut workload = MatchedWorkload::new();
        workload.push_select(Statement::new("SELECT *\nFROM Orders".to_string(), 0));
        workload.push_matched_write(
            Statement::new("INSERT INTO Orders VALUES (1)".to_string(), 0),
            &TableName::normalize("orders"),
        );

        WorkloadWriter::write(&workload, &destination)?;

        let written = fs::read_to_string(&destination)?;
        assert_eq!(
            written,
            "SELECT *\nFROM Orders;\nINSERT INTO Orders VALUES (1);\n"
        );
        Ok(())
    }

    #[test]
    fn test_no_staging_file_left_behind() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = tempfile::TempDir::new()?;
        let destination = tmp.path().join("workload.sql");

        let workload = MatchedWorkload::new();
        WorkloadWriter::write(&workload, &destination)?;

        assert!(destination.exists());
        assert!(!tmp.path().join("workload.sql.tmp").exists());
        Ok(())
    }

    #[test]
    fn test_trailing_line_comment_gets_own_terminator() -> Result<(), Box<dyn std::error::Error>>
    {
        let tmp = tempfile::TempDir::new()?;
        let destination = tmp.path().join("workload.sql");

        let mut workload = MatchedWorkload::new();
        workload.push_select(Statement::new("SELECT 1 -- watch this".to_string(), 0));

        WorkloadWriter::write(&workload, &destination)?;

        let written = fs::read_to_string(&destination)?;
        assert_eq!(written, "SELECT 1 -- watch this\n;\n");
        Ok(())
    }

    #[test]
    fn test_unwritable_destination() {
        let workload = MatchedWorkload::new();
        let result = WorkloadWriter::write(&workload, Path::new("/nonexistent/dir/workload.sql"));
        assert!(matches!(result, Err(WriterError::Create(_, _))));
    }
}
