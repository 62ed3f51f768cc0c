pub mod extractor;
pub use extractor::extract_tables;
pub use extractor::extract_write_target;

pub mod loader;
pub use loader::LoaderError;
pub use loader::StatementLoader;
pub use loader::StatementSplitter;

pub mod matcher;
pub use matcher::Matcher;

pub mod objects;

pub mod writer;
pub use writer::WorkloadWriter;
pub use writer::WriterError;

use self::objects::{MatchBudget, SelectEntry, WriteEntry};
use std::path::Path;
use thiserror::Error;

/// Counters reported after a matching run.
#[derive(Copy, Clone, Debug)]
pub struct MatchSummary {
    pub selects_emitted: u32,
    pub writes_loaded: usize,
    pub writes_matched: u32,
    pub writes_discarded: usize,
}

/// Wires the stages together: load both sources, tag statements with their
/// tables, run the matching pass, serialize the interleaved result.
pub struct WorkloadPipeline {
    budget: MatchBudget,
}

impl WorkloadPipeline {
    pub fn new(budget: MatchBudget) -> WorkloadPipeline {
        WorkloadPipeline { budget }
    }

    pub fn run(
        &self,
        select_file: &Path,
        write_file: &Path,
        output_file: &Path,
    ) -> Result<MatchSummary, WorkloadError> {
        //Load them
        let select_statements = StatementLoader::load(select_file)?;
        let write_statements = StatementLoader::load(write_file)?;
        info!(
            "Found {} select statements and {} write statements.",
            select_statements.len(),
            write_statements.len()
        );

        //Tag selects with the tables they read
        let selects: Vec<SelectEntry> = select_statements
            .into_iter()
            .map(|statement| {
                let tables = extract_tables(&statement);
                SelectEntry::new(statement, tables)
            })
            .collect();

        //Tag writes with their target table, dropping what can't be resolved
        let mut writes = Vec::new();
        for statement in write_statements {
            if !statement.kind.is_write() {
                warn!(
                    "Skipping non-write statement {} in {}",
                    statement.position,
                    write_file.display()
                );
                continue;
            }
            match extract_write_target(&statement) {
                Some(target) => writes.push(WriteEntry::new(statement, target)),
                None => warn!(
                    "Skipping write statement {} with undetermined target table",
                    statement.position
                ),
            }
        }
        let writes_loaded = writes.len();

        //Match them
        let workload = Matcher::new(self.budget).match_workload(selects, writes);

        //Serialize the interleaved workload
        WorkloadWriter::write(&workload, output_file)?;

        let summary = MatchSummary {
            selects_emitted: workload.selects_emitted(),
            writes_loaded,
            writes_matched: workload.total_matches(),
            writes_discarded: writes_loaded - workload.total_matches() as usize,
        };
        info!(
            "Matched {} of {} write statements across {} selects, discarded {}.",
            summary.writes_matched,
            summary.writes_loaded,
            summary.selects_emitted,
            summary.writes_discarded
        );
        Ok(summary)
    }
}

#[derive(Debug, Error)]
pub enum WorkloadError {
    #[error(transparent)]
    LoaderError(#[from] LoaderError),
    #[error(transparent)]
    WriterError(#[from] WriterError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_end_to_end_match() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = TempDir::new()?;
        let select_file = tmp.path().join("selects.sql");
        let write_file = tmp.path().join("writes.sql");
        let output_file = tmp.path().join("workload.sql");

        fs::write(
            &select_file,
            "SELECT count(*) FROM orders;\nSELECT count(*) FROM nation;\n",
        )?;
        fs::write(
            &write_file,
            "INSERT INTO orders VALUES (1);\n\
             INSERT INTO lineitem VALUES (2);\n\
             INSERT INTO orders VALUES (3);\n",
        )?;

        let pipeline = WorkloadPipeline::new(MatchBudget::new(5, 5, 100));
        let summary = pipeline.run(&select_file, &write_file, &output_file)?;

        assert_eq!(summary.selects_emitted, 2);
        assert_eq!(summary.writes_matched, 2);
        assert_eq!(summary.writes_discarded, 1);

        let written = fs::read_to_string(&output_file)?;
        assert_eq!(
            written,
            "SELECT count(*) FROM orders;\n\
             INSERT INTO orders VALUES (1);\n\
             INSERT INTO orders VALUES (3);\n\
             SELECT count(*) FROM nation;\n"
        );
        Ok(())
    }

    #[test]
    fn test_non_write_statements_skipped() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = TempDir::new()?;
        let select_file = tmp.path().join("selects.sql");
        let write_file = tmp.path().join("writes.sql");
        let output_file = tmp.path().join("workload.sql");

        fs::write(&select_file, "SELECT count(*) FROM orders;\n")?;
        fs::write(
            &write_file,
            "BEGIN TRANSACTION;\nINSERT INTO orders VALUES (1);\nCOMMIT;\n",
        )?;

        let pipeline = WorkloadPipeline::new(MatchBudget::new(5, 5, 100));
        let summary = pipeline.run(&select_file, &write_file, &output_file)?;

        assert_eq!(summary.writes_loaded, 1);
        assert_eq!(summary.writes_matched, 1);

        let written = fs::read_to_string(&output_file)?;
        assert!(!written.contains("BEGIN"));
        assert!(!written.contains("COMMIT"));
        Ok(())
    }

    #[test]
    fn test_missing_select_file_fails() {
        let tmp = TempDir::new().unwrap();
        let pipeline = WorkloadPipeline::new(MatchBudget::new(5, 5, 100));
        let result = pipeline.run(
            &tmp.path().join("missing.sql"),
            &tmp.path().join("writes.sql"),
            &tmp.path().join("out.sql"),
        );
        assert!(matches!(
            result,
            Err(WorkloadError::LoaderError(LoaderError::Unreadable(_, _)))
        ));
    }
}
