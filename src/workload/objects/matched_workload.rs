use std::collections::HashMap;

use super::{Statement, TableName};

/// The interleaved output sequence plus the bookkeeping the budgets are
/// enforced against. Grows monotonically while selects are processed in file
/// order; the matcher hands it back by value once the pass is finished.
#[derive(Clone, Debug, Default)]
pub struct MatchedWorkload {
    statements: Vec<Statement>,
    writes_per_table: HashMap<TableName, u32>,
    total_matches: u32,
    selects_emitted: u32,
}

impl MatchedWorkload {
    pub fn new() -> MatchedWorkload {
        MatchedWorkload::default()
    }

    pub fn push_select(&mut self, statement: Statement) {
        self.selects_emitted += 1;
        self.statements.push(statement);
    }

    pub fn push_matched_write(&mut self, statement: Statement, target: &TableName) {
        *self.writes_per_table.entry(target.clone()).or_insert(0) += 1;
        self.total_matches += 1;
        self.statements.push(statement);
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn writes_for_table(&self, table: &TableName) -> u32 {
        self.writes_per_table.get(table).copied().unwrap_or(0)
    }

    pub fn total_matches(&self) -> u32 {
        self.total_matches
    }

    pub fn selects_emitted(&self) -> u32 {
        self.selects_emitted
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}
