use std::collections::HashSet;

use super::{Statement, TableName};

/// A select statement together with the tables it was observed to read.
#[derive(Clone, Debug)]
pub struct SelectEntry {
    pub statement: Statement,
    pub tables: HashSet<TableName>,
}

impl SelectEntry {
    pub fn new(statement: Statement, tables: HashSet<TableName>) -> SelectEntry {
        SelectEntry { statement, tables }
    }
}

/// A write statement together with its extracted target table.
#[derive(Clone, Debug)]
pub struct WriteEntry {
    pub statement: Statement,
    pub target: TableName,
}

impl WriteEntry {
    pub fn new(statement: Statement, target: TableName) -> WriteEntry {
        WriteEntry { statement, target }
    }
}
