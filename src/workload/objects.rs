mod budget;
pub use budget::MatchBudget;

mod entries;
pub use entries::SelectEntry;
pub use entries::WriteEntry;

mod matched_workload;
pub use matched_workload::MatchedWorkload;

mod statement;
pub use statement::Statement;
pub use statement::StatementKind;

mod table_name;
pub use table_name::TableName;
