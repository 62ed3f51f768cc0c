mod refresh_tables;
pub use refresh_tables::ColumnKind;
pub use refresh_tables::RefreshTable;
pub use refresh_tables::LINEITEM;
pub use refresh_tables::ORDERS;

mod reserved_words;
pub use reserved_words::is_reserved_word;
