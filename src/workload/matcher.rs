//! The core allocator: interleaves write statements into a select workload
//! under per-table, per-select and global budgets.
//!
//! One pass, greedy, no backtracking. Writes are single-use and consumed in
//! write-file order; the first eligible select wins. When the global budget
//! runs out the remaining selects are still emitted, unmatched, and the pass
//! runs to completion.

use super::objects::{MatchBudget, MatchedWorkload, SelectEntry, TableName, WriteEntry};
use std::collections::{HashMap, VecDeque};

pub struct Matcher {
    budget: MatchBudget,
}

impl Matcher {
    pub fn new(budget: MatchBudget) -> Matcher {
        Matcher { budget }
    }

    /// Runs the single matching pass. Selects keep their input order; each
    /// select's matched writes follow it immediately, in write-file order.
    /// Writes never matched are dropped from the output.
    pub fn match_workload(
        &self,
        selects: Vec<SelectEntry>,
        writes: Vec<WriteEntry>,
    ) -> MatchedWorkload {
        //One FIFO of write indices per target table, one forward cursor each,
        //so no select ever rescans the write sequence.
        let mut pending: HashMap<TableName, VecDeque<usize>> = HashMap::new();
        for (idx, write) in writes.iter().enumerate() {
            pending.entry(write.target.clone()).or_default().push_back(idx);
        }
        let mut writes: Vec<Option<WriteEntry>> = writes.into_iter().map(Some).collect();

        let mut table_budgets: HashMap<TableName, u32> = HashMap::new();
        let mut remaining_total = self.budget.max_total_matches;
        let mut workload = MatchedWorkload::new();

        for select in selects {
            let SelectEntry { statement, tables } = select;
            workload.push_select(statement);

            if tables.is_empty() {
                continue;
            }

            let mut attached = 0;
            while attached < self.budget.max_matches_per_select && remaining_total > 0 {
                //Next eligible write is the smallest unconsumed index across
                //the tables this select reads.
                let mut next: Option<usize> = None;
                for table in &tables {
                    let budget_left = table_budgets
                        .get(table)
                        .copied()
                        .unwrap_or(self.budget.max_writes_per_table);
                    if budget_left == 0 {
                        continue;
                    }
                    if let Some(&idx) = pending.get(table).and_then(VecDeque::front) {
                        if next.map_or(true, |best| idx < best) {
                            next = Some(idx);
                        }
                    }
                }

                let idx = match next {
                    Some(idx) => idx,
                    None => break,
                };
                let write = match writes[idx].take() {
                    Some(write) => write,
                    None => break,
                };

                if let Some(queue) = pending.get_mut(&write.target) {
                    queue.pop_front();
                }
                let budget_left = table_budgets
                    .entry(write.target.clone())
                    .or_insert(self.budget.max_writes_per_table);
                *budget_left -= 1;
                remaining_total -= 1;
                attached += 1;

                workload.push_matched_write(write.statement, &write.target);
            }
        }

        workload
    }
}

#[cfg(test)]
mod tests {
    use super::super::objects::Statement;
    use super::*;
    use std::collections::HashSet;

    fn write(idx: usize, table: &str) -> WriteEntry {
        let statement = Statement::new(format!("INSERT INTO {} VALUES ({})", table, idx), idx);
        WriteEntry::new(statement, TableName::normalize_write_target(table))
    }

    fn select(idx: usize, tables: &[&str]) -> SelectEntry {
        let statement = Statement::new(format!("SELECT {} FROM {}", idx, tables.join(", ")), idx);
        let tables: HashSet<TableName> = tables.iter().map(|t| TableName::normalize(t)).collect();
        SelectEntry::new(statement, tables)
    }

    fn texts(workload: &MatchedWorkload) -> Vec<&str> {
        workload
            .statements()
            .iter()
            .map(|s| s.text.as_str())
            .collect()
    }

    #[test]
    fn test_select_then_matched_writes_in_write_order() {
        let matcher = Matcher::new(MatchBudget::new(10, 10, 10));
        let workload = matcher.match_workload(
            vec![select(0, &["orders"])],
            vec![write(0, "orders"), write(1, "orders")],
        );

        assert_eq!(
            texts(&workload),
            vec![
                "SELECT 0 FROM orders",
                "INSERT INTO orders VALUES (0)",
                "INSERT INTO orders VALUES (1)",
            ]
        );
        assert_eq!(workload.total_matches(), 2);
    }

    #[test]
    fn test_per_table_budget_enforced() {
        let matcher = Matcher::new(MatchBudget::new(2, 5, 100));
        let workload = matcher.match_workload(
            vec![select(0, &["orders"])],
            vec![write(0, "orders"), write(1, "orders"), write(2, "orders")],
        );

        //The first two in write-file order, the third is discarded
        assert_eq!(workload.total_matches(), 2);
        assert_eq!(
            workload.writes_for_table(&TableName::normalize("orders")),
            2
        );
        assert!(!texts(&workload).contains(&"INSERT INTO orders VALUES (2)"));
    }

    #[test]
    fn test_per_select_budget_enforced() {
        let matcher = Matcher::new(MatchBudget::new(10, 1, 100));
        let workload = matcher.match_workload(
            vec![select(0, &["orders"]), select(1, &["orders"])],
            vec![write(0, "orders"), write(1, "orders"), write(2, "orders")],
        );

        assert_eq!(
            texts(&workload),
            vec![
                "SELECT 0 FROM orders",
                "INSERT INTO orders VALUES (0)",
                "SELECT 1 FROM orders",
                "INSERT INTO orders VALUES (1)",
            ]
        );
    }

    #[test]
    fn test_global_budget_exhaustion_emits_remaining_selects() {
        let matcher = Matcher::new(MatchBudget::new(10, 10, 1));
        let workload = matcher.match_workload(
            vec![select(0, &["orders"]), select(1, &["orders"])],
            vec![write(0, "orders"), write(1, "orders")],
        );

        assert_eq!(
            texts(&workload),
            vec![
                "SELECT 0 FROM orders",
                "INSERT INTO orders VALUES (0)",
                "SELECT 1 FROM orders",
            ]
        );
        assert_eq!(workload.selects_emitted(), 2);
        assert_eq!(workload.total_matches(), 1);
    }

    #[test]
    fn test_zero_total_budget_emits_selects_verbatim() {
        let matcher = Matcher::new(MatchBudget::new(10, 10, 0));
        let workload = matcher.match_workload(
            vec![select(0, &["orders"]), select(1, &["lineitem"])],
            vec![write(0, "orders"), write(1, "lineitem")],
        );

        assert_eq!(
            texts(&workload),
            vec!["SELECT 0 FROM orders", "SELECT 1 FROM lineitem"]
        );
        assert_eq!(workload.total_matches(), 0);
    }

    #[test]
    fn test_writes_are_single_use_first_select_wins() {
        let matcher = Matcher::new(MatchBudget::new(10, 10, 100));
        let workload = matcher.match_workload(
            vec![select(0, &["orders"]), select(1, &["orders"])],
            vec![write(0, "orders")],
        );

        assert_eq!(
            texts(&workload),
            vec![
                "SELECT 0 FROM orders",
                "INSERT INTO orders VALUES (0)",
                "SELECT 1 FROM orders",
            ]
        );
    }

    #[test]
    fn test_unreferenced_write_discarded() {
        let matcher = Matcher::new(MatchBudget::new(10, 10, 100));
        let workload = matcher.match_workload(
            vec![select(0, &["orders"])],
            vec![write(0, "nation"), write(1, "orders")],
        );

        assert_eq!(
            texts(&workload),
            vec!["SELECT 0 FROM orders", "INSERT INTO orders VALUES (1)"]
        );
    }

    #[test]
    fn test_select_with_no_tables_emitted_bare() {
        let matcher = Matcher::new(MatchBudget::new(10, 10, 100));
        let workload = matcher.match_workload(
            vec![select(0, &[]), select(1, &["orders"])],
            vec![write(0, "orders")],
        );

        assert_eq!(
            texts(&workload),
            vec![
                "SELECT 0 FROM ",
                "SELECT 1 FROM orders",
                "INSERT INTO orders VALUES (0)",
            ]
        );
    }

    #[test]
    fn test_two_table_select_draws_from_both_up_to_combined_cap() {
        let matcher = Matcher::new(MatchBudget::new(10, 3, 100));
        let workload = matcher.match_workload(
            vec![select(0, &["orders", "customer"])],
            vec![
                write(0, "orders"),
                write(1, "customer"),
                write(2, "orders"),
                write(3, "customer"),
            ],
        );

        //Combined cap of 3, drawn in write-file order across both tables
        assert_eq!(
            texts(&workload),
            vec![
                "SELECT 0 FROM orders, customer",
                "INSERT INTO orders VALUES (0)",
                "INSERT INTO customer VALUES (1)",
                "INSERT INTO orders VALUES (2)",
            ]
        );
    }

    #[test]
    fn test_earlier_select_wins_per_table_budget() {
        let matcher = Matcher::new(MatchBudget::new(1, 10, 100));
        let workload = matcher.match_workload(
            vec![select(0, &["orders"]), select(1, &["orders"])],
            vec![write(0, "orders"), write(1, "orders")],
        );

        assert_eq!(
            texts(&workload),
            vec![
                "SELECT 0 FROM orders",
                "INSERT INTO orders VALUES (0)",
                "SELECT 1 FROM orders",
            ]
        );
    }
}
