/// Capacity constraints for one matching pass.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MatchBudget {
    /// Cap on how many matched writes may target any single table.
    pub max_writes_per_table: u32,
    /// Cap on how many writes may be attached to one select.
    pub max_matches_per_select: u32,
    /// Cap on the total writes consumed across the whole run.
    pub max_total_matches: u32,
}

impl MatchBudget {
    pub fn new(
        max_writes_per_table: u32,
        max_matches_per_select: u32,
        max_total_matches: u32,
    ) -> MatchBudget {
        MatchBudget {
            max_writes_per_table,
            max_matches_per_select,
            max_total_matches,
        }
    }
}
