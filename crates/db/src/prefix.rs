use clientele_core::PrefixFilter;

pub const FIRST_NAME_COLUMN: &str = "first_name";

/// Disjunctive `LIKE` predicate for a [`PrefixFilter`].
///
/// The SQL text holds only numbered placeholders (`?1`, `?2`, ...); each
/// prefix becomes a separate bound pattern `"{prefix}%"`, in filter order.
/// `%` and `_` inside a prefix are not escaped and keep their wildcard meaning.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrefixPredicate {
    sql: String,
    patterns: Vec<String>,
}

impl PrefixPredicate {
    pub fn build(filter: &PrefixFilter) -> Self {
        Self::for_column(FIRST_NAME_COLUMN, filter)
    }

    pub fn for_column(column: &str, filter: &PrefixFilter) -> Self {
        let sql = (1..=filter.len())
            .map(|position| format!("{column} LIKE ?{position}"))
            .collect::<Vec<_>>()
            .join(" OR ");
        let patterns = filter.iter().map(|prefix| format!("{prefix}%")).collect();

        Self { sql, patterns }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}
