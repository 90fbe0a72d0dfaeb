use crate::config::ScopeMode;
use clubhub_shared::{Session, Table};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    fn as_str(&self) -> &'static str {
        match self {
            Direction::Ascending => "asc",
            Direction::Descending => "desc",
        }
    }
}

/// Which rows a view lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowScope {
    #[default]
    ClubWide,
    /// Only rows whose `user_id` is this identity.
    Owner(Uuid),
}

impl RowScope {
    pub fn for_session(mode: ScopeMode, session: &Session) -> Self {
        match mode {
            ScopeMode::ClubWide => RowScope::ClubWide,
            ScopeMode::PerOwner => RowScope::Owner(session.user_id()),
        }
    }
}

/// A read against one table, rendered as a data API query string.
///
/// Filters are restricted to UUID equality, so values never need escaping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    select: Option<String>,
    filters: Vec<(String, Uuid)>,
    order: Vec<(String, Direction)>,
    embedded_order: Vec<(String, String, Direction)>,
    limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the table's default column list.
    pub fn select(mut self, columns: impl Into<String>) -> Self {
        self.select = Some(columns.into());
        self
    }

    pub fn eq(mut self, column: impl Into<String>, value: Uuid) -> Self {
        self.filters.push((column.into(), value));
        self
    }

    pub fn order(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.order.push((column.into(), direction));
        self
    }

    /// Order the rows of an embedded relation, e.g. `attendance` inside `events`.
    pub fn order_embedded(
        mut self,
        relation: impl Into<String>,
        column: impl Into<String>,
        direction: Direction,
    ) -> Self {
        self.embedded_order
            .push((relation.into(), column.into(), direction));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn scoped(self, scope: RowScope) -> Self {
        match scope {
            RowScope::ClubWide => self,
            RowScope::Owner(owner) => self.eq("user_id", owner),
        }
    }

    pub fn to_query_string<T: Table>(&self) -> String {
        let mut parts = vec![format!(
            "select={}",
            self.select.as_deref().unwrap_or(T::DEFAULT_SELECT)
        )];

        for (column, value) in &self.filters {
            parts.push(format!("{column}=eq.{value}"));
        }

        if !self.order.is_empty() {
            let order = self
                .order
                .iter()
                .map(|(column, dir)| format!("{column}.{}", dir.as_str()))
                .collect::<Vec<_>>()
                .join(",");
            parts.push(format!("order={order}"));
        }

        for (relation, column, dir) in &self.embedded_order {
            parts.push(format!("{relation}.order={column}.{}", dir.as_str()));
        }

        if let Some(limit) = self.limit {
            parts.push(format!("limit={limit}"));
        }

        parts.join("&")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clubhub_shared::{Event, Member};

    #[test]
    fn test_default_select_comes_from_table() {
        assert_eq!(Query::new().to_query_string::<Member>(), "select=*");
        assert_eq!(Query::new().to_query_string::<Event>(), "select=*,attendance(*)");
        assert_eq!(
            Query::new().select("department").to_query_string::<Member>(),
            "select=department"
        );
    }

    #[test]
    fn test_full_query_string() {
        let owner = Uuid::nil();
        let query = Query::new()
            .order("date", Direction::Ascending)
            .order_embedded("attendance", "marked_at", Direction::Ascending)
            .scoped(RowScope::Owner(owner))
            .limit(5);
        assert_eq!(
            query.to_query_string::<Event>(),
            "select=*,attendance(*)&user_id=eq.00000000-0000-0000-0000-000000000000&order=date.asc&attendance.order=marked_at.asc&limit=5"
        );
    }

    #[test]
    fn test_club_wide_scope_adds_no_filter() {
        let query = Query::new().scoped(RowScope::ClubWide);
        assert_eq!(query, Query::new());
    }
}
