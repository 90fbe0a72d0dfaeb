//! 仪表盘统计 (Dashboard)

use super::{events, members};
use crate::backend::{Backend, RowScope};
use crate::error::ClubResult;
use chrono::{DateTime, Utc};
use clubhub_shared::{Event, Member};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DashboardStats {
    pub total_members: usize,
    pub total_events: usize,
    /// Events dated at or after `now`.
    pub upcoming_events: usize,
    /// Distinct department strings, compared exactly.
    pub departments: usize,
}

impl DashboardStats {
    pub fn compute(members: &[Member], events: &[Event], now: DateTime<Utc>) -> Self {
        let departments: HashSet<&str> = members.iter().map(|m| m.department.as_str()).collect();
        Self {
            total_members: members.len(),
            total_events: events.len(),
            upcoming_events: events.iter().filter(|e| e.is_upcoming(now)).count(),
            departments: departments.len(),
        }
    }
}

/// Fetch members and events concurrently and derive the counts.
pub async fn load_stats<B: Backend>(
    backend: &B,
    scope: RowScope,
    now: DateTime<Utc>,
) -> ClubResult<DashboardStats> {
    let (members, events) = futures::try_join!(
        members::fetch_members(backend, scope),
        events::fetch_events(backend, scope)
    )?;
    Ok(DashboardStats::compute(&members, &events, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fake::{ANON_KEY, FakeSupabase, MemoryPersistence, SERVICE_URL, fixed_now};
    use crate::backend::{Facade, SupabaseBackend};
    use crate::config::BackendConfig;
    use crate::config::tests::MockEnv;
    use crate::request::MockHttpClient;
    use chrono::{Duration, NaiveDate};
    use serde_json::json;
    use uuid::Uuid;

    fn member(department: &str) -> Member {
        Member {
            id: Uuid::new_v4(),
            owner_id: Uuid::nil(),
            name: "x".into(),
            email: "x@club.test".into(),
            department: department.into(),
            joining_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            created_at: fixed_now(),
        }
    }

    fn event(date: DateTime<Utc>) -> Event {
        Event {
            id: Uuid::new_v4(),
            owner_id: Uuid::nil(),
            title: "e".into(),
            date,
            description: String::new(),
            venue: String::new(),
            attendance: Vec::new(),
        }
    }

    #[test]
    fn test_counts() {
        let now = fixed_now();
        let members = vec![member("CS"), member("EE"), member("CS"), member("cs")];
        let events = vec![
            event(now - Duration::days(1)),
            event(now),
            event(now + Duration::days(2)),
        ];

        let stats = DashboardStats::compute(&members, &events, now);
        assert_eq!(
            stats,
            DashboardStats {
                total_members: 4,
                total_events: 3,
                upcoming_events: 2,
                departments: 3,
            }
        );
    }

    #[test]
    fn test_empty_lists() {
        assert_eq!(DashboardStats::compute(&[], &[], fixed_now()), DashboardStats::default());
    }

    #[tokio::test]
    async fn test_load_stats_from_service() {
        let fake = FakeSupabase::new();
        let owner = Uuid::new_v4();
        for department in ["CS", "EE", "CS"] {
            fake.seed(
                "members",
                json!({
                    "id": Uuid::new_v4(), "user_id": owner, "name": "m", "email": "m@club.test",
                    "department": department, "joining_date": "2024-01-01",
                    "created_at": "2025-01-01T00:00:00+00:00"
                }),
            );
        }
        for date in ["2025-05-01 10:00:00", "2025-06-01T12:00:00+00:00", "2025-07-01"] {
            fake.seed(
                "events",
                json!({
                    "id": Uuid::new_v4(), "user_id": owner, "title": "e", "date": date,
                    "description": "", "venue": "Hall"
                }),
            );
        }
        let backend = SupabaseBackend::new(
            BackendConfig::new(SERVICE_URL, ANON_KEY),
            fake.clone(),
            MemoryPersistence::new(),
        );

        let stats = load_stats(&backend, RowScope::ClubWide, fixed_now()).await.unwrap();

        assert_eq!(stats.total_members, 3);
        assert_eq!(stats.departments, 2);
        assert_eq!(stats.total_events, 3);
        assert_eq!(stats.upcoming_events, 2);
        assert_eq!(fake.request_count(), 2);
    }

    #[tokio::test]
    async fn test_unconfigured_dashboard_is_empty() {
        let mock = MockHttpClient::new();
        let facade = Facade::new(
            BackendConfig::from_env(&MockEnv::new()),
            mock.clone(),
            MemoryPersistence::new(),
        );

        let stats = load_stats(&facade, RowScope::ClubWide, fixed_now()).await.unwrap();
        assert_eq!(stats, DashboardStats::default());
        assert_eq!(mock.request_count(), 0);
    }
}
