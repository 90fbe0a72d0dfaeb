//! 成员管理 (Members)

use super::FetchGuard;
use crate::backend::{Backend, Direction, Query, RowScope};
use crate::error::{ClubError, ClubResult};
use chrono::NaiveDate;
use clubhub_shared::{Member, NewMember};
use uuid::Uuid;

/// Members newest first.
pub fn list_query(scope: RowScope) -> Query {
    Query::new()
        .order("created_at", Direction::Descending)
        .scoped(scope)
}

pub async fn fetch_members<B: Backend>(backend: &B, scope: RowScope) -> ClubResult<Vec<Member>> {
    backend.select::<Member>(&list_query(scope)).await
}

/// Insert `member`, then reload the list under `guard`.
///
/// `Ok(None)`: the member was added but a newer request owns the list.
pub async fn add_member<B: Backend>(
    backend: &B,
    scope: RowScope,
    member: &NewMember,
    guard: &FetchGuard,
) -> ClubResult<Option<Vec<Member>>> {
    let write = async {
        backend.insert::<Member>(member).await?;
        log::info!("added member {}", member.email);
        Ok::<(), ClubError>(())
    };
    guard.write_then_reload(write, fetch_members(backend, scope)).await
}

/// Delete the member with `id`, then reload the list under `guard`.
pub async fn delete_member<B: Backend>(
    backend: &B,
    scope: RowScope,
    id: Uuid,
    guard: &FetchGuard,
) -> ClubResult<Option<Vec<Member>>> {
    let write = async {
        backend.delete::<Member>(id).await?;
        log::info!("deleted member {id}");
        Ok::<(), ClubError>(())
    };
    guard.write_then_reload(write, fetch_members(backend, scope)).await
}

/// Members whose name, email or department contains `needle`, ignoring case.
///
/// A blank needle keeps everything.
pub fn filter_members<'a>(members: &'a [Member], needle: &str) -> Vec<&'a Member> {
    let needle = needle.trim().to_lowercase();
    if needle.is_empty() {
        return members.iter().collect();
    }
    members
        .iter()
        .filter(|m| {
            [&m.name, &m.email, &m.department]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
        })
        .collect()
}

// =========================================================
// 表单 (Form Draft)
// =========================================================

/// Raw form input for a new member.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberDraft {
    pub name: String,
    pub email: String,
    pub department: String,
    /// `YYYY-MM-DD`, as produced by a date input.
    pub joining_date: String,
}

impl MemberDraft {
    pub fn validate(&self, owner: Uuid) -> ClubResult<NewMember> {
        let name = required("Name", &self.name)?;
        let email = required("Email", &self.email)?;
        if !email.contains('@') {
            return Err(ClubError::invalid_input(format!(
                "\"{email}\" is not an email address"
            )));
        }
        let department = required("Department", &self.department)?;
        let raw_date = required("Joining date", &self.joining_date)?;
        let joining_date = NaiveDate::parse_from_str(&raw_date, "%Y-%m-%d").map_err(|e| {
            ClubError::invalid_input(format!("Joining date must be YYYY-MM-DD, got \"{raw_date}\""))
                .with_source(e)
        })?;

        Ok(NewMember {
            owner_id: owner,
            name,
            email,
            department,
            joining_date,
        })
    }
}

/// Trimmed value of a required field.
pub(crate) fn required(label: &str, value: &str) -> ClubResult<String> {
    let value = value.trim();
    if value.is_empty() {
        Err(ClubError::invalid_input(format!("{label} is required")))
    } else {
        Ok(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fake::{ANON_KEY, FakeSupabase, MemoryPersistence, SERVICE_URL, fixed_now};
    use crate::backend::SupabaseBackend;
    use crate::config::BackendConfig;
    use crate::error::ClubErrorKind;
    use chrono::Utc;

    fn member(name: &str, email: &str, department: &str) -> Member {
        Member {
            id: Uuid::new_v4(),
            owner_id: Uuid::nil(),
            name: name.into(),
            email: email.into(),
            department: department.into(),
            joining_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            created_at: Utc::now(),
        }
    }

    fn draft(name: &str, department: &str) -> MemberDraft {
        MemberDraft {
            name: name.into(),
            email: format!("{}@club.test", name.to_lowercase()),
            department: department.into(),
            joining_date: "2024-09-01".into(),
        }
    }

    #[test]
    fn test_filter_matches_department_case_insensitively() {
        let members = vec![
            member("Ann", "ann@club.test", "CS"),
            member("Bo", "bo@club.test", "EE"),
        ];
        let hits = filter_members(&members, "cs");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Ann");
    }

    #[test]
    fn test_filter_covers_name_and_email() {
        let members = vec![
            member("Ann", "ann@club.test", "CS"),
            member("Bo", "robert@mail.test", "EE"),
        ];
        assert_eq!(filter_members(&members, "ROBERT").len(), 1);
        assert_eq!(filter_members(&members, "an")[0].name, "Ann");
        assert_eq!(filter_members(&members, "  ").len(), 2);
        assert!(filter_members(&members, "zz").is_empty());
    }

    #[test]
    fn test_draft_validation() {
        let owner = Uuid::new_v4();
        let ok = MemberDraft {
            name: "  Ann Lee ".into(),
            ..draft("Ann", "CS")
        }
        .validate(owner)
        .unwrap();
        assert_eq!(ok.name, "Ann Lee");
        assert_eq!(ok.owner_id, owner);
        assert_eq!(ok.joining_date, NaiveDate::from_ymd_opt(2024, 9, 1).unwrap());

        let err = MemberDraft {
            department: " ".into(),
            ..draft("Ann", "CS")
        }
        .validate(owner)
        .unwrap_err();
        assert_eq!(err.kind, ClubErrorKind::InvalidInput);
        assert_eq!(err.message(), "Department is required");

        let err = MemberDraft {
            joining_date: "01/09/2024".into(),
            ..draft("Ann", "CS")
        }
        .validate(owner)
        .unwrap_err();
        assert_eq!(err.kind, ClubErrorKind::InvalidInput);

        let err = MemberDraft {
            email: "ann".into(),
            ..draft("Ann", "CS")
        }
        .validate(owner)
        .unwrap_err();
        assert_eq!(err.kind, ClubErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_add_and_delete_reload_the_list() {
        let fake = FakeSupabase::new().with_user("ann@club.test", "pw", None);
        let backend = SupabaseBackend::new(
            BackendConfig::new(SERVICE_URL, ANON_KEY),
            fake.clone(),
            MemoryPersistence::new(),
        )
        .with_clock(fixed_now);
        let owner = backend.sign_in("ann@club.test", "pw").await.unwrap().user_id();
        let scope = RowScope::ClubWide;
        let guard = FetchGuard::new();

        let after_first = add_member(&backend, scope, &draft("Ann", "CS").validate(owner).unwrap(), &guard)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(after_first.len(), 1);

        let after_second = add_member(&backend, scope, &draft("Bo", "EE").validate(owner).unwrap(), &guard)
            .await
            .unwrap()
            .unwrap();
        let names: Vec<&str> = after_second.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["Bo", "Ann"]);

        let remaining = delete_member(&backend, scope, after_second[0].id, &guard)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].name, "Ann");
    }

    #[tokio::test]
    async fn test_owner_scope_hides_other_rows() {
        let fake = FakeSupabase::new()
            .with_user("ann@club.test", "pw", None)
            .with_user("bo@club.test", "pw", None);
        let backend = SupabaseBackend::new(
            BackendConfig::new(SERVICE_URL, ANON_KEY),
            fake.clone(),
            MemoryPersistence::new(),
        )
        .with_clock(fixed_now);

        let ann = backend.sign_in("ann@club.test", "pw").await.unwrap().user_id();
        let guard = FetchGuard::new();
        add_member(&backend, RowScope::ClubWide, &draft("Ann", "CS").validate(ann).unwrap(), &guard)
            .await
            .unwrap();
        let bo = backend.sign_in("bo@club.test", "pw").await.unwrap().user_id();
        add_member(&backend, RowScope::ClubWide, &draft("Bo", "EE").validate(bo).unwrap(), &guard)
            .await
            .unwrap();

        let everyone = fetch_members(&backend, RowScope::ClubWide).await.unwrap();
        assert_eq!(everyone.len(), 2);

        let own = fetch_members(&backend, RowScope::Owner(bo)).await.unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].name, "Bo");
    }
}
