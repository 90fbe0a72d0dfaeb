use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod date;
pub mod table;

pub use table::Table;

// =========================================================
// 常量定义 (Constants)
// =========================================================

pub const TABLE_MEMBERS: &str = "members";
pub const TABLE_EVENTS: &str = "events";
pub const TABLE_ATTENDANCE: &str = "attendance";

// =========================================================
// 身份与会话 (Identity & Session)
// =========================================================

/// The authenticated identity behind a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl Identity {
    /// Name shown in the navigation bar: display name, falling back to email.
    pub fn label(&self) -> &str {
        match self.display_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.email,
        }
    }
}

/// A live session issued by the auth service.
///
/// Carries the tokens needed to talk to the data API on behalf of
/// [`Session::identity`]. Persisted as JSON between page loads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub identity: Identity,
    pub access_token: String,
    pub refresh_token: String,
    /// Unix seconds.
    pub expires_at: i64,
}

impl Session {
    pub fn user_id(&self) -> Uuid {
        self.identity.id
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now.timestamp()
    }

    /// True if the access token expires within `margin_secs` of `now`.
    pub fn expires_within(&self, now: DateTime<Utc>, margin_secs: i64) -> bool {
        self.expires_at - now.timestamp() <= margin_secs
    }
}

// =========================================================
// 领域模型 (Domain Models)
// =========================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: Uuid,
    #[serde(rename = "user_id")]
    pub owner_id: Uuid,
    pub name: String,
    pub email: String,
    pub department: String,
    pub joining_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for `members`; `id` and `created_at` are assigned by the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMember {
    #[serde(rename = "user_id")]
    pub owner_id: Uuid,
    pub name: String,
    pub email: String,
    pub department: String,
    pub joining_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: Uuid,
    pub event_id: Uuid,
    pub member_id: Uuid,
    #[serde(with = "date::lenient")]
    pub marked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAttendance {
    pub event_id: Uuid,
    pub member_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    #[serde(rename = "user_id")]
    pub owner_id: Uuid,
    pub title: String,
    #[serde(with = "date::lenient")]
    pub date: DateTime<Utc>,
    pub description: String,
    pub venue: String,
    /// Embedded `attendance` rows, present when the query selects them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attendance: Vec<AttendanceRecord>,
}

impl Event {
    /// Upcoming is inclusive: an event dated exactly `now` has not passed yet.
    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.date >= now
    }

    pub fn has_attendee(&self, member_id: Uuid) -> bool {
        self.attendance.iter().any(|a| a.member_id == member_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEvent {
    #[serde(rename = "user_id")]
    pub owner_id: Uuid,
    pub title: String,
    pub date: DateTime<Utc>,
    pub description: String,
    pub venue: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn identity(display_name: Option<&str>) -> Identity {
        Identity {
            id: Uuid::nil(),
            email: "ann@club.org".into(),
            display_name: display_name.map(str::to_string),
        }
    }

    #[test]
    fn test_identity_label_falls_back_to_email() {
        assert_eq!(identity(Some("Ann")).label(), "Ann");
        assert_eq!(identity(Some("  ")).label(), "ann@club.org");
        assert_eq!(identity(None).label(), "ann@club.org");
    }

    #[test]
    fn test_member_row_uses_wire_column_names() {
        let row = serde_json::json!({
            "id": "6f1c1d1e-8a61-4d7e-9d4c-1b0c2f6d9a10",
            "user_id": "0b6f5c1d-4c2a-4f33-8d9e-5a7b3e2c1f00",
            "name": "Ann",
            "email": "ann@club.org",
            "department": "CS",
            "joining_date": "2024-09-01",
            "created_at": "2024-09-01T10:15:00.123456+00:00"
        });
        let member: Member = serde_json::from_value(row).unwrap();
        assert_eq!(member.name, "Ann");
        assert_eq!(member.joining_date, NaiveDate::from_ymd_opt(2024, 9, 1).unwrap());

        let payload = NewMember {
            owner_id: member.owner_id,
            name: member.name.clone(),
            email: member.email.clone(),
            department: member.department.clone(),
            joining_date: member.joining_date,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["user_id"], "0b6f5c1d-4c2a-4f33-8d9e-5a7b3e2c1f00");
        assert!(json.get("id").is_none());
    }

    #[test]
    fn test_event_upcoming_is_inclusive() {
        let now = Utc.with_ymd_and_hms(2025, 5, 1, 18, 0, 0).unwrap();
        let mut event = Event {
            id: Uuid::nil(),
            owner_id: Uuid::nil(),
            title: "Hack night".into(),
            date: now,
            description: String::new(),
            venue: "Lab 2".into(),
            attendance: Vec::new(),
        };
        assert!(event.is_upcoming(now));
        event.date = now - chrono::Duration::seconds(1);
        assert!(!event.is_upcoming(now));
    }

    #[test]
    fn test_event_without_embedded_attendance() {
        let row = serde_json::json!({
            "id": "6f1c1d1e-8a61-4d7e-9d4c-1b0c2f6d9a10",
            "user_id": "0b6f5c1d-4c2a-4f33-8d9e-5a7b3e2c1f00",
            "title": "AGM",
            "date": "2025-03-01T18:00:00",
            "description": "Annual meeting",
            "venue": "Hall"
        });
        let event: Event = serde_json::from_value(row).unwrap();
        assert!(event.attendance.is_empty());
        assert_eq!(event.date, Utc.with_ymd_and_hms(2025, 3, 1, 18, 0, 0).unwrap());
    }

    #[test]
    fn test_session_expiry() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let session = Session {
            identity: identity(None),
            access_token: "a".into(),
            refresh_token: "r".into(),
            expires_at: now.timestamp() + 120,
        };
        assert!(!session.is_expired(now));
        assert!(session.expires_within(now, 300));
        assert!(!session.expires_within(now, 60));
        assert!(session.is_expired(now + chrono::Duration::seconds(120)));
    }
}
