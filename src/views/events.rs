//! 活动与签到 (Events & Attendance)

use super::FetchGuard;
use super::members::required;
use crate::backend::{Backend, Direction, Query, RowScope};
use crate::error::{ClubError, ClubResult};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use clubhub_shared::{AttendanceRecord, Event, Member, NewAttendance, NewEvent};
use uuid::Uuid;

pub const ALREADY_MARKED: &str = "Attendance already marked for this member";
pub const NO_MEMBERS: &str = "Add members first before marking attendance";

/// Events by date, each with its attendance in the order it was marked.
pub fn list_query(scope: RowScope) -> Query {
    Query::new()
        .order("date", Direction::Ascending)
        .order_embedded("attendance", "marked_at", Direction::Ascending)
        .scoped(scope)
}

pub async fn fetch_events<B: Backend>(backend: &B, scope: RowScope) -> ClubResult<Vec<Event>> {
    backend.select::<Event>(&list_query(scope)).await
}

/// Insert `event`, then reload the list under `guard`.
///
/// `Ok(None)`: the event was created but a newer request owns the list.
pub async fn create_event<B: Backend>(
    backend: &B,
    scope: RowScope,
    event: &NewEvent,
    guard: &FetchGuard,
) -> ClubResult<Option<Vec<Event>>> {
    let write = async {
        backend.insert::<Event>(event).await?;
        log::info!("created event {:?} on {}", event.title, event.date);
        Ok::<(), ClubError>(())
    };
    guard.write_then_reload(write, fetch_events(backend, scope)).await
}

/// Delete the event with `id`, then reload the list under `guard`.
pub async fn delete_event<B: Backend>(
    backend: &B,
    scope: RowScope,
    id: Uuid,
    guard: &FetchGuard,
) -> ClubResult<Option<Vec<Event>>> {
    let write = async {
        backend.delete::<Event>(id).await?;
        log::info!("deleted event {id}");
        Ok::<(), ClubError>(())
    };
    guard.write_then_reload(write, fetch_events(backend, scope)).await
}

/// Validate the picker selection against the loaded members.
pub fn pick_member(members: &[Member], selected: Option<Uuid>) -> ClubResult<Uuid> {
    if members.is_empty() {
        return Err(ClubError::invalid_input(NO_MEMBERS));
    }
    let selected = selected.ok_or_else(|| ClubError::invalid_input("Choose a member first"))?;
    if members.iter().any(|m| m.id == selected) {
        Ok(selected)
    } else {
        Err(ClubError::invalid_input("The selected member no longer exists"))
    }
}

/// Record `member_id` as attending `event`, then reload the list under `guard`.
///
/// A member already listed on the loaded event is rejected without a request;
/// a duplicate caught by the database gets the same message.
pub async fn mark_attendance<B: Backend>(
    backend: &B,
    scope: RowScope,
    event: &Event,
    member_id: Uuid,
    guard: &FetchGuard,
) -> ClubResult<Option<Vec<Event>>> {
    guard
        .write_then_reload(
            record_attendance(backend, event, member_id),
            fetch_events(backend, scope),
        )
        .await
}

async fn record_attendance<B: Backend>(backend: &B, event: &Event, member_id: Uuid) -> ClubResult<()> {
    if event.has_attendee(member_id) {
        return Err(ClubError::constraint_violation(ALREADY_MARKED)
            .in_op_with("attendance.mark", event.id.to_string()));
    }

    let mark = NewAttendance {
        event_id: event.id,
        member_id,
    };
    match backend.insert::<AttendanceRecord>(&mark).await {
        Ok(()) => {
            log::info!("marked {member_id} at event {}", event.id);
            Ok(())
        }
        Err(e) if e.is_constraint_violation() => Err(ClubError::constraint_violation(ALREADY_MARKED)
            .with_source(e)
            .in_op_with("attendance.mark", event.id.to_string())),
        Err(e) => Err(e),
    }
}

/// Split into (upcoming, past). An event dated exactly `now` is upcoming.
pub fn partition_events(events: &[Event], now: DateTime<Utc>) -> (Vec<&Event>, Vec<&Event>) {
    events.iter().partition(|e| e.is_upcoming(now))
}

// =========================================================
// 表单 (Form Draft)
// =========================================================

/// Raw form input for a new event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventDraft {
    pub title: String,
    /// Value of a `datetime-local` input, e.g. `2025-06-10T18:30`.
    pub date: String,
    pub description: String,
    pub venue: String,
}

impl EventDraft {
    /// `tz` is the zone the user typed the date in.
    pub fn validate<Tz: TimeZone>(&self, owner: Uuid, tz: &Tz) -> ClubResult<NewEvent> {
        let title = required("Title", &self.title)?;
        let raw_date = required("Date", &self.date)?;
        let venue = required("Venue", &self.venue)?;

        let naive = ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(&raw_date, fmt).ok())
            .ok_or_else(|| {
                ClubError::invalid_input(format!("\"{raw_date}\" is not a valid date and time"))
            })?;
        let date = tz
            .from_local_datetime(&naive)
            .earliest()
            .ok_or_else(|| {
                ClubError::invalid_input(format!("{raw_date} does not exist in the local time zone"))
            })?
            .with_timezone(&Utc);

        Ok(NewEvent {
            owner_id: owner,
            title,
            date,
            description: self.description.trim().to_string(),
            venue,
        })
    }
}
