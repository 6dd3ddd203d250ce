//! Storage for members, events, attendance and sessions.
//!
//! Everything above this module talks to storage through the [Database] trait,
//! so that request handling and the service minute bookkeeping don't depend on
//! a live PostgreSQL server. [PgDatabase](postgres::PgDatabase) is the real
//! implementation.

use async_trait::async_trait;

use crate::error::AmbassadorResult;
use crate::models::attendance::{Attendance, AttendanceStatus, ServiceCounter};
use crate::models::event::{Event, EventFields};
use crate::models::member::{Member, MemberAttributes, MemberProfile, NewMember};

pub mod postgres;

pub use self::postgres::{connect_to_db, PgDatabase};

#[async_trait]
pub trait Database: Send + Sync {
    async fn member_with_id(&self, id: i64) -> AmbassadorResult<Option<Member>>;

    async fn member_with_email(&self, email: &str) -> AmbassadorResult<Option<Member>>;

    async fn all_members(&self) -> AmbassadorResult<Vec<Member>>;

    /// Fails with [BadRequest](crate::error::AmbassadorError::BadRequest) if the email is taken.
    async fn insert_member(&self, new_member: &NewMember) -> AmbassadorResult<Member>;

    async fn update_profile(&self, id: i64, profile: &MemberProfile) -> AmbassadorResult<()>;

    async fn update_attributes(
        &self,
        id: i64,
        attributes: MemberAttributes,
    ) -> AmbassadorResult<()>;

    async fn update_pass_hash(&self, id: i64, pass_hash: &str) -> AmbassadorResult<()>;

    /// Adds `minutes` (which may be negative) to one of a member's counters.
    ///
    /// Must be a single relative write so concurrent adjustments don't clobber each other.
    async fn add_service_minutes(
        &self,
        member_id: i64,
        counter: ServiceCounter,
        minutes: i64,
    ) -> AmbassadorResult<()>;

    /// Deletes the member row and clears their `created_by` references.
    ///
    /// Callers remove the member's sessions and attendance first.
    async fn delete_member(&self, id: i64) -> AmbassadorResult<()>;

    async fn event_with_id(&self, id: i64) -> AmbassadorResult<Option<Event>>;

    async fn all_events(&self) -> AmbassadorResult<Vec<Event>>;

    async fn insert_event(
        &self,
        fields: &EventFields,
        created_by: Option<i64>,
    ) -> AmbassadorResult<Event>;

    /// Overwrites an existing event and returns the stored row.
    async fn update_event(&self, id: i64, fields: &EventFields) -> AmbassadorResult<Event>;

    async fn delete_event(&self, id: i64) -> AmbassadorResult<()>;

    async fn attendance(
        &self,
        member_id: i64,
        event_id: i64,
    ) -> AmbassadorResult<Option<Attendance>>;

    async fn attendance_for_event(&self, event_id: i64) -> AmbassadorResult<Vec<Attendance>>;

    /// Fails with [BadRequest](crate::error::AmbassadorError::BadRequest) if the member
    /// already has attendance for the event.
    async fn insert_attendance(&self, attendance: &Attendance) -> AmbassadorResult<()>;

    async fn update_attendance_status(
        &self,
        member_id: i64,
        event_id: i64,
        status: AttendanceStatus,
    ) -> AmbassadorResult<()>;

    async fn delete_attendance(&self, member_id: i64, event_id: i64) -> AmbassadorResult<()>;

    async fn delete_attendance_for_event(&self, event_id: i64) -> AmbassadorResult<()>;

    async fn delete_attendance_for_member(&self, member_id: i64) -> AmbassadorResult<()>;

    async fn insert_session(&self, member_id: i64, token: &str) -> AmbassadorResult<()>;

    async fn session_member(&self, token: &str) -> AmbassadorResult<Option<i64>>;

    async fn delete_session(&self, token: &str) -> AmbassadorResult<()>;

    async fn delete_sessions_for_member(&self, member_id: i64) -> AmbassadorResult<()>;
}
