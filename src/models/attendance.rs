use serde::{Deserialize, Serialize};

/// Whether a member's time at an event counts towards their service minutes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "attendance_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    /// The member attended the event
    Confirmed,
    /// The member was excused from the event
    NotNeeded,
    /// The member signed up but hasn't been confirmed yet
    Pending,
}

impl AttendanceStatus {
    /// The counter this status accrues minutes towards, if any.
    pub fn counter(self) -> Option<ServiceCounter> {
        match self {
            AttendanceStatus::Confirmed => Some(ServiceCounter::Minutes),
            AttendanceStatus::NotNeeded => Some(ServiceCounter::MinutesNotNeeded),
            AttendanceStatus::Pending => None,
        }
    }
}

/// One of the two service minute totals kept on each member.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ServiceCounter {
    Minutes,
    MinutesNotNeeded,
}

impl ServiceCounter {
    pub fn column(self) -> &'static str {
        match self {
            ServiceCounter::Minutes => "minutes",
            ServiceCounter::MinutesNotNeeded => "minutes_not_needed",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Attendance {
    /// The ID of the member this attendance belongs to
    pub member_id: i64,
    /// The ID of the event this attendance is for
    pub event_id: i64,
    /// Whether the attendance counts
    pub status: AttendanceStatus,
}

#[derive(Debug, Deserialize)]
pub struct AttendanceForm {
    pub status: AttendanceStatus,
}
