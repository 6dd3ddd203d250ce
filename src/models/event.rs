use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::{AmbassadorError, AmbassadorResult};
use crate::models::member::Member;

#[derive(Clone, Debug, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// The ID of the event
    pub id: i64,
    /// The name of the event
    pub title: String,
    /// When the event starts
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: OffsetDateTime,
    /// When the event ends
    #[serde(with = "time::serde::rfc3339")]
    pub end_time: OffsetDateTime,
    /// General information or details about this event
    pub description: Option<String>,
    /// Where this event will be held
    pub location: String,
    /// Whether this event is visible to visitors who aren't logged in
    pub public: bool,
    /// Whether this event is a meeting, which doesn't count towards service minutes
    pub meeting: bool,
    /// The member who created this event, if they still exist
    pub created_by: Option<i64>,
}

impl Event {
    pub fn fields(&self) -> EventFields {
        EventFields {
            title: self.title.clone(),
            start_time: self.start_time,
            end_time: self.end_time,
            description: self.description.clone(),
            location: self.location.clone(),
            public: self.public,
            meeting: self.meeting,
        }
    }

    /// How long the event lasts in whole minutes.
    pub fn duration_minutes(&self) -> i64 {
        (self.end_time - self.start_time).whole_minutes()
    }

    /// How many service minutes attending this event is worth.
    ///
    /// Meetings are never worth anything, regardless of their length.
    pub fn accrued_minutes(&self) -> i64 {
        if self.meeting {
            0
        } else {
            self.duration_minutes()
        }
    }

    pub fn visible_to(&self, viewer: Option<&Member>) -> bool {
        self.public || viewer.is_some()
    }

    pub fn editable_by(&self, member: &Member) -> bool {
        member.super_user || self.created_by == Some(member.id)
    }
}

/// Everything about an event that can be set by its creator.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFields {
    pub title: String,
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end_time: OffsetDateTime,
    #[serde(default)]
    pub description: Option<String>,
    pub location: String,
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub meeting: bool,
}

impl EventFields {
    pub fn validate(&self) -> AmbassadorResult<()> {
        if self.title.trim().is_empty() {
            return Err(AmbassadorError::BadRequest(
                "title must not be empty".to_owned(),
            ));
        }
        if self.location.trim().is_empty() {
            return Err(AmbassadorError::BadRequest(
                "location must not be empty".to_owned(),
            ));
        }
        if self.end_time < self.start_time {
            return Err(AmbassadorError::BadRequest(
                "end time must not be before start time".to_owned(),
            ));
        }

        Ok(())
    }
}

/// A partial update to an event. Missing fields are left as they were.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventUpdate {
    pub title: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub start_time: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub end_time: Option<OffsetDateTime>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub public: Option<bool>,
    pub meeting: Option<bool>,
}

impl EventUpdate {
    pub fn apply_to(&self, mut fields: EventFields) -> AmbassadorResult<EventFields> {
        if let Some(title) = &self.title {
            fields.title = title.clone();
        }
        if let Some(start_time) = self.start_time {
            fields.start_time = start_time;
        }
        if let Some(end_time) = self.end_time {
            fields.end_time = end_time;
        }
        if let Some(description) = &self.description {
            fields.description = Some(description.clone()).filter(|d| !d.trim().is_empty());
        }
        if let Some(location) = &self.location {
            fields.location = location.clone();
        }
        if let Some(public) = self.public {
            fields.public = public;
        }
        if let Some(meeting) = self.meeting {
            fields.meeting = meeting;
        }

        fields.validate()?;

        Ok(fields)
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    fn service_event() -> Event {
        Event {
            id: 1,
            title: "Campus Tour".to_owned(),
            start_time: datetime!(2019-03-01 10:00 -5),
            end_time: datetime!(2019-03-01 12:00 -5),
            description: None,
            location: "Tangeman University Center".to_owned(),
            public: true,
            meeting: false,
            created_by: Some(1),
        }
    }

    #[test]
    fn service_events_accrue_their_duration() {
        let event = service_event();

        assert_eq!(event.duration_minutes(), 120);
        assert_eq!(event.accrued_minutes(), 120);
    }

    #[test]
    fn meetings_accrue_nothing() {
        let event = Event {
            meeting: true,
            ..service_event()
        };

        assert_eq!(event.duration_minutes(), 120);
        assert_eq!(event.accrued_minutes(), 0);
    }

    #[test]
    fn update_only_touches_given_fields() {
        let update = EventUpdate {
            end_time: Some(datetime!(2019-03-01 13:00 -5)),
            ..Default::default()
        };

        let fields = update.apply_to(service_event().fields()).unwrap();

        assert_eq!(fields.title, "Campus Tour");
        assert_eq!(fields.start_time, datetime!(2019-03-01 10:00 -5));
        assert_eq!(fields.end_time, datetime!(2019-03-01 13:00 -5));
    }

    #[test]
    fn update_rejects_end_before_start() {
        let update = EventUpdate {
            end_time: Some(datetime!(2019-03-01 09:00 -5)),
            ..Default::default()
        };

        assert!(matches!(
            update.apply_to(service_event().fields()),
            Err(AmbassadorError::BadRequest(_))
        ));
    }

    #[test]
    fn private_events_need_a_viewer() {
        let event = Event {
            public: false,
            ..service_event()
        };

        assert!(!event.visible_to(None));
    }
}
