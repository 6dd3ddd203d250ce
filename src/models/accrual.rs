//! Service minute bookkeeping.
//!
//! Each member's `minutes` is the sum of [accrued_minutes](Event::accrued_minutes)
//! over their confirmed attendance, and `minutes_not_needed` the same over their
//! not-needed attendance. Rather than recomputing those sums, every change to an
//! event or an attendance record goes through this module, which applies the
//! difference to the affected counters.
//!
//! Event changes need the event as it was before the change (its before-image),
//! which callers load at the start of the request and pass in. Nothing here ever
//! re-reads the old row after writing the new one.

use futures::future::join_all;

use crate::db::Database;
use crate::error::{AmbassadorError, AmbassadorResult};
use crate::models::attendance::{Attendance, AttendanceStatus, ServiceCounter};
use crate::models::event::{Event, EventFields, EventUpdate};

/// A single change to a single member counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Adjustment {
    member_id: i64,
    counter: ServiceCounter,
    minutes: i64,
}

/// Creates an event. New events have no attendance, so no counters change.
pub async fn create_event(
    db: &dyn Database,
    fields: &EventFields,
    created_by: i64,
) -> AmbassadorResult<Event> {
    fields.validate()?;
    let event = db.insert_event(fields, Some(created_by)).await?;
    tracing::info!(event_id = event.id, "created event");

    Ok(event)
}

/// Updates an event, then shifts its attendees' counters by however much the
/// event's worth changed.
pub async fn update_event(
    db: &dyn Database,
    before: &Event,
    update: &EventUpdate,
) -> AmbassadorResult<Event> {
    let fields = update.apply_to(before.fields())?;
    let after = db.update_event(before.id, &fields).await?;

    let change = after.accrued_minutes() - before.accrued_minutes();
    if change == 0 {
        return Ok(after);
    }

    let attendance = db.attendance_for_event(after.id).await?;
    tracing::info!(
        event_id = after.id,
        change,
        attendees = attendance.len(),
        "event length changed, adjusting service minutes"
    );
    apply(db, after.id, adjustments_for(&attendance, change)).await?;

    Ok(after)
}

/// Deletes an event in three explicit steps: take its minutes back from
/// every attendee, remove its attendance, then remove the event itself.
pub async fn delete_event(db: &dyn Database, event: &Event) -> AmbassadorResult<()> {
    let attendance = db.attendance_for_event(event.id).await?;
    let worth = event.accrued_minutes();
    if worth != 0 {
        apply(db, event.id, adjustments_for(&attendance, -worth)).await?;
    }

    db.delete_attendance_for_event(event.id).await?;
    db.delete_event(event.id).await?;
    tracing::info!(
        event_id = event.id,
        attendees = attendance.len(),
        "deleted event"
    );

    Ok(())
}

/// Applies the same update to many events, one event at a time.
///
/// Stops at the first failure; events before it stay updated.
pub async fn update_events(
    db: &dyn Database,
    ids: &[i64],
    update: &EventUpdate,
) -> AmbassadorResult<Vec<Event>> {
    let mut updated = Vec::with_capacity(ids.len());
    for &id in ids {
        let before = db.event_with_id(id).await?.ok_or(AmbassadorError::NotFound)?;
        updated.push(update_event(db, &before, update).await?);
    }

    Ok(updated)
}

/// Deletes many events, one event at a time.
///
/// Stops at the first failure; events before it stay deleted.
pub async fn delete_events(db: &dyn Database, ids: &[i64]) -> AmbassadorResult<()> {
    for &id in ids {
        let event = db.event_with_id(id).await?.ok_or(AmbassadorError::NotFound)?;
        delete_event(db, &event).await?;
    }

    Ok(())
}

/// Records a member's attendance at an event for the first time.
pub async fn record_attendance(
    db: &dyn Database,
    event: &Event,
    member_id: i64,
    status: AttendanceStatus,
) -> AmbassadorResult<Attendance> {
    if db.attendance(member_id, event.id).await?.is_some() {
        return Err(AmbassadorError::BadRequest(format!(
            "member {} already has attendance for event {}",
            member_id, event.id
        )));
    }

    let attendance = Attendance {
        member_id,
        event_id: event.id,
        status,
    };
    db.insert_attendance(&attendance).await?;
    apply(
        db,
        event.id,
        adjustments_for(std::slice::from_ref(&attendance), event.accrued_minutes()),
    )
    .await?;

    Ok(attendance)
}

/// Changes the status of existing attendance, moving the event's minutes from
/// the old status's counter to the new one's.
pub async fn change_attendance(
    db: &dyn Database,
    event: &Event,
    before: &Attendance,
    status: AttendanceStatus,
) -> AmbassadorResult<Attendance> {
    if before.status == status {
        return Err(AmbassadorError::NotModified);
    }

    db.update_attendance_status(before.member_id, event.id, status)
        .await?;
    let after = Attendance {
        status,
        ..before.clone()
    };

    let worth = event.accrued_minutes();
    let adjustments = adjustments_for(std::slice::from_ref(before), -worth)
        .into_iter()
        .chain(adjustments_for(std::slice::from_ref(&after), worth))
        .collect();
    apply(db, event.id, adjustments).await?;

    Ok(after)
}

/// Removes attendance, then takes back any minutes it was worth.
pub async fn remove_attendance(
    db: &dyn Database,
    event: &Event,
    attendance: &Attendance,
) -> AmbassadorResult<()> {
    db.delete_attendance(attendance.member_id, event.id).await?;

    apply(
        db,
        event.id,
        adjustments_for(std::slice::from_ref(attendance), -event.accrued_minutes()),
    )
    .await
}

fn adjustments_for(attendance: &[Attendance], minutes: i64) -> Vec<Adjustment> {
    if minutes == 0 {
        return Vec::new();
    }

    attendance
        .iter()
        .filter_map(|attendance| {
            attendance.status.counter().map(|counter| Adjustment {
                member_id: attendance.member_id,
                counter,
                minutes,
            })
        })
        .collect()
}

/// Issues all adjustments at once. If any of them fail, the counters may
/// no longer add up, so the failures are logged and reported rather than
/// retried (a retry could apply the same change twice).
async fn apply(
    db: &dyn Database,
    event_id: i64,
    adjustments: Vec<Adjustment>,
) -> AmbassadorResult<()> {
    if adjustments.is_empty() {
        return Ok(());
    }

    let results = join_all(adjustments.iter().map(|adjustment| {
        db.add_service_minutes(adjustment.member_id, adjustment.counter, adjustment.minutes)
    }))
    .await;

    let mut failed = 0;
    for (adjustment, result) in adjustments.iter().zip(results) {
        if let Err(error) = result {
            failed += 1;
            tracing::error!(
                event_id,
                member_id = adjustment.member_id,
                counter = adjustment.counter.column(),
                minutes = adjustment.minutes,
                %error,
                "failed to adjust service minutes"
            );
        }
    }

    if failed > 0 {
        Err(AmbassadorError::IntegrityRisk {
            event_id,
            failed,
            attempted: adjustments.len(),
        })
    } else {
        Ok(())
    }
}
