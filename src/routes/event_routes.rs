//! All event-focused routes.
//!
//! Anything that changes an event or its attendance goes through
//! [accrual](crate::models::accrual) so members' service minutes stay in sync.

use axum::extract::{Extension, Json, Path};
use serde::Deserialize;
use serde_json::{json, Value};

use super::basic_success;
use crate::auth::{MaybeUser, User};
use crate::db::Database;
use crate::error::{AmbassadorError, AmbassadorResult};
use crate::models::accrual;
use crate::models::attendance::{AttendanceForm, AttendanceStatus};
use crate::models::event::{Event, EventFields, EventUpdate};
use crate::state::AppState;

/// The same update applied to several events.
#[derive(Debug, Deserialize)]
pub struct BulkEventUpdate {
    pub ids: Vec<i64>,
    pub update: EventUpdate,
}

#[derive(Debug, Deserialize)]
pub struct EventIds {
    pub ids: Vec<i64>,
}

/// Get all events visible to the requester.
///
/// Visitors who aren't logged in only see public events.
pub async fn get_events(
    Extension(state): Extension<AppState>,
    viewer: MaybeUser,
) -> AmbassadorResult<Json<Value>> {
    let events: Vec<Event> = state
        .db()
        .all_events()
        .await?
        .into_iter()
        .filter(|event| event.visible_to(viewer.member()))
        .collect();

    Ok(Json(json!(events)))
}

/// Create a new event, with the requester as its creator.
///
/// ## Input Format:
///
/// ```json
/// {
///     "title": string,
///     "startTime": string (RFC 3339),
///     "endTime": string (RFC 3339),
///     "description": string?,
///     "location": string,
///     "public": boolean?,
///     "meeting": boolean?
/// }
/// ```
pub async fn create_event(
    Extension(state): Extension<AppState>,
    user: User,
    Json(fields): Json<EventFields>,
) -> AmbassadorResult<Json<Value>> {
    let event = accrual::create_event(state.db(), &fields, user.member.id).await?;

    Ok(Json(json!(event)))
}

/// Get a single event.
///
/// ## Path Parameters:
///   * id: integer (*required*) - The ID of the event
///
/// Private events require the requester to be logged in.
pub async fn get_event(
    Extension(state): Extension<AppState>,
    viewer: MaybeUser,
    Path(id): Path<i64>,
) -> AmbassadorResult<Json<Value>> {
    let event = load_event(state.db(), id).await?;
    if !event.visible_to(viewer.member()) {
        return Err(AmbassadorError::Unauthorized);
    }

    Ok(Json(json!(event)))
}

/// Update an event. Fields left out of the body stay as they were.
///
/// If the event's worth in service minutes changes, every member with
/// counted attendance has their minutes adjusted to match.
pub async fn update_event(
    Extension(state): Extension<AppState>,
    user: User,
    Path(id): Path<i64>,
    Json(update): Json<EventUpdate>,
) -> AmbassadorResult<Json<Value>> {
    let db = state.db();
    let before = editable_event(db, id, &user).await?;
    let event = accrual::update_event(db, &before, &update).await?;

    Ok(Json(json!(event)))
}

pub async fn delete_event(
    Extension(state): Extension<AppState>,
    user: User,
    Path(id): Path<i64>,
) -> AmbassadorResult<Json<Value>> {
    let db = state.db();
    let event = editable_event(db, id, &user).await?;
    accrual::delete_event(db, &event).await?;

    Ok(Json(basic_success()))
}

/// Apply one update to many events.
///
/// ## Input Format:
///
/// ```json
/// {
///     "ids": [integer],
///     "update": EventUpdate
/// }
/// ```
///
/// Events are updated one at a time in the given order, stopping at the
/// first failure.
pub async fn update_events(
    Extension(state): Extension<AppState>,
    user: User,
    Json(bulk): Json<BulkEventUpdate>,
) -> AmbassadorResult<Json<Value>> {
    user.ensure_super_user()?;
    let events = accrual::update_events(state.db(), &bulk.ids, &bulk.update).await?;

    Ok(Json(json!(events)))
}

pub async fn delete_events(
    Extension(state): Extension<AppState>,
    user: User,
    Json(EventIds { ids }): Json<EventIds>,
) -> AmbassadorResult<Json<Value>> {
    user.ensure_super_user()?;
    accrual::delete_events(state.db(), &ids).await?;

    Ok(Json(basic_success()))
}

/// Get the attendance for an event.
pub async fn get_attendance(
    Extension(state): Extension<AppState>,
    _user: User,
    Path(id): Path<i64>,
) -> AmbassadorResult<Json<Value>> {
    let db = state.db();
    let event = load_event(db, id).await?;
    let attendance = db.attendance_for_event(event.id).await?;

    Ok(Json(json!(attendance)))
}

/// Sign up to attend an event. New attendance is pending until the event's
/// creator or a super user confirms it.
pub async fn attend_event(
    Extension(state): Extension<AppState>,
    user: User,
    Path(id): Path<i64>,
) -> AmbassadorResult<Json<Value>> {
    let db = state.db();
    let event = load_event(db, id).await?;
    let attendance =
        accrual::record_attendance(db, &event, user.member.id, AttendanceStatus::Pending).await?;

    Ok(Json(json!(attendance)))
}

/// Set a member's attendance status for an event.
///
/// ## Path Parameters:
///   * id: integer (*required*) - The ID of the event
///   * member_id: integer (*required*) - The ID of the member
///
/// ## Input Format:
///
/// ```json
/// {
///     "status": "confirmed" | "not_needed" | "pending"
/// }
/// ```
///
/// Records the attendance if the member has none yet, otherwise changes
/// its status. Setting the status it already has fails with a 304.
pub async fn set_attendance(
    Extension(state): Extension<AppState>,
    user: User,
    Path((id, member_id)): Path<(i64, i64)>,
    Json(form): Json<AttendanceForm>,
) -> AmbassadorResult<Json<Value>> {
    let db = state.db();
    let event = editable_event(db, id, &user).await?;
    db.member_with_id(member_id)
        .await?
        .ok_or(AmbassadorError::NotFound)?;

    let attendance = match db.attendance(member_id, event.id).await? {
        Some(before) => accrual::change_attendance(db, &event, &before, form.status).await?,
        None => accrual::record_attendance(db, &event, member_id, form.status).await?,
    };

    Ok(Json(json!(attendance)))
}

/// Remove a member's attendance from an event.
///
/// Members may remove their own attendance; anyone else's needs the
/// event's creator or a super user.
pub async fn remove_attendance(
    Extension(state): Extension<AppState>,
    user: User,
    Path((id, member_id)): Path<(i64, i64)>,
) -> AmbassadorResult<Json<Value>> {
    let db = state.db();
    let event = load_event(db, id).await?;
    if user.member.id != member_id && !event.editable_by(&user.member) {
        return Err(AmbassadorError::forbidden(
            "only the event's creator or a super user can remove other members' attendance",
        ));
    }

    let attendance = db
        .attendance(member_id, event.id)
        .await?
        .ok_or(AmbassadorError::NotFound)?;
    accrual::remove_attendance(db, &event, &attendance).await?;

    Ok(Json(basic_success()))
}

async fn load_event(db: &dyn Database, id: i64) -> AmbassadorResult<Event> {
    db.event_with_id(id).await?.ok_or(AmbassadorError::NotFound)
}

/// Loads an event the user is allowed to change.
async fn editable_event(db: &dyn Database, id: i64, user: &User) -> AmbassadorResult<Event> {
    let event = load_event(db, id).await?;
    if event.editable_by(&user.member) {
        Ok(event)
    } else {
        Err(AmbassadorError::forbidden(
            "only the event's creator or a super user can change it",
        ))
    }
}
