use axum::extract::{Extension, Json, Path};
use time::Duration;

use crate::auth::MaybeUser;
use crate::error::AmbassadorError;
use crate::models::attendance::{AttendanceForm, AttendanceStatus};
use crate::models::event::{EventFields, EventUpdate};
use crate::routes::event_routes;
use crate::tests::mock::*;

#[tokio::test]
async fn visitors_only_see_public_events() {
    let db = mock_db();
    let admin = mock_super_user(&db, "Admin").await;
    mock_event(&db, &admin, 60).await;
    mock_meeting(&db, &admin, 60).await;
    mock_private_event(&db, &admin).await;
    let user = log_in(&db, &admin).await;

    let Json(anonymous) = event_routes::get_events(Extension(mock_state(&db)), MaybeUser(None))
        .await
        .unwrap();
    assert_eq!(anonymous.as_array().map(Vec::len), Some(2));

    let Json(logged_in) =
        event_routes::get_events(Extension(mock_state(&db)), MaybeUser(Some(user)))
            .await
            .unwrap();
    assert_eq!(logged_in.as_array().map(Vec::len), Some(3));
}

#[tokio::test]
async fn private_events_need_a_login() {
    let db = mock_db();
    let admin = mock_super_user(&db, "Admin").await;
    let event = mock_private_event(&db, &admin).await;
    let user = log_in(&db, &admin).await;

    let anonymous =
        event_routes::get_event(Extension(mock_state(&db)), MaybeUser(None), Path(event.id)).await;
    assert!(matches!(anonymous, Err(AmbassadorError::Unauthorized)));

    let Json(found) = event_routes::get_event(
        Extension(mock_state(&db)),
        MaybeUser(Some(user)),
        Path(event.id),
    )
    .await
    .unwrap();
    assert_eq!(found["public"], false);
    assert_eq!(found["startTime"], "2019-03-01T10:00:00-05:00");
}

#[tokio::test]
async fn missing_events_are_not_found() {
    let db = mock_db();

    let result =
        event_routes::get_event(Extension(mock_state(&db)), MaybeUser(None), Path(7)).await;

    assert!(matches!(result, Err(AmbassadorError::NotFound)));
}

#[tokio::test]
async fn created_events_remember_their_creator() {
    let db = mock_db();
    let member = mock_member(&db, "Creator").await;
    let user = log_in(&db, &member).await;

    let Json(event) = event_routes::create_event(
        Extension(mock_state(&db)),
        user,
        Json(mock_event_fields(60)),
    )
    .await
    .unwrap();

    assert_eq!(event["createdBy"], member.id);
    assert_eq!(event["title"], "Campus Tour");
}

#[tokio::test]
async fn events_cannot_end_before_they_start() {
    let db = mock_db();
    let member = mock_member(&db, "Creator").await;
    let user = log_in(&db, &member).await;

    let result = event_routes::create_event(
        Extension(mock_state(&db)),
        user,
        Json(EventFields {
            end_time: EVENT_START - Duration::minutes(30),
            ..mock_event_fields(0)
        }),
    )
    .await;

    assert!(matches!(result, Err(AmbassadorError::BadRequest(_))));
}

#[tokio::test]
async fn only_the_creator_or_a_super_user_edits_an_event() {
    let db = mock_db();
    let creator = mock_member(&db, "Creator").await;
    let other = mock_member(&db, "Other").await;
    let event = mock_event(&db, &creator, 60).await;
    let other_user = log_in(&db, &other).await;
    let creator_user = log_in(&db, &creator).await;
    let rename = EventUpdate {
        title: Some("Renamed".to_owned()),
        ..Default::default()
    };

    let result = event_routes::update_event(
        Extension(mock_state(&db)),
        other_user.clone(),
        Path(event.id),
        Json(rename.clone()),
    )
    .await;
    assert!(matches!(result, Err(AmbassadorError::Forbidden(_))));

    let result =
        event_routes::delete_event(Extension(mock_state(&db)), other_user, Path(event.id)).await;
    assert!(matches!(result, Err(AmbassadorError::Forbidden(_))));
    assert!(db.event_exists(event.id));

    let Json(renamed) = event_routes::update_event(
        Extension(mock_state(&db)),
        creator_user,
        Path(event.id),
        Json(rename),
    )
    .await
    .unwrap();
    assert_eq!(renamed["title"], "Renamed");
}

#[tokio::test]
async fn members_attend_as_pending_once() {
    let db = mock_db();
    let admin = mock_super_user(&db, "Admin").await;
    let member = mock_member(&db, "Profile").await;
    let event = mock_event(&db, &admin, 60).await;
    let user = log_in(&db, &member).await;

    let Json(attendance) =
        event_routes::attend_event(Extension(mock_state(&db)), user.clone(), Path(event.id))
            .await
            .unwrap();
    assert_eq!(attendance["status"], "pending");
    assert_eq!(attendance["memberId"], member.id);

    let again = event_routes::attend_event(Extension(mock_state(&db)), user.clone(), Path(event.id))
        .await;
    assert!(matches!(again, Err(AmbassadorError::BadRequest(_))));

    let Json(list) = event_routes::get_attendance(Extension(mock_state(&db)), user, Path(event.id))
        .await
        .unwrap();
    assert_eq!(list.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn members_cannot_confirm_their_own_attendance() {
    let db = mock_db();
    let admin = mock_super_user(&db, "Admin").await;
    let member = mock_member(&db, "Profile").await;
    let event = mock_event(&db, &admin, 60).await;
    mock_attendance(&db, &event, &member, AttendanceStatus::Pending).await;
    let user = log_in(&db, &member).await;

    let result = event_routes::set_attendance(
        Extension(mock_state(&db)),
        user,
        Path((event.id, member.id)),
        Json(AttendanceForm {
            status: AttendanceStatus::Confirmed,
        }),
    )
    .await;

    assert!(matches!(result, Err(AmbassadorError::Forbidden(_))));
    assert_eq!(db.member(member.id).minutes, 0);
}

#[tokio::test]
async fn creators_record_attendance_for_members() {
    let db = mock_db();
    let creator = mock_member(&db, "Creator").await;
    let member = mock_member(&db, "Profile").await;
    let event = mock_event(&db, &creator, 75).await;
    let user = log_in(&db, &creator).await;

    let Json(attendance) = event_routes::set_attendance(
        Extension(mock_state(&db)),
        user,
        Path((event.id, member.id)),
        Json(AttendanceForm {
            status: AttendanceStatus::NotNeeded,
        }),
    )
    .await
    .unwrap();

    assert_eq!(attendance["status"], "not_needed");
    assert_eq!(db.member(member.id).minutes_not_needed, 75);
}

#[tokio::test]
async fn attendance_for_missing_members_is_not_found() {
    let db = mock_db();
    let admin = mock_super_user(&db, "Admin").await;
    let event = mock_event(&db, &admin, 60).await;
    let user = log_in(&db, &admin).await;

    let result = event_routes::set_attendance(
        Extension(mock_state(&db)),
        user,
        Path((event.id, 99)),
        Json(AttendanceForm {
            status: AttendanceStatus::Confirmed,
        }),
    )
    .await;

    assert!(matches!(result, Err(AmbassadorError::NotFound)));
    assert_eq!(db.attendance_count(), 0);
}

#[tokio::test]
async fn members_cannot_remove_others_attendance() {
    let db = mock_db();
    let admin = mock_super_user(&db, "Admin").await;
    let member = mock_member(&db, "Profile").await;
    let other = mock_member(&db, "Other").await;
    let event = mock_event(&db, &admin, 60).await;
    mock_attendance(&db, &event, &member, AttendanceStatus::Confirmed).await;
    let user = log_in(&db, &other).await;

    let result = event_routes::remove_attendance(
        Extension(mock_state(&db)),
        user,
        Path((event.id, member.id)),
    )
    .await;

    assert!(matches!(result, Err(AmbassadorError::Forbidden(_))));
    assert_eq!(db.member(member.id).minutes, 60);
}
