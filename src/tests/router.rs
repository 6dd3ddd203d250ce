use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::auth::TOKEN_HEADER;
use crate::routes::build_router;
use crate::tests::mock::*;

fn make_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(TOKEN_HEADER, token);
    }

    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

#[tokio::test]
async fn super_user_flag_is_set_from_the_query_string() {
    let db = mock_db();
    let admin = mock_super_user(&db, "Admin").await;
    let member = mock_member(&db, "Profile").await;
    let user = log_in(&db, &admin).await;

    let response = build_router(mock_state(&db))
        .oneshot(make_request(
            "POST",
            &format!("/member/{}/update-attributes?super_user=true", member.id),
            Some(&user.token),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let member = db.member(member.id);
    assert!(member.super_user);
    assert!(!member.private_user);
}

#[tokio::test]
async fn unrecognized_flag_values_are_not_modified() {
    let db = mock_db();
    let admin = mock_super_user(&db, "Admin").await;
    let member = mock_member(&db, "Profile").await;
    let user = log_in(&db, &admin).await;

    let response = build_router(mock_state(&db))
        .oneshot(make_request(
            "POST",
            &format!("/member/{}/update-attributes?super_user=f", member.id),
            Some(&user.token),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
    assert!(!db.member(member.id).super_user);
}

#[tokio::test]
async fn attribute_updates_need_a_token() {
    let db = mock_db();
    let member = mock_member(&db, "Profile").await;

    let response = build_router(mock_state(&db))
        .oneshot(make_request(
            "POST",
            &format!("/member/{}/update-attributes?super_user=true", member.id),
            None,
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(!db.member(member.id).super_user);
}

#[tokio::test]
async fn private_profiles_are_forbidden_to_visitors() {
    let db = mock_db();
    let member = mock_private_member(&db, "Private").await;

    let response = build_router(mock_state(&db))
        .oneshot(make_request("GET", &format!("/member/{}", member.id), None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn profile_edits_route_by_member_id() {
    let db = mock_db();
    let admin = mock_super_user(&db, "Admin").await;
    let member = mock_member(&db, "Profile").await;
    let user = log_in(&db, &admin).await;

    let response = build_router(mock_state(&db))
        .oneshot(make_request(
            "POST",
            &format!("/member/{}/profile/update", member.id),
            Some(&user.token),
            Some(json!({ "hometown": "Dayton", "accend": "on" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let member = db.member(member.id);
    assert_eq!(member.hometown.as_deref(), Some("Dayton"));
    assert!(member.accend);
    assert_eq!(db.member(admin.id).hometown, None);
}

#[tokio::test]
async fn own_profile_edits_use_the_static_route() {
    let db = mock_db();
    let member = mock_member(&db, "Profile").await;
    let user = log_in(&db, &member).await;

    let response = build_router(mock_state(&db))
        .oneshot(make_request(
            "POST",
            "/member/profile/update",
            Some(&user.token),
            Some(json!({ "major": "Chemistry" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(db.member(member.id).major.as_deref(), Some("Chemistry"));
}
