//! All routes for the API.
//!
//! Every endpoint answers with JSON. On success a 200 status code is returned,
//! while all errors return appropriate error status codes (see
//! [AmbassadorError](crate::error::AmbassadorError) for how those get mapped).
//!
//! Endpoints that need a logged-in member take a [User](crate::auth::User),
//! and those that behave differently for visitors take a
//! [MaybeUser](crate::auth::MaybeUser). Either way, the API token goes in the
//! `token` header.

pub mod event_routes;
pub mod member_routes;

use axum::routing::{get, post};
use axum::{Extension, Router};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Builds the router for the whole API.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/signup", post(member_routes::signup))
        .route("/login", post(member_routes::login))
        .route("/logout", post(member_routes::logout))
        .route(
            "/member",
            get(member_routes::get_members).post(member_routes::create_member),
        )
        .route("/member/profile/update", post(member_routes::update_profile))
        .route("/member/:id", get(member_routes::get_member))
        .route(
            "/member/:id/profile/update",
            post(member_routes::update_member_profile),
        )
        .route(
            "/member/:id/update-attributes",
            post(member_routes::update_attributes),
        )
        .route("/member/:id/delete", post(member_routes::delete_member))
        .route(
            "/member/:id/reset-password",
            post(member_routes::reset_password),
        )
        .route(
            "/event",
            get(event_routes::get_events).post(event_routes::create_event),
        )
        .route("/event/bulk-update", post(event_routes::update_events))
        .route("/event/bulk-delete", post(event_routes::delete_events))
        .route("/event/:id", get(event_routes::get_event))
        .route("/event/:id/update", post(event_routes::update_event))
        .route("/event/:id/delete", post(event_routes::delete_event))
        .route("/event/:id/attendance", get(event_routes::get_attendance))
        .route("/event/:id/attend", post(event_routes::attend_event))
        .route(
            "/event/:id/attendance/:member_id",
            post(event_routes::set_attendance),
        )
        .route(
            "/event/:id/attendance/:member_id/delete",
            post(event_routes::remove_attendance),
        )
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub fn basic_success() -> Value {
    json!({ "message": "success!" })
}
