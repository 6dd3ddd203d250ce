//! All member-focused routes.

use axum::extract::{Extension, Json, Path, Query};
use serde::Deserialize;
use serde_json::{json, Value};

use super::basic_success;
use crate::auth::{establish_session, hash_password, verify_credentials, MaybeUser, User};
use crate::db::Database;
use crate::error::{AmbassadorError, AmbassadorResult};
use crate::models::member::{
    AttributeUpdate, CreateMemberForm, Member, MemberAttributes, NewMember, ProfileUpdate,
    SignupForm,
};
use crate::state::AppState;
use crate::util::generate_temporary_password;

#[derive(Debug, Deserialize)]
pub struct LoginInfo {
    pub email: String,
    pub password: String,
}

/// Sign up as a new member.
///
/// ## Input Format:
///
/// ```json
/// {
///     "email": string,
///     "password": string,
///     "confirmPassword": string,
///     "firstName": string,
///     "lastName": string
/// }
/// ```
///
/// ## Return Format:
///
/// ```json
/// {
///     "token": string,
///     "member": Member
/// }
/// ```
///
/// The new member starts out logged in with the returned token.
pub async fn signup(
    Extension(state): Extension<AppState>,
    Json(form): Json<SignupForm>,
) -> AmbassadorResult<Json<Value>> {
    form.validate()?;
    let db = state.db();

    let member = insert_new_member(
        db,
        NewMember {
            email: form.email.trim().to_owned(),
            first_name: form.first_name.trim().to_owned(),
            last_name: form.last_name.trim().to_owned(),
            pass_hash: hash_password(&form.password)?,
            attributes: MemberAttributes {
                super_user: false,
                private_user: false,
                accend: false,
            },
        },
    )
    .await?;
    let token = establish_session(db, &member).await?;

    Ok(Json(json!({ "token": token, "member": member })))
}

/// Log in with an email and password.
///
/// ## Return Format:
///
/// ```json
/// {
///     "token": string
/// }
/// ```
pub async fn login(
    Extension(state): Extension<AppState>,
    Json(login_info): Json<LoginInfo>,
) -> AmbassadorResult<Json<Value>> {
    let db = state.db();
    let member = verify_credentials(db, login_info.email.trim(), &login_info.password).await?;
    let token = establish_session(db, &member).await?;
    tracing::info!(member_id = member.id, "member logged in");

    Ok(Json(json!({ "token": token })))
}

/// Log out the current session. Other sessions of the same member stay valid.
pub async fn logout(
    Extension(state): Extension<AppState>,
    user: User,
) -> AmbassadorResult<Json<Value>> {
    state.db().delete_session(&user.token).await?;

    Ok(Json(basic_success()))
}

/// Get all members visible to the requester.
///
/// Private members are left out unless the requester is that member or a
/// super user.
pub async fn get_members(
    Extension(state): Extension<AppState>,
    viewer: MaybeUser,
) -> AmbassadorResult<Json<Value>> {
    let members: Vec<Member> = state
        .db()
        .all_members()
        .await?
        .into_iter()
        .filter(|member| member.visible_to(viewer.member()))
        .collect();

    Ok(Json(json!(members)))
}

/// Create a member directly. Only super users may do this, and they may set
/// the new member's role flags up front.
pub async fn create_member(
    Extension(state): Extension<AppState>,
    user: User,
    Json(form): Json<CreateMemberForm>,
) -> AmbassadorResult<Json<Value>> {
    user.ensure_super_user()?;
    form.validate()?;

    let member = insert_new_member(
        state.db(),
        NewMember {
            email: form.email.trim().to_owned(),
            first_name: form.first_name.trim().to_owned(),
            last_name: form.last_name.trim().to_owned(),
            pass_hash: hash_password(&form.password)?,
            attributes: form.attributes(),
        },
    )
    .await?;
    tracing::info!(
        member_id = member.id,
        created_by = user.member.id,
        "super user created a member"
    );

    Ok(Json(json!(member)))
}

/// Get a single member.
///
/// ## Path Parameters:
///   * id: integer (*required*) - The ID of the member
///
/// Private profiles fail with a 403 unless the requester is that member or
/// a super user, whether or not the requester is logged in.
pub async fn get_member(
    Extension(state): Extension<AppState>,
    viewer: MaybeUser,
    Path(id): Path<i64>,
) -> AmbassadorResult<Json<Value>> {
    let member = load_member(state.db(), id).await?;
    if !member.visible_to(viewer.member()) {
        return Err(AmbassadorError::forbidden("this profile is private"));
    }

    Ok(Json(json!(member)))
}

/// Update the requester's own profile.
///
/// Fields left out of the body stay as they were. Sending an empty string
/// for an optional field (like `gradYear`) clears it.
///
/// ## Return Format:
///
/// The updated `Member`.
pub async fn update_profile(
    Extension(state): Extension<AppState>,
    user: User,
    Json(update): Json<ProfileUpdate>,
) -> AmbassadorResult<Json<Value>> {
    let member = edit_profile(state.db(), user.member.id, update).await?;

    Ok(Json(json!(member)))
}

/// Update another member's profile, the same way as
/// [update_profile](fn.update_profile.html).
///
/// ## Path Parameters:
///   * id: integer (*required*) - The ID of the member
///
/// Only the member themself and super users may do this.
pub async fn update_member_profile(
    Extension(state): Extension<AppState>,
    user: User,
    Path(id): Path<i64>,
    Json(update): Json<ProfileUpdate>,
) -> AmbassadorResult<Json<Value>> {
    if user.member.id != id && !user.is_super_user() {
        return Err(AmbassadorError::forbidden(
            "only the member or a super user can edit this profile",
        ));
    }

    let member = edit_profile(state.db(), id, update).await?;
    if member.id != user.member.id {
        tracing::info!(
            member_id = member.id,
            edited_by = user.member.id,
            "super user edited a profile"
        );
    }

    Ok(Json(json!(member)))
}

/// Change a member's role flags.
///
/// ## Path Parameters:
///   * id: integer (*required*) - The ID of the member
///
/// ## Query Parameters:
///   * super_user: boolean (*optional*)
///   * private_user: boolean (*optional*)
///   * accend: boolean (*optional*)
///
/// Only the exact values `true` and `false` are honored. If the member
/// would end up with the flags they already have, this fails with a 304.
pub async fn update_attributes(
    Extension(state): Extension<AppState>,
    user: User,
    Path(id): Path<i64>,
    Query(update): Query<AttributeUpdate>,
) -> AmbassadorResult<Json<Value>> {
    user.ensure_super_user()?;
    let db = state.db();

    let member = load_member(db, id).await?;
    let attributes = update
        .apply_to(member.attributes())
        .ok_or(AmbassadorError::NotModified)?;
    db.update_attributes(id, attributes).await?;
    tracing::info!(
        member_id = id,
        super_user = attributes.super_user,
        private_user = attributes.private_user,
        accend = attributes.accend,
        "member attributes changed"
    );

    let member = load_member(db, id).await?;

    Ok(Json(json!(member)))
}

/// Delete a member along with their sessions and attendance.
///
/// Events they created are kept, but no longer have a creator.
pub async fn delete_member(
    Extension(state): Extension<AppState>,
    user: User,
    Path(id): Path<i64>,
) -> AmbassadorResult<Json<Value>> {
    user.ensure_super_user()?;
    let db = state.db();

    let member = load_member(db, id).await?;
    db.delete_sessions_for_member(member.id).await?;
    db.delete_attendance_for_member(member.id).await?;
    db.delete_member(member.id).await?;
    tracing::info!(member_id = member.id, "deleted member");

    Ok(Json(basic_success()))
}

/// Give a member a new, randomly generated password and log out all of
/// their sessions.
///
/// ## Return Format:
///
/// ```json
/// {
///     "password": string
/// }
/// ```
pub async fn reset_password(
    Extension(state): Extension<AppState>,
    user: User,
    Path(id): Path<i64>,
) -> AmbassadorResult<Json<Value>> {
    user.ensure_super_user()?;
    let db = state.db();

    let member = load_member(db, id).await?;
    let password = generate_temporary_password();
    db.update_pass_hash(member.id, &hash_password(&password)?)
        .await?;
    db.delete_sessions_for_member(member.id).await?;
    tracing::info!(member_id = member.id, "reset member password");

    Ok(Json(json!({ "password": password })))
}

async fn load_member(db: &dyn Database, id: i64) -> AmbassadorResult<Member> {
    db.member_with_id(id).await?.ok_or(AmbassadorError::NotFound)
}

/// Applies a partial update on top of the member as currently stored.
async fn edit_profile(
    db: &dyn Database,
    id: i64,
    update: ProfileUpdate,
) -> AmbassadorResult<Member> {
    let current = load_member(db, id).await?;
    let profile = update.apply_to(current.profile())?;
    db.update_profile(id, &profile).await?;

    load_member(db, id).await
}

async fn insert_new_member(db: &dyn Database, new_member: NewMember) -> AmbassadorResult<Member> {
    if db.member_with_email(&new_member.email).await?.is_some() {
        return Err(AmbassadorError::BadRequest(format!(
            "a member with the email {} already exists",
            new_member.email
        )));
    }

    db.insert_member(&new_member).await
}
