//! Authentication and authorization handling for the API.
//!
//! The [User] struct, in use as an extractable parameter for endpoints, is the
//! primary method for handling authorization. Members authenticate by logging
//! in, which hands back an API token to send in the `token` header of every
//! later request. The token is resolved to a member once per request, and the
//! member is then passed to the endpoint explicitly.

use async_trait::async_trait;
use axum::extract::{Extension, FromRequest, RequestParts};

use crate::db::Database;
use crate::error::{AmbassadorError, AmbassadorResult};
use crate::models::member::Member;
use crate::state::AppState;

/// The header that API tokens are sent in.
pub const TOKEN_HEADER: &str = "token";

const PASSWORD_HASH_COST: u32 = 10;

/// A logged-in member making a request.
///
/// Extracting this fails with [Unauthorized](AmbassadorError::Unauthorized)
/// if no valid token was sent.
#[derive(Clone, Debug)]
pub struct User {
    pub member: Member,
    pub token: String,
}

impl User {
    pub fn is_super_user(&self) -> bool {
        self.member.super_user
    }

    /// Fails with [Forbidden](AmbassadorError::Forbidden) unless the user is a super user.
    pub fn ensure_super_user(&self) -> AmbassadorResult<()> {
        if self.is_super_user() {
            Ok(())
        } else {
            Err(AmbassadorError::forbidden("super user required"))
        }
    }
}

/// The member making a request, if they are logged in.
#[derive(Clone, Debug, Default)]
pub struct MaybeUser(pub Option<User>);

impl MaybeUser {
    pub fn member(&self) -> Option<&Member> {
        self.0.as_ref().map(|user| &user.member)
    }
}

#[async_trait]
impl<B: Send> FromRequest<B> for MaybeUser {
    type Rejection = AmbassadorError;

    async fn from_request(req: &mut RequestParts<B>) -> Result<Self, Self::Rejection> {
        let Extension(state) = Extension::<AppState>::from_request(req)
            .await
            .map_err(|err| AmbassadorError::ServerError(err.to_string()))?;

        let token = match req.headers().get(TOKEN_HEADER) {
            Some(value) => value
                .to_str()
                .map_err(|_| {
                    AmbassadorError::BadRequest("token header must be valid text".to_owned())
                })?
                .to_owned(),
            None => return Ok(MaybeUser(None)),
        };

        match resolve_session(state.db(), &token).await? {
            Some(member) => Ok(MaybeUser(Some(User { member, token }))),
            None => {
                tracing::warn!("request sent an unknown API token");
                Ok(MaybeUser(None))
            }
        }
    }
}

#[async_trait]
impl<B: Send> FromRequest<B> for User {
    type Rejection = AmbassadorError;

    async fn from_request(req: &mut RequestParts<B>) -> Result<Self, Self::Rejection> {
        let MaybeUser(user) = MaybeUser::from_request(req).await?;

        user.ok_or(AmbassadorError::Unauthorized)
    }
}

pub fn hash_password(password: &str) -> AmbassadorResult<String> {
    bcrypt::hash(password, PASSWORD_HASH_COST)
        .map_err(|err| AmbassadorError::ServerError(format!("Failed to hash password: {}", err)))
}

/// Compares a plaintext password attempt with a stored bcrypt hash.
pub fn password_matches(password: &str, pass_hash: &str) -> bool {
    bcrypt::verify(password, pass_hash).unwrap_or(false)
}

/// Checks a login attempt, returning the member if the password is correct.
///
/// Unknown emails and wrong passwords fail the same way.
pub async fn verify_credentials(
    db: &dyn Database,
    email: &str,
    password: &str,
) -> AmbassadorResult<Member> {
    match db.member_with_email(email).await? {
        Some(member) if password_matches(password, &member.pass_hash) => Ok(member),
        Some(_) => {
            tracing::warn!(email, "login attempt with an incorrect password");
            Err(AmbassadorError::InvalidCredentials)
        }
        None => {
            tracing::warn!(email, "login attempt for an unknown member");
            Err(AmbassadorError::InvalidCredentials)
        }
    }
}

/// Starts a new session for the member, returning its API token.
pub async fn establish_session(db: &dyn Database, member: &Member) -> AmbassadorResult<String> {
    let token = uuid::Uuid::new_v4().to_string();
    db.insert_session(member.id, &token).await?;

    Ok(token)
}

/// Finds the member a token belongs to, if the token is valid.
pub async fn resolve_session(db: &dyn Database, token: &str) -> AmbassadorResult<Option<Member>> {
    match db.session_member(token).await? {
        Some(member_id) => db.member_with_id(member_id).await,
        None => Ok(None),
    }
}
