use anyhow::Context;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::Config;
use crate::db::Database;
use crate::error::{AmbassadorError, AmbassadorResult};
use crate::models::attendance::{Attendance, AttendanceStatus, ServiceCounter};
use crate::models::event::{Event, EventFields};
use crate::models::member::{Member, MemberAttributes, MemberProfile, NewMember};

const MEMBER_COLUMNS: &str = "id, email, first_name, last_name, hometown, major, minors, \
     grad_year, clubs, coops, accend, super_user, private_user, minutes, minutes_not_needed, \
     pass_hash";

const EVENT_COLUMNS: &str =
    "id, title, start_time, end_time, description, location, \"public\", meeting, created_by";

/// Connects to the database, refusing to continue if it can't be reached.
pub async fn connect_to_db(config: &Config) -> anyhow::Result<PgDatabase> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to the database")?;

    let db = PgDatabase::new(pool);
    db.check_connection()
        .await
        .context("Database connection check failed")?;
    tracing::info!("Connection to database established");

    sqlx::migrate!()
        .run(&db.pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations complete");

    Ok(db)
}

#[derive(Clone, Debug)]
pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn check_connection(&self) -> AmbassadorResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;

        Ok(())
    }
}

/// SQLSTATE for a violated unique or primary key constraint.
const UNIQUE_VIOLATION: &str = "23505";

/// Turns a unique constraint violation into a [BadRequest](AmbassadorError::BadRequest),
/// so racing duplicate inserts fail the same way as the checked ones.
fn reject_duplicate(error: sqlx::Error, reason: impl FnOnce() -> String) -> AmbassadorError {
    let is_duplicate = matches!(
        &error,
        sqlx::Error::Database(db_error) if db_error.code().as_deref() == Some(UNIQUE_VIOLATION)
    );

    if is_duplicate {
        AmbassadorError::BadRequest(reason())
    } else {
        error.into()
    }
}

fn ensure_found(rows_affected: u64) -> AmbassadorResult<()> {
    if rows_affected == 0 {
        Err(AmbassadorError::NotFound)
    } else {
        Ok(())
    }
}

#[async_trait]
impl Database for PgDatabase {
    async fn member_with_id(&self, id: i64) -> AmbassadorResult<Option<Member>> {
        sqlx::query_as::<_, Member>(&format!(
            "SELECT {} FROM member WHERE id = $1",
            MEMBER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn member_with_email(&self, email: &str) -> AmbassadorResult<Option<Member>> {
        sqlx::query_as::<_, Member>(&format!(
            "SELECT {} FROM member WHERE email = $1",
            MEMBER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn all_members(&self) -> AmbassadorResult<Vec<Member>> {
        sqlx::query_as::<_, Member>(&format!(
            "SELECT {} FROM member ORDER BY last_name, first_name",
            MEMBER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn insert_member(&self, new_member: &NewMember) -> AmbassadorResult<Member> {
        sqlx::query_as::<_, Member>(&format!(
            "INSERT INTO member
                 (email, first_name, last_name, pass_hash, accend, super_user, private_user)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {}",
            MEMBER_COLUMNS
        ))
        .bind(&new_member.email)
        .bind(&new_member.first_name)
        .bind(&new_member.last_name)
        .bind(&new_member.pass_hash)
        .bind(new_member.attributes.accend)
        .bind(new_member.attributes.super_user)
        .bind(new_member.attributes.private_user)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            reject_duplicate(error, || {
                format!("a member with the email {} already exists", new_member.email)
            })
        })
    }

    async fn update_profile(&self, id: i64, profile: &MemberProfile) -> AmbassadorResult<()> {
        let result = sqlx::query(
            "UPDATE member SET
                 first_name = $1, last_name = $2, hometown = $3, major = $4, minors = $5,
                 grad_year = $6, clubs = $7, coops = $8, accend = $9
             WHERE id = $10",
        )
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.hometown)
        .bind(&profile.major)
        .bind(&profile.minors)
        .bind(profile.grad_year)
        .bind(&profile.clubs)
        .bind(&profile.coops)
        .bind(profile.accend)
        .bind(id)
        .execute(&self.pool)
        .await?;

        ensure_found(result.rows_affected())
    }

    async fn update_attributes(
        &self,
        id: i64,
        attributes: MemberAttributes,
    ) -> AmbassadorResult<()> {
        let result = sqlx::query(
            "UPDATE member SET super_user = $1, private_user = $2, accend = $3 WHERE id = $4",
        )
        .bind(attributes.super_user)
        .bind(attributes.private_user)
        .bind(attributes.accend)
        .bind(id)
        .execute(&self.pool)
        .await?;

        ensure_found(result.rows_affected())
    }

    async fn update_pass_hash(&self, id: i64, pass_hash: &str) -> AmbassadorResult<()> {
        let result = sqlx::query("UPDATE member SET pass_hash = $1 WHERE id = $2")
            .bind(pass_hash)
            .bind(id)
            .execute(&self.pool)
            .await?;

        ensure_found(result.rows_affected())
    }

    async fn add_service_minutes(
        &self,
        member_id: i64,
        counter: ServiceCounter,
        minutes: i64,
    ) -> AmbassadorResult<()> {
        let column = counter.column();
        let result = sqlx::query(&format!(
            "UPDATE member SET {column} = {column} + $1 WHERE id = $2"
        ))
        .bind(minutes)
        .bind(member_id)
        .execute(&self.pool)
        .await?;

        ensure_found(result.rows_affected())
    }

    async fn delete_member(&self, id: i64) -> AmbassadorResult<()> {
        sqlx::query("UPDATE event SET created_by = NULL WHERE created_by = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        let result = sqlx::query("DELETE FROM member WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        ensure_found(result.rows_affected())
    }

    async fn event_with_id(&self, id: i64) -> AmbassadorResult<Option<Event>> {
        sqlx::query_as::<_, Event>(&format!(
            "SELECT {} FROM event WHERE id = $1",
            EVENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn all_events(&self) -> AmbassadorResult<Vec<Event>> {
        sqlx::query_as::<_, Event>(&format!(
            "SELECT {} FROM event ORDER BY start_time",
            EVENT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn insert_event(
        &self,
        fields: &EventFields,
        created_by: Option<i64>,
    ) -> AmbassadorResult<Event> {
        sqlx::query_as::<_, Event>(&format!(
            "INSERT INTO event
                 (title, start_time, end_time, description, location, \"public\", meeting, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {}",
            EVENT_COLUMNS
        ))
        .bind(&fields.title)
        .bind(fields.start_time)
        .bind(fields.end_time)
        .bind(&fields.description)
        .bind(&fields.location)
        .bind(fields.public)
        .bind(fields.meeting)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn update_event(&self, id: i64, fields: &EventFields) -> AmbassadorResult<Event> {
        sqlx::query_as::<_, Event>(&format!(
            "UPDATE event SET
                 title = $1, start_time = $2, end_time = $3, description = $4,
                 location = $5, \"public\" = $6, meeting = $7
             WHERE id = $8
             RETURNING {}",
            EVENT_COLUMNS
        ))
        .bind(&fields.title)
        .bind(fields.start_time)
        .bind(fields.end_time)
        .bind(&fields.description)
        .bind(&fields.location)
        .bind(fields.public)
        .bind(fields.meeting)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AmbassadorError::NotFound)
    }

    async fn delete_event(&self, id: i64) -> AmbassadorResult<()> {
        let result = sqlx::query("DELETE FROM event WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        ensure_found(result.rows_affected())
    }

    async fn attendance(
        &self,
        member_id: i64,
        event_id: i64,
    ) -> AmbassadorResult<Option<Attendance>> {
        sqlx::query_as::<_, Attendance>(
            "SELECT member_id, event_id, status FROM attendance
             WHERE member_id = $1 AND event_id = $2",
        )
        .bind(member_id)
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn attendance_for_event(&self, event_id: i64) -> AmbassadorResult<Vec<Attendance>> {
        sqlx::query_as::<_, Attendance>(
            "SELECT member_id, event_id, status FROM attendance
             WHERE event_id = $1 ORDER BY member_id",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn insert_attendance(&self, attendance: &Attendance) -> AmbassadorResult<()> {
        sqlx::query("INSERT INTO attendance (member_id, event_id, status) VALUES ($1, $2, $3)")
            .bind(attendance.member_id)
            .bind(attendance.event_id)
            .bind(attendance.status)
            .execute(&self.pool)
            .await
            .map_err(|error| {
                reject_duplicate(error, || {
                    format!(
                        "member {} already has attendance for event {}",
                        attendance.member_id, attendance.event_id
                    )
                })
            })?;

        Ok(())
    }

    async fn update_attendance_status(
        &self,
        member_id: i64,
        event_id: i64,
        status: AttendanceStatus,
    ) -> AmbassadorResult<()> {
        let result = sqlx::query(
            "UPDATE attendance SET status = $1 WHERE member_id = $2 AND event_id = $3",
        )
        .bind(status)
        .bind(member_id)
        .bind(event_id)
        .execute(&self.pool)
        .await?;

        ensure_found(result.rows_affected())
    }

    async fn delete_attendance(&self, member_id: i64, event_id: i64) -> AmbassadorResult<()> {
        let result = sqlx::query("DELETE FROM attendance WHERE member_id = $1 AND event_id = $2")
            .bind(member_id)
            .bind(event_id)
            .execute(&self.pool)
            .await?;

        ensure_found(result.rows_affected())
    }

    async fn delete_attendance_for_event(&self, event_id: i64) -> AmbassadorResult<()> {
        sqlx::query("DELETE FROM attendance WHERE event_id = $1")
            .bind(event_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_attendance_for_member(&self, member_id: i64) -> AmbassadorResult<()> {
        sqlx::query("DELETE FROM attendance WHERE member_id = $1")
            .bind(member_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn insert_session(&self, member_id: i64, token: &str) -> AmbassadorResult<()> {
        sqlx::query("INSERT INTO session (member_id, token) VALUES ($1, $2)")
            .bind(member_id)
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn session_member(&self, token: &str) -> AmbassadorResult<Option<i64>> {
        sqlx::query_scalar::<_, i64>("SELECT member_id FROM session WHERE token = $1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(Into::into)
    }

    async fn delete_session(&self, token: &str) -> AmbassadorResult<()> {
        sqlx::query("DELETE FROM session WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_sessions_for_member(&self, member_id: i64) -> AmbassadorResult<()> {
        sqlx::query("DELETE FROM session WHERE member_id = $1")
            .bind(member_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    use sqlx::error::DatabaseError;

    use super::*;

    #[derive(Debug)]
    struct ConstraintError {
        code: &'static str,
    }

    impl fmt::Display for ConstraintError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "constraint violated ({})", self.code)
        }
    }

    impl StdError for ConstraintError {}

    impl DatabaseError for ConstraintError {
        fn message(&self) -> &str {
            "constraint violated"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(self.code))
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }
    }

    fn database_error(code: &'static str) -> sqlx::Error {
        sqlx::Error::Database(Box::new(ConstraintError { code }))
    }

    #[test]
    fn unique_violations_are_bad_requests() {
        let error = reject_duplicate(database_error(UNIQUE_VIOLATION), || "taken".to_owned());

        assert!(matches!(error, AmbassadorError::BadRequest(reason) if reason == "taken"));
    }

    #[test]
    fn other_database_errors_stay_database_errors() {
        // foreign key violation
        let error = reject_duplicate(database_error("23503"), || "taken".to_owned());

        assert!(matches!(error, AmbassadorError::DbError(_)));
    }

    #[test]
    fn missing_rows_are_not_found() {
        assert!(matches!(ensure_found(0), Err(AmbassadorError::NotFound)));
        assert!(ensure_found(1).is_ok());
    }
}
