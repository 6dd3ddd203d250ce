use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{AmbassadorError, AmbassadorResult};
use crate::util::{deserialize_checkbox, is_valid_email};

#[derive(Clone, Debug, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    /// The member's ID, used in URLs
    pub id: i64,
    /// The member's email, which must be unique
    pub email: String,
    /// The member's first name
    pub first_name: String,
    /// The member's last name
    pub last_name: String,
    /// Where the member came from
    pub hometown: Option<String>,
    /// The member's academic major
    pub major: Option<String>,
    /// The member's academic minors
    pub minors: Option<String>,
    /// The year the member expects to graduate
    pub grad_year: Option<i32>,
    /// Other clubs the member is involved in
    pub clubs: Option<String>,
    /// Co-ops the member has worked
    pub coops: Option<String>,
    /// Whether the member is part of ACCEND
    pub accend: bool,
    /// Whether the member can administer the site
    pub super_user: bool,
    /// Whether the member's profile is hidden from other members
    pub private_user: bool,
    /// Service minutes from confirmed attendance
    pub minutes: i64,
    /// Service minutes from attendance that was marked as not needed
    pub minutes_not_needed: i64,

    #[serde(skip)]
    pub pass_hash: String,
}

impl Member {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn attributes(&self) -> MemberAttributes {
        MemberAttributes {
            super_user: self.super_user,
            private_user: self.private_user,
            accend: self.accend,
        }
    }

    pub fn profile(&self) -> MemberProfile {
        MemberProfile {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            hometown: self.hometown.clone(),
            major: self.major.clone(),
            minors: self.minors.clone(),
            grad_year: self.grad_year,
            clubs: self.clubs.clone(),
            coops: self.coops.clone(),
            accend: self.accend,
        }
    }

    /// Whether `viewer` may see this member's profile.
    ///
    /// Private profiles are only visible to the member themself and to super users.
    pub fn visible_to(&self, viewer: Option<&Member>) -> bool {
        !self.private_user
            || viewer
                .map(|viewer| viewer.super_user || viewer.id == self.id)
                .unwrap_or(false)
    }
}

/// The fields of a member that the member may edit themself.
#[derive(Clone, Debug, PartialEq)]
pub struct MemberProfile {
    pub first_name: String,
    pub last_name: String,
    pub hometown: Option<String>,
    pub major: Option<String>,
    pub minors: Option<String>,
    pub grad_year: Option<i32>,
    pub clubs: Option<String>,
    pub coops: Option<String>,
    pub accend: bool,
}

/// The role flags of a member, only editable by super users.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemberAttributes {
    pub super_user: bool,
    pub private_user: bool,
    pub accend: bool,
}

/// A partial update to a member's own profile.
///
/// Missing fields are left as they were. For optional fields, an empty
/// string clears the stored value.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub hometown: Option<String>,
    pub major: Option<String>,
    pub minors: Option<String>,
    pub grad_year: Option<String>,
    pub clubs: Option<String>,
    pub coops: Option<String>,
    #[serde(default, deserialize_with = "deserialize_checkbox")]
    pub accend: Option<bool>,
}

impl ProfileUpdate {
    pub fn apply_to(self, mut profile: MemberProfile) -> AmbassadorResult<MemberProfile> {
        if let Some(first_name) = self.first_name {
            profile.first_name = required_text("firstName", first_name)?;
        }
        if let Some(last_name) = self.last_name {
            profile.last_name = required_text("lastName", last_name)?;
        }
        if let Some(grad_year) = self.grad_year {
            profile.grad_year = parse_grad_year(&grad_year)?;
        }
        if let Some(accend) = self.accend {
            profile.accend = accend;
        }

        for (field, value) in [
            (&mut profile.hometown, self.hometown),
            (&mut profile.major, self.major),
            (&mut profile.minors, self.minors),
            (&mut profile.clubs, self.clubs),
            (&mut profile.coops, self.coops),
        ] {
            if let Some(value) = value {
                *field = optional_text(value);
            }
        }

        Ok(profile)
    }
}

/// A requested change to a member's role flags.
///
/// Only the literal strings `true` and `false` are honored, anything
/// else is treated as if the flag wasn't provided.
#[derive(Debug, Default, Deserialize, PartialEq)]
pub struct AttributeUpdate {
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub super_user: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub private_user: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub accend: Option<bool>,
}

impl AttributeUpdate {
    /// The attributes after the update, or `None` if nothing would change.
    pub fn apply_to(&self, current: MemberAttributes) -> Option<MemberAttributes> {
        let updated = MemberAttributes {
            super_user: self.super_user.unwrap_or(current.super_user),
            private_user: self.private_user.unwrap_or(current.private_user),
            accend: self.accend.unwrap_or(current.accend),
        };

        Some(updated).filter(|updated| updated != &current)
    }
}

fn deserialize_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;

    Ok(match value.as_deref() {
        Some("true") => Some(true),
        Some("false") => Some(false),
        _ => None,
    })
}

/// A member to be inserted, with an already hashed password.
#[derive(Clone, Debug)]
pub struct NewMember {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub pass_hash: String,
    pub attributes: MemberAttributes,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub first_name: String,
    pub last_name: String,
}

impl SignupForm {
    pub fn validate(&self) -> AmbassadorResult<()> {
        if !is_valid_email(&self.email) {
            return Err(AmbassadorError::BadRequest(format!(
                "{} is not a valid email address",
                self.email
            )));
        }
        validate_password(&self.password)?;
        if self.password != self.confirm_password {
            return Err(AmbassadorError::BadRequest(
                "password and confirmation don't match".to_owned(),
            ));
        }
        required_text("firstName", self.first_name.clone())?;
        required_text("lastName", self.last_name.clone())?;

        Ok(())
    }
}

/// Administrative member creation, allowing role flags to be set up front.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMemberForm {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub accend: bool,
    #[serde(default)]
    pub super_user: bool,
    #[serde(default)]
    pub private_user: bool,
}

impl CreateMemberForm {
    pub fn validate(&self) -> AmbassadorResult<()> {
        if !is_valid_email(&self.email) {
            return Err(AmbassadorError::BadRequest(format!(
                "{} is not a valid email address",
                self.email
            )));
        }
        validate_password(&self.password)?;
        required_text("firstName", self.first_name.clone())?;
        required_text("lastName", self.last_name.clone())?;

        Ok(())
    }

    pub fn attributes(&self) -> MemberAttributes {
        MemberAttributes {
            super_user: self.super_user,
            private_user: self.private_user,
            accend: self.accend,
        }
    }
}

fn validate_password(password: &str) -> AmbassadorResult<()> {
    if password.is_empty() {
        Err(AmbassadorError::BadRequest(
            "password must not be empty".to_owned(),
        ))
    } else {
        Ok(())
    }
}

fn required_text(name: &str, value: String) -> AmbassadorResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(AmbassadorError::BadRequest(format!(
            "{} must not be empty",
            name
        )))
    } else {
        Ok(trimmed.to_owned())
    }
}

fn optional_text(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

fn parse_grad_year(value: &str) -> AmbassadorResult<Option<i32>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    trimmed
        .parse::<i32>()
        .map(Some)
        .map_err(|_| AmbassadorError::BadRequest(format!("gradYear must be a year, not {}", value)))
}
