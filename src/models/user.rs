//! Admin user data models and API request/response types.
//!
//! This module defines:
//! - `User`: Database entity representing an admin user
//! - `UserRole`: The fixed set of roles a user can hold
//! - `UpdateUserRequest`: Validated partial-update body
//! - `UserResponse` / `UserEnvelope`: Response bodies returned to clients

use std::{borrow::Cow, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Role assigned to an admin user.
///
/// Roles are informational; they don't grant different privileges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Member,
    Developer,
}

impl UserRole {
    pub const ALL: [UserRole; 3] = [UserRole::Admin, UserRole::Member, UserRole::Developer];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Member => "member",
            UserRole::Developer => "developer",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UserRole::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| format!("unknown user role `{s}`"))
    }
}

impl TryFrom<String> for UserRole {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Represents a user record from the database.
///
/// # Database Table
///
/// Maps to the `users` table. The API token is never stored in clear text:
/// `api_token_hash` holds its SHA-256 hex digest, which is what the auth
/// middleware looks up.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,

    /// Login email; not editable through the update endpoint
    pub email: String,

    pub first_name: Option<String>,

    pub last_name: Option<String>,

    #[sqlx(try_from = "String")]
    pub role: UserRole,

    pub api_token_hash: Option<String>,

    /// Free-form key/value pairs, always a JSON object when present
    pub metadata: Option<Value>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    /// Set when the user has been soft-deleted; such users behave as missing
    pub deleted_at: Option<DateTime<Utc>>,
}

fn validate_role(role: &str) -> Result<(), ValidationError> {
    if role.parse::<UserRole>().is_ok() {
        return Ok(());
    }

    Err(ValidationError::new("invalid_role")
        .with_message(Cow::from("role must be one of: admin, member, developer")))
}

/// Tokens arrive trimmed in request headers, so padded ones could never match.
fn validate_api_token(token: &str) -> Result<(), ValidationError> {
    if !token.trim().is_empty() && token.trim() == token {
        return Ok(());
    }

    Err(ValidationError::new("invalid_api_token").with_message(Cow::from(
        "api_token must not be blank or have surrounding whitespace",
    )))
}

fn validate_metadata(metadata: &Map<String, Value>) -> Result<(), ValidationError> {
    match metadata
        .keys()
        .find(|key| key.is_empty() || key.chars().count() > 255)
    {
        None => Ok(()),
        Some(_) => Err(ValidationError::new("invalid_metadata_key").with_message(Cow::from(
            "metadata keys must be between 1 and 255 characters",
        ))),
    }
}

/// Request body for `POST /admin/users/{id}`.
///
/// Every field is optional; only the provided ones are written.
///
/// # JSON Example
///
/// ```json
/// {
///   "first_name": "Marcellus",
///   "role": "developer",
///   "metadata": { "team": "payments", "legacy_flag": "" }
/// }
/// ```
///
/// # Validation
///
/// - `first_name`, `last_name`: at most 255 characters
/// - `role`: one of `admin`, `member`, `developer`
/// - `api_token`: between 1 and 255 characters, no surrounding whitespace
/// - `metadata`: a JSON object with non-empty keys; a `""` value deletes the key
/// - unknown fields are rejected
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateUserRequest {
    #[validate(length(max = 255, code = "invalid_length"))]
    pub first_name: Option<String>,

    #[validate(length(max = 255, code = "invalid_length"))]
    pub last_name: Option<String>,

    #[validate(custom(function = "validate_role"))]
    pub role: Option<String>,

    #[validate(
        length(min = 1, max = 255, code = "invalid_length"),
        custom(function = "validate_api_token")
    )]
    pub api_token: Option<String>,

    #[validate(custom(function = "validate_metadata"))]
    pub metadata: Option<Map<String, Value>>,
}

/// A validated partial update, ready for the user service.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct UserUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<UserRole>,
    pub api_token: Option<String>,
    pub metadata: Option<Map<String, Value>>,
}

impl TryFrom<UpdateUserRequest> for UserUpdate {
    type Error = String;

    /// Only fails for requests that skipped `validate()`.
    fn try_from(request: UpdateUserRequest) -> Result<Self, Self::Error> {
        let role = request.role.map(|r| r.parse()).transpose()?;

        Ok(Self {
            first_name: request.first_name,
            last_name: request.last_name,
            role,
            api_token: request.api_token,
            metadata: request.metadata,
        })
    }
}

/// User as returned to API clients.
///
/// The token digest and soft-delete marker are internal; clients only learn
/// whether a token is configured.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: UserRole,
    pub has_api_token: bool,
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
            has_api_token: user.api_token_hash.is_some(),
            metadata: user.metadata,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// `{ "user": { ... } }`
#[derive(Debug, Serialize, Deserialize)]
pub struct UserEnvelope {
    pub user: UserResponse,
}

impl From<User> for UserEnvelope {
    fn from(user: User) -> Self {
        Self { user: user.into() }
    }
}
