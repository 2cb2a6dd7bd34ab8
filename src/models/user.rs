//! User profile model and session claims

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use validator::Validate;

use crate::{error::AppError, models::notification::Notification};

/// Team role (string slug, matching the identity provider's custom claim)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Member,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Member => "member",
        }
    }

    /// Whether this role may approve or deny any transfer request,
    /// regardless of recipient.
    pub fn can_manage(&self) -> bool {
        matches!(self, Role::Admin | Role::Manager)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "member" => Ok(Role::Member),
            _ => Err(format!("Invalid role slug: {}", s)),
        }
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        s.parse().unwrap_or(Role::Member)
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

// SQLx conversion for Role (stored as text)
impl sqlx::Type<Postgres> for Role {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for Role {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for Role {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        let s: String = self.as_str().to_string();
        <String as Encode<Postgres>>::encode(s, buf)
    }
}

/// Internal row structure for user profile queries
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    id: String,
    display_name: String,
    email: Option<String>,
    role: String,
    notifications: Json<Vec<Notification>>,
    crea_date: Option<DateTime<Utc>>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            display_name: row.display_name,
            email: row.email,
            role: row.role.parse().unwrap_or(Role::Member),
            notifications: row.notifications.0,
            crea_date: row.crea_date,
        }
    }
}

/// User profile, owning the embedded notification mailbox
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    /// Uid issued by the identity provider
    pub id: String,
    pub display_name: String,
    pub email: Option<String>,
    pub role: Role,
    /// Mailbox: notification copies fanned out to this user
    pub notifications: Vec<Notification>,
    pub crea_date: Option<DateTime<Utc>>,
}

/// Short user representation for directory listings (no mailbox)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct UserShort {
    pub id: String,
    pub display_name: String,
    pub email: Option<String>,
    pub role: Role,
}

/// Create user request (admin only)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    /// Uid issued by the identity provider
    #[validate(length(min = 1, message = "Uid must not be empty"))]
    pub id: String,
    #[validate(length(min = 1, message = "Display name must not be empty"))]
    pub display_name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub role: Option<Role>,
}

/// Update role request (admin only)
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRole {
    pub role: Role,
}

/// JWT claims validated from the identity provider's session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub role: Role,
    pub email: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a signed token (used by tooling and tests; production
    /// tokens come from the identity provider)
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse and validate a session token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Require admin privileges
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Authorization("Administrator privileges required".to_string()))
        }
    }

    /// Require admin or manager privileges
    pub fn require_manage(&self) -> Result<(), AppError> {
        if self.role.can_manage() {
            Ok(())
        } else {
            Err(AppError::Authorization("Manager privileges required".to_string()))
        }
    }
}
