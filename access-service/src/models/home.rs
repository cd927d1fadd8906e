use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Home {
    pub id: Uuid,
    #[schema(example = "Lake house")]
    pub name: String,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Home {
    pub fn new(name: String, owner_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            owner_id,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Role carried by a membership edge. Stored as lowercase text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HomeRole {
    Owner,
    Admin,
    Member,
    Viewer,
}

impl HomeRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            HomeRole::Owner => "owner",
            HomeRole::Admin => "admin",
            HomeRole::Member => "member",
            HomeRole::Viewer => "viewer",
        }
    }
}

impl fmt::Display for HomeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown home role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for HomeRole {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(HomeRole::Owner),
            "admin" => Ok(HomeRole::Admin),
            "member" => Ok(HomeRole::Member),
            "viewer" => Ok(HomeRole::Viewer),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

impl TryFrom<String> for HomeRole {
    type Error = UnknownRole;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Membership edge between one home and one identity.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct HomeMember {
    pub home_id: Uuid,
    pub user_id: Uuid,
    #[sqlx(try_from = "String")]
    pub role: HomeRole,
    pub joined_at: DateTime<Utc>,
}

impl HomeMember {
    pub fn new(home_id: Uuid, user_id: Uuid, role: HomeRole) -> Self {
        Self {
            home_id,
            user_id,
            role,
            joined_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_parse_from_their_text_form() {
        for role in [
            HomeRole::Owner,
            HomeRole::Admin,
            HomeRole::Member,
            HomeRole::Viewer,
        ] {
            assert_eq!(role.as_str().parse::<HomeRole>().unwrap(), role);
        }
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!("superuser".parse::<HomeRole>().is_err());
        assert!("Owner".parse::<HomeRole>().is_err());
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_value(HomeRole::Viewer).unwrap();
        assert_eq!(json, "viewer");
    }
}
