use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::middleware::{CredentialScheme, HomeAccess};
use crate::models::{Home, HomeMember, HomeRole};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct HomeRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    #[schema(example = "Lake house")]
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateHomeResponse {
    #[serde(flatten)]
    pub home: HomeSummary,
    pub role: HomeRole,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HomeSummary {
    pub id: Uuid,
    pub name: String,
    pub owner_id: Uuid,
}

impl From<Home> for HomeSummary {
    fn from(home: Home) -> Self {
        Self {
            id: home.id,
            name: home.name,
            owner_id: home.owner_id,
        }
    }
}

impl From<(Home, HomeMember)> for CreateHomeResponse {
    fn from((home, owner): (Home, HomeMember)) -> Self {
        Self {
            home: home.into(),
            role: owner.role,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct InviteMemberRequest {
    pub user_id: Uuid,
    #[schema(example = "member")]
    pub role: HomeRole,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateMemberRoleRequest {
    #[schema(example = "admin")]
    pub role: HomeRole,
}

/// The caller as seen by a home-scoped route.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AccessResponse {
    pub user_id: Uuid,
    pub home_id: Uuid,
    pub role: HomeRole,
    #[schema(example = "bearer_token")]
    pub scheme: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_id: Option<Uuid>,
}

impl From<HomeAccess> for AccessResponse {
    fn from(access: HomeAccess) -> Self {
        let (scheme, api_key_id) = match access.principal.scheme {
            CredentialScheme::BearerToken => ("bearer_token", None),
            CredentialScheme::ApiKey { key_id } => ("api_key", Some(key_id)),
        };
        Self {
            user_id: access.principal.user_id,
            home_id: access.home_id,
            role: access.role,
            scheme: scheme.to_string(),
            api_key_id,
        }
    }
}
