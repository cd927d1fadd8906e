use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use super::{store::Store, ServiceError};
use crate::models::{Home, HomeMember, HomeRole};

/// Homes and their membership edges. Callers are expected to have passed the
/// membership check for `home_id` already; creation is the exception.
#[derive(Clone)]
pub struct HomeService {
    store: Arc<dyn Store>,
}

impl HomeService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Create a home with `creator` as its owner in one atomic write.
    pub async fn create_home(&self, name: String, creator: Uuid) -> Result<(Home, HomeMember), ServiceError> {
        let home = Home::new(name, creator);
        let owner = self.store.create_home_with_owner(&home).await?;

        tracing::info!(home_id = %home.id, user_id = %creator, "Home created");
        Ok((home, owner))
    }

    pub async fn list_homes(&self, user_id: Uuid) -> Result<Vec<Home>, ServiceError> {
        Ok(self.store.list_homes_for_user(user_id).await?)
    }

    pub async fn get_home(&self, home_id: Uuid) -> Result<Home, ServiceError> {
        self.store
            .find_home(home_id)
            .await?
            .ok_or(ServiceError::NotFound("Home"))
    }

    pub async fn update_home(&self, home_id: Uuid, name: String) -> Result<Home, ServiceError> {
        self.store
            .update_home(home_id, &name, Utc::now())
            .await?
            .ok_or(ServiceError::NotFound("Home"))
    }

    pub async fn delete_home(&self, home_id: Uuid) -> Result<(), ServiceError> {
        if self.store.delete_home(home_id).await? == 0 {
            return Err(ServiceError::NotFound("Home"));
        }
        tracing::info!(home_id = %home_id, "Home deleted");
        Ok(())
    }

    pub async fn list_members(&self, home_id: Uuid) -> Result<Vec<HomeMember>, ServiceError> {
        Ok(self.store.list_members(home_id).await?)
    }

    /// Add an edge for an existing identity. A second invitation of the same
    /// identity is a conflict and leaves the existing edge untouched.
    pub async fn invite_member(
        &self,
        home_id: Uuid,
        user_id: Uuid,
        role: HomeRole,
    ) -> Result<HomeMember, ServiceError> {
        if self.store.find_user_by_id(user_id).await?.is_none() {
            return Err(ServiceError::NotFound("User"));
        }

        if self.store.find_membership(home_id, user_id).await?.is_some() {
            return Err(ServiceError::Conflict(
                "User is already a member of this home".to_string(),
            ));
        }

        let member = HomeMember::new(home_id, user_id, role);
        // The pair key still rejects a concurrent invite that passed the check above.
        self.store
            .insert_membership(&member)
            .await
            .map_err(|e| match ServiceError::from(e) {
                ServiceError::Conflict(_) => {
                    ServiceError::Conflict("User is already a member of this home".to_string())
                }
                other => other,
            })?;

        tracing::info!(home_id = %home_id, user_id = %user_id, role = %role, "Member invited");
        Ok(member)
    }

    pub async fn update_member_role(
        &self,
        home_id: Uuid,
        user_id: Uuid,
        role: HomeRole,
    ) -> Result<(), ServiceError> {
        if self.store.update_member_role(home_id, user_id, role).await? == 0 {
            return Err(ServiceError::NotFound("Membership"));
        }
        tracing::info!(home_id = %home_id, user_id = %user_id, role = %role, "Member role updated");
        Ok(())
    }

    pub async fn remove_member(&self, home_id: Uuid, user_id: Uuid) -> Result<(), ServiceError> {
        if self.store.remove_member(home_id, user_id).await? == 0 {
            return Err(ServiceError::NotFound("Membership"));
        }
        tracing::info!(home_id = %home_id, user_id = %user_id, "Member removed");
        Ok(())
    }
}
