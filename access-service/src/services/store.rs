//! Storage collaborator consumed by the access layer.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{ApiKey, Home, HomeMember, HomeRole, Item, Location, User};

#[derive(Error, Debug)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write. Carries what was duplicated.
    #[error("duplicate {0}")]
    Duplicate(String),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Persistence operations for identities, keys, homes, membership edges and
/// locations. Single-row writes are atomic on their own;
/// [`Store::create_home_with_owner`] is the one multi-row write and must be
/// all-or-nothing.
#[async_trait]
pub trait Store: Send + Sync {
    async fn health_check(&self) -> Result<(), StoreError>;

    // Identities
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    /// Fails with `Duplicate("email")` when the address is taken.
    async fn insert_user(&self, user: &User) -> Result<(), StoreError>;

    // API keys
    async fn insert_api_key(&self, key: &ApiKey) -> Result<(), StoreError>;
    async fn list_active_api_keys(&self) -> Result<Vec<ApiKey>, StoreError>;
    async fn list_api_keys(&self, owner_id: Uuid) -> Result<Vec<ApiKey>, StoreError>;
    /// Deactivates an active key owned by `owner_id`; returns rows affected.
    async fn set_api_key_inactive(&self, key_id: Uuid, owner_id: Uuid) -> Result<u64, StoreError>;

    // Homes and membership
    /// Inserts the home and its `owner` edge for `home.owner_id` together.
    async fn create_home_with_owner(&self, home: &Home) -> Result<HomeMember, StoreError>;
    async fn list_homes_for_user(&self, user_id: Uuid) -> Result<Vec<Home>, StoreError>;
    async fn find_home(&self, home_id: Uuid) -> Result<Option<Home>, StoreError>;
    async fn update_home(
        &self,
        home_id: Uuid,
        name: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Home>, StoreError>;
    /// Removes the home with its edges, locations and their items.
    async fn delete_home(&self, home_id: Uuid) -> Result<u64, StoreError>;
    async fn find_membership(
        &self,
        home_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<HomeRole>, StoreError>;
    /// Fails with `Duplicate("membership")` when the pair already has an edge.
    async fn insert_membership(&self, member: &HomeMember) -> Result<(), StoreError>;
    async fn list_members(&self, home_id: Uuid) -> Result<Vec<HomeMember>, StoreError>;
    async fn update_member_role(
        &self,
        home_id: Uuid,
        user_id: Uuid,
        role: HomeRole,
    ) -> Result<u64, StoreError>;
    async fn remove_member(&self, home_id: Uuid, user_id: Uuid) -> Result<u64, StoreError>;

    // Locations
    async fn insert_location(&self, location: &Location) -> Result<(), StoreError>;
    async fn find_location(
        &self,
        home_id: Uuid,
        location_id: Uuid,
    ) -> Result<Option<Location>, StoreError>;
    async fn list_locations(&self, home_id: Uuid) -> Result<Vec<Location>, StoreError>;
    async fn count_child_locations(&self, location_id: Uuid) -> Result<i64, StoreError>;
    async fn count_items_in_location(&self, location_id: Uuid) -> Result<i64, StoreError>;
    async fn delete_location(&self, home_id: Uuid, location_id: Uuid) -> Result<u64, StoreError>;

    // Items
    /// Seeding only; item management lives outside this layer. Items matter
    /// here because they block location deletes.
    async fn insert_item(&self, item: &Item) -> Result<(), StoreError>;
}
