//! In-process [`Store`] used by the test suite and for running the service
//! without PostgreSQL.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::store::{Store, StoreError};
use crate::models::{ApiKey, Home, HomeMember, HomeRole, Item, Location, User};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    api_keys: Vec<ApiKey>,
    homes: HashMap<Uuid, Home>,
    memberships: HashMap<(Uuid, Uuid), HomeMember>,
    locations: HashMap<Uuid, Location>,
    items: HashMap<Uuid, Item>,
}

/// Every operation holds one lock for its whole duration, which gives the
/// same per-call atomicity the database provides.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Backend(anyhow::anyhow!("memory store lock poisoned")))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        self.lock().map(|_| ())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.lock()?;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.lock()?.users.get(&id).cloned())
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate("email".to_string()));
        }
        tables.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn insert_api_key(&self, key: &ApiKey) -> Result<(), StoreError> {
        self.lock()?.api_keys.push(key.clone());
        Ok(())
    }

    async fn list_active_api_keys(&self) -> Result<Vec<ApiKey>, StoreError> {
        let tables = self.lock()?;
        Ok(tables.api_keys.iter().filter(|k| k.is_active).cloned().collect())
    }

    async fn list_api_keys(&self, owner_id: Uuid) -> Result<Vec<ApiKey>, StoreError> {
        let tables = self.lock()?;
        let mut keys: Vec<ApiKey> = tables
            .api_keys
            .iter()
            .filter(|k| k.user_id == owner_id)
            .cloned()
            .collect();
        keys.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(keys)
    }

    async fn set_api_key_inactive(&self, key_id: Uuid, owner_id: Uuid) -> Result<u64, StoreError> {
        let mut tables = self.lock()?;
        let now = Utc::now();
        let mut affected = 0;
        for key in tables
            .api_keys
            .iter_mut()
            .filter(|k| k.id == key_id && k.user_id == owner_id && k.is_active)
        {
            key.is_active = false;
            key.updated_at = now;
            affected += 1;
        }
        Ok(affected)
    }

    async fn create_home_with_owner(&self, home: &Home) -> Result<HomeMember, StoreError> {
        let mut tables = self.lock()?;
        if tables.homes.contains_key(&home.id) {
            return Err(StoreError::Duplicate("home".to_string()));
        }
        let owner = HomeMember {
            home_id: home.id,
            user_id: home.owner_id,
            role: HomeRole::Owner,
            joined_at: home.created_at,
        };
        tables.homes.insert(home.id, home.clone());
        tables
            .memberships
            .insert((home.id, home.owner_id), owner.clone());
        Ok(owner)
    }

    async fn list_homes_for_user(&self, user_id: Uuid) -> Result<Vec<Home>, StoreError> {
        let tables = self.lock()?;
        let mut homes: Vec<Home> = tables
            .memberships
            .values()
            .filter(|m| m.user_id == user_id)
            .filter_map(|m| tables.homes.get(&m.home_id).cloned())
            .collect();
        homes.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(homes)
    }

    async fn find_home(&self, home_id: Uuid) -> Result<Option<Home>, StoreError> {
        Ok(self.lock()?.homes.get(&home_id).cloned())
    }

    async fn update_home(
        &self,
        home_id: Uuid,
        name: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Home>, StoreError> {
        let mut tables = self.lock()?;
        Ok(tables.homes.get_mut(&home_id).map(|home| {
            home.name = name.to_string();
            home.updated_at = updated_at;
            home.clone()
        }))
    }

    async fn delete_home(&self, home_id: Uuid) -> Result<u64, StoreError> {
        let mut tables = self.lock()?;
        if tables.homes.remove(&home_id).is_none() {
            return Ok(0);
        }
        tables.memberships.retain(|(home, _), _| *home != home_id);
        let removed: Vec<Uuid> = tables
            .locations
            .values()
            .filter(|l| l.home_id == home_id)
            .map(|l| l.id)
            .collect();
        tables.locations.retain(|_, l| l.home_id != home_id);
        tables
            .items
            .retain(|_, i| i.location_id.map_or(true, |loc| !removed.contains(&loc)));
        Ok(1)
    }

    async fn find_membership(
        &self,
        home_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<HomeRole>, StoreError> {
        let tables = self.lock()?;
        Ok(tables.memberships.get(&(home_id, user_id)).map(|m| m.role))
    }

    async fn insert_membership(&self, member: &HomeMember) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        let key = (member.home_id, member.user_id);
        if tables.memberships.contains_key(&key) {
            return Err(StoreError::Duplicate("membership".to_string()));
        }
        tables.memberships.insert(key, member.clone());
        Ok(())
    }

    async fn list_members(&self, home_id: Uuid) -> Result<Vec<HomeMember>, StoreError> {
        let tables = self.lock()?;
        let mut members: Vec<HomeMember> = tables
            .memberships
            .values()
            .filter(|m| m.home_id == home_id)
            .cloned()
            .collect();
        members.sort_by(|a, b| a.joined_at.cmp(&b.joined_at));
        Ok(members)
    }

    async fn update_member_role(
        &self,
        home_id: Uuid,
        user_id: Uuid,
        role: HomeRole,
    ) -> Result<u64, StoreError> {
        let mut tables = self.lock()?;
        Ok(match tables.memberships.get_mut(&(home_id, user_id)) {
            Some(member) => {
                member.role = role;
                1
            }
            None => 0,
        })
    }

    async fn remove_member(&self, home_id: Uuid, user_id: Uuid) -> Result<u64, StoreError> {
        let mut tables = self.lock()?;
        Ok(tables.memberships.remove(&(home_id, user_id)).map_or(0, |_| 1))
    }

    async fn insert_location(&self, location: &Location) -> Result<(), StoreError> {
        self.lock()?.locations.insert(location.id, location.clone());
        Ok(())
    }

    async fn find_location(
        &self,
        home_id: Uuid,
        location_id: Uuid,
    ) -> Result<Option<Location>, StoreError> {
        let tables = self.lock()?;
        Ok(tables
            .locations
            .get(&location_id)
            .filter(|l| l.home_id == home_id)
            .cloned())
    }

    async fn list_locations(&self, home_id: Uuid) -> Result<Vec<Location>, StoreError> {
        let tables = self.lock()?;
        let mut locations: Vec<Location> = tables
            .locations
            .values()
            .filter(|l| l.home_id == home_id)
            .cloned()
            .collect();
        locations.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(locations)
    }

    async fn count_child_locations(&self, location_id: Uuid) -> Result<i64, StoreError> {
        let tables = self.lock()?;
        Ok(tables
            .locations
            .values()
            .filter(|l| l.parent_location_id == Some(location_id))
            .count() as i64)
    }

    async fn count_items_in_location(&self, location_id: Uuid) -> Result<i64, StoreError> {
        let tables = self.lock()?;
        Ok(tables
            .items
            .values()
            .filter(|i| i.location_id == Some(location_id))
            .count() as i64)
    }

    async fn delete_location(&self, home_id: Uuid, location_id: Uuid) -> Result<u64, StoreError> {
        let mut tables = self.lock()?;
        let belongs = tables
            .locations
            .get(&location_id)
            .is_some_and(|l| l.home_id == home_id);
        if !belongs {
            return Ok(0);
        }
        tables.locations.remove(&location_id);
        Ok(1)
    }

    async fn insert_item(&self, item: &Item) -> Result<(), StoreError> {
        self.lock()?.items.insert(item.id, item.clone());
        Ok(())
    }
}
