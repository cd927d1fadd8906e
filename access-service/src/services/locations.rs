use std::sync::Arc;
use uuid::Uuid;

use super::{store::Store, ServiceError};
use crate::models::Location;

#[derive(Clone)]
pub struct LocationService {
    store: Arc<dyn Store>,
}

impl LocationService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// A parent, when given, must belong to the same home.
    pub async fn create_location(
        &self,
        home_id: Uuid,
        name: String,
        location_type: Option<String>,
        parent_location_id: Option<Uuid>,
    ) -> Result<Location, ServiceError> {
        if let Some(parent_id) = parent_location_id {
            if self.store.find_location(home_id, parent_id).await?.is_none() {
                return Err(ServiceError::NotFound("Parent location"));
            }
        }

        let location = Location::new(home_id, name, location_type, parent_location_id);
        self.store.insert_location(&location).await?;

        tracing::info!(home_id = %home_id, location_id = %location.id, "Location created");
        Ok(location)
    }

    pub async fn list_locations(&self, home_id: Uuid) -> Result<Vec<Location>, ServiceError> {
        Ok(self.store.list_locations(home_id).await?)
    }

    /// Refuses to delete a location that still has children or items.
    pub async fn delete_location(&self, home_id: Uuid, location_id: Uuid) -> Result<(), ServiceError> {
        if self.store.find_location(home_id, location_id).await?.is_none() {
            return Err(ServiceError::NotFound("Location"));
        }

        if self.store.count_child_locations(location_id).await? > 0 {
            return Err(ServiceError::Conflict(
                "Location has child locations".to_string(),
            ));
        }

        if self.store.count_items_in_location(location_id).await? > 0 {
            return Err(ServiceError::Conflict("Location has items".to_string()));
        }

        if self.store.delete_location(home_id, location_id).await? == 0 {
            return Err(ServiceError::NotFound("Location"));
        }

        tracing::info!(home_id = %home_id, location_id = %location_id, "Location deleted");
        Ok(())
    }
}
