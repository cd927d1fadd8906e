use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Node of the per-home location forest.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Location {
    pub id: Uuid,
    pub home_id: Uuid,
    pub parent_location_id: Option<Uuid>,
    #[schema(example = "Pantry")]
    pub name: String,
    #[schema(example = "room")]
    pub location_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Location {
    pub fn new(
        home_id: Uuid,
        name: String,
        location_type: Option<String>,
        parent_location_id: Option<Uuid>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            home_id,
            parent_location_id,
            name,
            location_type,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Inventory item as far as the access layer needs it: something that can
/// pin a location in place.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Item {
    pub id: Uuid,
    pub name: String,
    pub quantity: i32,
    pub location_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    pub fn new(name: String, quantity: i32, location_id: Option<Uuid>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            quantity,
            location_id,
            created_at: now,
            updated_at: now,
        }
    }
}
