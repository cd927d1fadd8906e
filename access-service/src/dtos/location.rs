use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateLocationRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    #[schema(example = "Pantry")]
    pub name: String,

    #[validate(length(max = 50, message = "Location type must be at most 50 characters"))]
    #[schema(example = "room")]
    pub location_type: Option<String>,

    pub parent_location_id: Option<Uuid>,
}
