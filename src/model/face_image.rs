use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Reference to a sample enrolled in the recognition service's gallery.
/// `image_id` is the identifier the service returned at enrollment.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct FaceImage {
    pub id: u64,
    pub employee_id: u64,
    pub image_id: String,
    pub is_primary: bool,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
}
