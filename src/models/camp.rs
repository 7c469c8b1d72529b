// src/models/camp.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'camps' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Camp {
    pub id: i64,
    pub name: String,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for creating a new camp.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCampRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}
