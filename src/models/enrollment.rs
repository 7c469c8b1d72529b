// src/models/enrollment.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Shirt size assigned when a student enrolls without picking one.
pub const DEFAULT_SHIRT_SIZE: &str = "M";

/// Represents the 'enrollments' table: the binding of a student to a camp.
/// Unique on (student_id, camp_id); never hard-deleted.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub id: i64,
    pub student_id: i64,
    pub camp_id: i64,
    pub shirt_size: String,
    pub enrolled_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for enrolling into a camp.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollRequest {
    pub camp_id: Option<i64>,
}

/// DTO for updating the shirt size of an existing enrollment.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateShirtSizeRequest {
    pub camp_id: Option<i64>,
    pub shirt_size: Option<String>,
}
