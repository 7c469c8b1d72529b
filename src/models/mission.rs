// src/models/mission.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

pub const MISSION_KIND_FREE_TEXT: &str = "FREE_TEXT";
pub const MISSION_KIND_MULTIPLE_CHOICE: &str = "MULTIPLE_CHOICE";

pub const QUESTION_KIND_TEXT: &str = "TEXT";
pub const QUESTION_KIND_MCQ: &str = "MCQ";

/// Represents the 'missions' table in the database.
/// `deleted_at` marks a soft delete: the mission disappears from catalog
/// lists but direct lookup and submission keep working.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mission {
    pub id: i64,
    pub station_id: i64,
    pub title: String,

    /// Mission type: 'FREE_TEXT' or 'MULTIPLE_CHOICE'.
    pub kind: String,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub deleted_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: i64,
    pub mission_id: i64,
    pub content: String,

    /// Question kind: 'TEXT' or 'MCQ'.
    pub kind: String,

    pub position: i64,
}

/// Represents the 'choices' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    pub id: i64,
    pub question_id: i64,
    pub content: String,
    pub is_correct: bool,
    pub position: i64,
}

/// DTO for sending a choice to students (excludes is_correct).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicChoice {
    pub id: i64,
    pub content: String,
}

/// DTO for sending a question to students, with its choices resolved.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuestion {
    pub id: i64,
    pub kind: String,
    pub content: String,
    pub choices: Vec<PublicChoice>,
}

/// Mission detail used by the submission UI to render the form.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionDetail {
    pub id: i64,
    pub station_id: i64,
    pub title: String,
    pub kind: String,
    pub questions: Vec<PublicQuestion>,
}

/// DTO for authoring a mission with its questions and choices in one shot.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateMissionRequest {
    pub station_id: Option<i64>,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub kind: String,
    pub questions: Vec<NewQuestion>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewQuestion {
    #[validate(length(min = 1, max = 1000))]
    pub content: String,
    pub kind: String,
    #[serde(default)]
    pub choices: Vec<NewChoice>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChoice {
    pub content: String,
    #[serde(default)]
    pub is_correct: bool,
}
